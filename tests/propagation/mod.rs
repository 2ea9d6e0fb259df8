mod config;
mod conversion;
mod jacobians;
mod keplerian;
mod truth;
