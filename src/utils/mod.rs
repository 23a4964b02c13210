pub mod cancel;
pub mod config;
