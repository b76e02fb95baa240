//! Command line front end: configuration and file formats around
//! `ttmprep_core`.

pub mod config;
pub mod io;

pub use config::PrepConfig;
