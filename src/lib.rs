pub mod analysis;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod io;
pub mod report;
pub mod yahoo;

pub use error::{Error, Result};
