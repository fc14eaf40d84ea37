//! plughost - a root CLI that extends itself with external plugin executables

pub mod config;
pub mod error;
pub mod plugins;

pub use config::Config;
pub use error::{is_not_found, HostError};
