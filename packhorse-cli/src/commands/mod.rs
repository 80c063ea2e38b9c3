//! Command handlers -- one module per subcommand

pub mod config;
pub mod convert;
pub mod formats;
pub mod scan;
