pub mod cli;
pub mod report_config;

pub use cli::{Cli, Command};
pub use report_config::ReportConfig;
