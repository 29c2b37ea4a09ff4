pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::LocalStorage;
pub use config::{Cli, Command, ReportConfig};
pub use core::chart::ChartPipeline;
pub use core::engine::Engine;
pub use core::pipeline::ReportPipeline;
pub use domain::model::EntityKind;
pub use utils::error::{ReportError, Result};
