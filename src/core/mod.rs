pub mod chart;
pub mod engine;
pub mod extract;
pub mod layout;
pub mod normalize;
pub mod pdf;
pub mod pipeline;
pub mod report;

pub use crate::domain::model::{
    EntityKind, RawRecord, RelatedData, ReportArtifact, ReportInputs, ReportOutput,
    ReportSection, TimeSeriesPoint,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
