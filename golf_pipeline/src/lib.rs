pub mod aggregate;
pub mod error;
pub mod materialize;
pub mod pipeline;
pub mod reader;
pub mod snapshot;

pub use aggregate::{compute_all_statistics, compute_statistics};
pub use error::{PipelineError, PipelineErrorKind};
pub use materialize::{materialize, ApiLayout, MaterializeReport};
pub use pipeline::{check, run, run_at, LoadSummary, PipelineConfig, RunSummary, Stage, StageError};
pub use reader::{load_record_store, RecordStore};
pub use snapshot::Snapshot;
