pub mod artifacts;
pub mod config;
mod orchestrator;
mod types;
mod worker;

pub use artifacts::{outputs_exist, ArtifactPaths};
pub use orchestrator::{run_batch, run_pairs};
pub use types::{
    BatchReport, BatchStage, ImageParams, NoOpReporter, PairFailure, ProgressReporter, RowError,
    RowStatus, SummaryRow,
};
pub use worker::analyze_pair;
