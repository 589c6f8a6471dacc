pub mod aggregates;
pub mod config;
pub mod dashboard;
pub mod derive;
pub mod error;
pub mod export;
pub mod loader;
pub mod logging;
pub mod record;
pub mod source;
pub mod state;
pub mod summary;

pub use dashboard::{Dashboard, LeagueContext, LoadReport, build_dashboard, derive_dashboard};
pub use error::{LoadError, PipelineError, RecordError};
