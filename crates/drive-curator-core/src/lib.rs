pub mod classify;
pub mod clean;
pub mod config;
pub mod dedup;
pub mod error;
pub mod migrate;
pub mod operator;
pub mod paths;
pub mod remote;
pub mod storage;
pub mod taxonomy;

pub use config::AppConfig;
pub use error::Error;
pub use migrate::{MigrationExecutor, PhaseSummary};
pub use operator::{AutoApprove, Operator, ReviewDecision};
pub use taxonomy::Taxonomy;
