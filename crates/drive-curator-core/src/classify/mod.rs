pub mod aggregate;
pub mod rules;

pub use aggregate::{aggregate_directories, mapped_top_level_dirs, DirectoryAggregate};
pub use rules::{classify_all, classify_directory, save_snapshot};
