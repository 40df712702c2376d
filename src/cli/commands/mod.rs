//! CLI command implementations.

mod config;
mod delete;
mod ingest;
mod list;
mod search;
mod segment;
mod serve;

pub use config::run_config;
pub use delete::run_delete;
pub use ingest::run_ingest;
pub use list::run_list;
pub use search::run_search;
pub use segment::run_segment;
pub use serve::run_serve;
