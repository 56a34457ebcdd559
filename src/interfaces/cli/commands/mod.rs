//! CLI command implementations

mod archive;
mod config_gen;
mod monthly;
mod status;

pub use archive::archive;
pub use config_gen::config_generate;
pub use monthly::close_month;
pub use status::{partition_counts, ping};
