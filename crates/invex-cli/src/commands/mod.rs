//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;

use invex_core::models::config::InvexConfig;

pub(crate) fn load_config(path: Option<&str>) -> anyhow::Result<InvexConfig> {
    Ok(match path {
        Some(p) => InvexConfig::from_file(std::path::Path::new(p))?,
        None => InvexConfig::default(),
    })
}
