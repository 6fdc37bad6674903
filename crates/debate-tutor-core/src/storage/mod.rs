mod config;
pub mod migrations;
pub mod scenario_db;

pub use config::{AiConfig, Config, FacilitationConfig, GeneratorConfig};
pub use scenario_db::{ScenarioDb, ScenarioPatch, ScenarioStore};

use std::path::PathBuf;

use crate::error::Result;

/// Returns the data directory, creating it if needed.
///
/// `DEBATE_TUTOR_HOME` overrides the location. Otherwise it is
/// `~/.config/debate-tutor[-dev]/`, with the `-dev` suffix when
/// `DEBATE_TUTOR_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("DEBATE_TUTOR_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("DEBATE_TUTOR_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("debate-tutor-dev")
            } else {
                base_dir.join("debate-tutor")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
