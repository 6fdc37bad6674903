//! # Debate Tutor Core Library
//!
//! Core logic for planning and facilitating classroom debate lessons. Every
//! operation is available through the standalone `debate-tutor` CLI, which is
//! a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Scenario**: the Scenario → Stage → Activity time tree, the standard
//!   template generator, per-activity guidance and AI-assisted generation
//! - **Timer**: the facilitator walkthrough and its cancelable countdown
//! - **Storage**: SQLite scenario persistence and TOML configuration
//! - **Integrations**: text-generation services behind a trait
//!
//! ## Key Components
//!
//! - [`generate_standard`]: deterministic lesson template
//! - [`AiScenarioGenerator`]: service-designed lesson, validated before saving
//! - [`Walkthrough`]: cursor and countdown over a bound scenario
//! - [`ScenarioStore`]: persistence collaborator
//! - [`Config`]: application configuration

pub mod access;
pub mod error;
pub mod events;
pub mod integrations;
pub mod scenario;
pub mod storage;
pub mod timer;

pub use access::{authorize, Access};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::Event;
pub use integrations::{GeminiClient, TextGenerator};
pub use scenario::{
    generate_standard, Activity, AiScenarioGenerator, Difficulty, GenerateRequest, Guidance,
    GuidanceTable, Scenario, Stage,
};
pub use storage::{data_dir, Config, ScenarioDb, ScenarioPatch, ScenarioStore};
pub use timer::{Countdown, Cursor, TimerState, Walkthrough};
