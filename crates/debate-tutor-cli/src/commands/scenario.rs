//! Scenario management commands for CLI.

use clap::Subcommand;
use debate_tutor_core::{
    generate_standard, AiScenarioGenerator, Access, Config, Difficulty, GeminiClient,
    GenerateRequest, Result, ScenarioDb, ScenarioPatch, ScenarioStore, ValidationError,
};
use tracing::warn;

use super::load_scenario;

#[derive(Subcommand)]
pub enum ScenarioAction {
    /// Build a lesson from the standard three-stage template
    Generate {
        /// Debate topic, used as the scenario title
        #[arg(long)]
        topic: String,
        /// Lesson length in minutes
        #[arg(long)]
        time: Option<u32>,
        /// Number of student groups
        #[arg(long)]
        groups: Option<u32>,
        /// Persist the generated scenario
        #[arg(long)]
        save: bool,
    },
    /// Ask the text service to design a lesson, then save it
    Ai {
        #[arg(long)]
        topic: String,
        /// beginner, intermediate or advanced
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// Available time in minutes (10-180)
        #[arg(long)]
        time: Option<u32>,
        /// Number of student groups (2-20)
        #[arg(long)]
        groups: Option<u32>,
    },
    /// List saved scenarios, newest first
    List,
    /// Print a saved scenario as JSON
    Show {
        /// Scenario ID
        id: String,
    },
    /// Delete a saved scenario
    Delete {
        /// Scenario ID
        id: String,
    },
    /// Change one activity's minutes (indices start at 1)
    SetTime {
        /// Scenario ID
        id: String,
        stage: usize,
        activity: usize,
        minutes: u32,
    },
}

fn zero_based(field: &str, index: usize) -> Result<usize, ValidationError> {
    index
        .checked_sub(1)
        .ok_or_else(|| ValidationError::invalid(field, "indices start at 1"))
}

pub async fn run(action: ScenarioAction, user: Option<&str>) -> Result<()> {
    match action {
        ScenarioAction::Generate {
            topic,
            time,
            groups,
            save,
        } => {
            let config = Config::load()?;
            let mut scenario = generate_standard(
                &topic,
                time.unwrap_or(config.generator.default_total_time),
                groups.unwrap_or(config.generator.default_group_count),
            )?;
            scenario.user_id = user.map(String::from);
            if save {
                scenario = ScenarioDb::open()?.create(&scenario)?;
            }
            println!("{}", serde_json::to_string_pretty(&scenario)?);
        }
        ScenarioAction::Ai {
            topic,
            difficulty,
            time,
            groups,
        } => {
            let config = Config::load()?;
            let request = GenerateRequest {
                topic,
                difficulty: difficulty.unwrap_or(config.generator.default_difficulty),
                time_available: time.unwrap_or(config.generator.default_total_time),
                group_size: groups.unwrap_or(config.generator.default_group_count),
                user_id: user.map(String::from),
            };
            request.validate()?;

            let client = GeminiClient::from_env(&config.ai)?;
            let db = ScenarioDb::open()?;
            let scenario = AiScenarioGenerator::new(&client, &db)
                .generate(&request)
                .await?;
            println!("{}", serde_json::to_string_pretty(&scenario)?);
        }
        ScenarioAction::List => {
            let db = ScenarioDb::open()?;
            let scenarios = db.list(user)?;
            if scenarios.is_empty() {
                eprintln!("No scenarios found.");
            }
            println!("{}", serde_json::to_string_pretty(&scenarios)?);
        }
        ScenarioAction::Show { id } => {
            let db = ScenarioDb::open()?;
            let scenario = load_scenario(&db, &id, user, Access::Read)?;
            println!("{}", serde_json::to_string_pretty(&scenario)?);
        }
        ScenarioAction::Delete { id } => {
            let db = ScenarioDb::open()?;
            load_scenario(&db, &id, user, Access::Write)?;
            db.delete(&id)?;
            println!("Scenario deleted: {id}");
        }
        ScenarioAction::SetTime {
            id,
            stage,
            activity,
            minutes,
        } => {
            let db = ScenarioDb::open()?;
            let mut scenario = load_scenario(&db, &id, user, Access::Write)?;
            scenario.set_activity_time(
                zero_based("stage", stage)?,
                zero_based("activity", activity)?,
                minutes,
            )?;

            let patch = ScenarioPatch {
                stages: Some(scenario.stages.clone()),
                ..ScenarioPatch::default()
            };
            let updated = db.update(&id, &patch)?.unwrap_or(scenario);

            let drift = updated.drift_minutes();
            if drift != 0 {
                warn!(
                    drift,
                    planned = updated.planned_minutes(),
                    total_time = updated.total_time,
                    "stage totals no longer match the lesson length"
                );
            }
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
    }
    Ok(())
}
