//! SQLite-based scenario storage.
//!
//! The stage/activity tree is stored as a JSON column; scalar fields get
//! their own columns so listing and ownership filtering stay in SQL.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::data_dir;
use super::migrations;
use crate::error::{DatabaseError, Result};
use crate::scenario::{Scenario, Stage};

/// Storage collaborator for scenarios.
///
/// Ownership is not checked here; see [`crate::access`].
pub trait ScenarioStore {
    /// All scenarios, or only those owned by `user_id`, newest first.
    fn list(&self, user_id: Option<&str>) -> Result<Vec<Scenario>>;

    fn get(&self, id: &str) -> Result<Option<Scenario>>;

    fn create(&self, scenario: &Scenario) -> Result<Scenario>;

    /// Apply `patch` and return the updated scenario, or `None` if `id` is unknown.
    fn update(&self, id: &str, patch: &ScenarioPatch) -> Result<Option<Scenario>>;

    /// Returns whether a scenario was deleted.
    fn delete(&self, id: &str) -> Result<bool>;
}

/// Partial update of a scenario. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub total_time: Option<u32>,
    #[serde(default)]
    pub group_count: Option<u32>,
    #[serde(default)]
    pub stages: Option<Vec<Stage>>,
}

impl ScenarioPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.total_time.is_none()
            && self.group_count.is_none()
            && self.stages.is_none()
    }

    /// Apply to `scenario` and check the result.
    pub fn apply_to(&self, scenario: &mut Scenario) -> Result<()> {
        if let Some(title) = &self.title {
            scenario.title = title.clone();
        }
        if let Some(total_time) = self.total_time {
            scenario.total_time = total_time;
        }
        if let Some(group_count) = self.group_count {
            scenario.group_count = group_count;
        }
        if let Some(stages) = &self.stages {
            scenario.stages = stages.clone();
        }
        scenario.validate()?;
        Ok(())
    }
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

const SELECT_COLUMNS: &str =
    "SELECT id, title, total_time, group_count, stages, created_at, user_id FROM scenarios";

/// Build a Scenario from a database row
fn row_to_scenario(row: &rusqlite::Row) -> Result<Scenario, rusqlite::Error> {
    let stages_json: String = row.get(4)?;
    let stages: Vec<Stage> = serde_json::from_str(&stages_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at: String = row.get(5)?;

    Ok(Scenario {
        id: row.get(0)?,
        title: row.get(1)?,
        total_time: row.get(2)?,
        group_count: row.get(3)?,
        stages,
        created_at: parse_datetime_fallback(&created_at),
        user_id: row.get(6)?,
    })
}

/// SQLite database for scenarios.
pub struct ScenarioDb {
    conn: Connection,
}

impl ScenarioDb {
    /// Open the database at `<data_dir>/debate-tutor.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("debate-tutor.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    fn insert(&self, scenario: &Scenario) -> Result<()> {
        let stages = serde_json::to_string(&scenario.stages)?;
        self.conn.execute(
            "INSERT INTO scenarios
                (id, title, total_time, group_count, stages, created_at, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                scenario.id,
                scenario.title,
                scenario.total_time,
                scenario.group_count,
                stages,
                format_datetime(&scenario.created_at),
                scenario.user_id,
            ],
        )?;
        Ok(())
    }

    fn rewrite(&self, scenario: &Scenario) -> Result<()> {
        let stages = serde_json::to_string(&scenario.stages)?;
        self.conn.execute(
            "UPDATE scenarios
             SET title = ?2, total_time = ?3, group_count = ?4, stages = ?5
             WHERE id = ?1",
            params![
                scenario.id,
                scenario.title,
                scenario.total_time,
                scenario.group_count,
                stages,
            ],
        )?;
        Ok(())
    }
}

impl ScenarioStore for ScenarioDb {
    fn list(&self, user_id: Option<&str>) -> Result<Vec<Scenario>> {
        let scenarios = match user_id {
            Some(user_id) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
                ))?;
                let rows = stmt.query_map(params![user_id], row_to_scenario)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "{SELECT_COLUMNS} ORDER BY created_at DESC, rowid DESC"
                ))?;
                let rows = stmt.query_map([], row_to_scenario)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(scenarios)
    }

    fn get(&self, id: &str) -> Result<Option<Scenario>> {
        let scenario = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                row_to_scenario,
            )
            .optional()?;
        Ok(scenario)
    }

    fn create(&self, scenario: &Scenario) -> Result<Scenario> {
        self.insert(scenario)?;
        info!(id = %scenario.id, "scenario saved");
        Ok(scenario.clone())
    }

    fn update(&self, id: &str, patch: &ScenarioPatch) -> Result<Option<Scenario>> {
        let Some(mut scenario) = self.get(id)? else {
            return Ok(None);
        };
        patch.apply_to(&mut scenario)?;
        self.rewrite(&scenario)?;
        debug!(id, "scenario updated");
        Ok(Some(scenario))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM scenarios WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}
