//! Prompt contract for AI-generated scenarios.
//!
//! The text service is asked for a JSON object shaped like [`Scenario`].
//! Replies are free text, so the first balanced `{...}` block is extracted
//! before parsing. Stage and activity ids are optional in the reply and are
//! filled in with fresh uuids.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use indoc::{formatdoc, indoc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{Activity, Scenario, Stage};
use crate::error::{CoreError, Result, ValidationError};

pub const SYSTEM_PROMPT: &str = indoc! {"
    You are an expert debate coach and educator specialized in creating structured debate scenarios for educational purposes.
    Your task is to create meaningful, engaging, and well-structured debate scenarios that can be used in a classroom or debate club setting.
    You should provide detailed, structured scenarios with clear stages, activities, and time allocations.
"};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    /// What the lesson should emphasize at this level.
    pub fn focus(&self) -> &'static str {
        match self {
            Difficulty::Beginner => {
                "basic argumentation skills, simpler topics, and more structured guidance"
            }
            Difficulty::Intermediate => {
                "developing more nuanced arguments, introducing rebuttal techniques, and building evidence-based positions"
            }
            Difficulty::Advanced => {
                "advanced rhetorical techniques, complex moral reasoning, and sophisticated policy analysis"
            }
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => Err(ValidationError::invalid(
                "difficulty",
                "must be one of: beginner, intermediate, advanced",
            )),
        }
    }
}

/// Build the user prompt for one scenario request.
pub fn scenario_prompt(
    topic: &str,
    difficulty: Difficulty,
    time_available: u32,
    group_size: u32,
) -> String {
    formatdoc! {r#"
        Create a comprehensive debate scenario on the topic: "{topic}"

        The scenario should be designed for {difficulty} level students in groups of {group_size} participants.
        The total time available for the debate is {time_available} minutes.

        Please structure the response as a JSON object with the following format:
        {{
          "title": "Descriptive title for the debate scenario",
          "totalTime": {time_available},
          "groupCount": {group_size},
          "stages": [
            {{
              "id": "unique-id-for-stage-1",
              "title": "Stage name (e.g., 'Preparation', 'Opening Arguments')",
              "activities": [
                {{
                  "id": "unique-id-for-activity-1",
                  "title": "Clear description of the activity",
                  "timeMinutes": number of minutes for this activity
                }}
              ],
              "totalTime": sum of all activity times for this stage
            }}
          ]
        }}

        Design the scenario to be educationally valuable, well-paced, and engaging. Include activities that develop critical thinking, research skills, and effective communication.

        For {difficulty} level, focus on {focus}.

        Ensure stage and activity IDs are unique. Calculate the totalTime for each stage as the sum of all activity times within that stage.
        The sum of all stage totalTime values should not exceed {time_available} minutes.
    "#,
        focus = difficulty.focus(),
    }
}

/// Return the first balanced `{...}` block of `text`.
///
/// Braces inside JSON string literals are ignored.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftActivity {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub time_minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftStage {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub activities: Vec<DraftActivity>,
    #[serde(default)]
    pub total_time: Option<u32>,
}

/// Scenario as returned by the text service, before ids are assigned.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftScenario {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub total_time: Option<u32>,
    #[serde(default)]
    pub group_count: Option<u32>,
    pub stages: Vec<DraftStage>,
}

fn fresh_id(id: Option<String>) -> String {
    match id {
        Some(id) if !id.trim().is_empty() => id,
        _ => Uuid::new_v4().to_string(),
    }
}

impl DraftScenario {
    /// Turn the draft into a scenario, keeping every id that is present.
    ///
    /// Numeric fields are taken as given; missing top-level fields fall back
    /// to the request values.
    pub fn into_scenario(self, topic: &str, time_available: u32, group_size: u32) -> Scenario {
        let stages = self
            .stages
            .into_iter()
            .map(|stage| {
                let activities: Vec<Activity> = stage
                    .activities
                    .into_iter()
                    .map(|a| Activity::new(fresh_id(a.id), a.title, a.time_minutes))
                    .collect();
                let total_time = stage
                    .total_time
                    .unwrap_or_else(|| activities.iter().map(|a| a.time_minutes).sum());
                Stage {
                    id: fresh_id(stage.id),
                    title: stage.title,
                    activities,
                    total_time,
                }
            })
            .collect();

        Scenario {
            id: Uuid::new_v4().to_string(),
            title: self
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| topic.to_string()),
            total_time: self.total_time.unwrap_or(time_available),
            group_count: self.group_count.unwrap_or(group_size),
            stages,
            created_at: Utc::now(),
            user_id: None,
        }
    }
}

/// Parse a raw service reply into a draft scenario.
///
/// # Errors
/// Returns [`CoreError::Parse`] if no JSON object is present or it does not
/// have the scenario shape.
pub fn parse_scenario_response(response: &str) -> Result<DraftScenario> {
    let json = extract_json_object(response)
        .ok_or_else(|| CoreError::Parse("no JSON object found in the response".into()))?;
    serde_json::from_str(json)
        .map_err(|e| CoreError::Parse(format!("failed to parse the AI-generated scenario: {e}")))
}
