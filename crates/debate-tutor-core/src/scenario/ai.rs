//! AI-assisted scenario generation.
//!
//! The text service designs the stage/activity structure; this module
//! builds the prompt, parses the reply, assigns missing ids, re-syncs the
//! stage totals and checks the tree before it is persisted. There is no
//! fallback to the standard template when the service fails.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::model::Scenario;
use super::prompts::{parse_scenario_response, scenario_prompt, Difficulty, SYSTEM_PROMPT};
use crate::error::{Result, ValidationError};
use crate::integrations::TextGenerator;
use crate::storage::ScenarioStore;

pub const TIME_AVAILABLE_RANGE: std::ops::RangeInclusive<u32> = 10..=180;
pub const GROUP_SIZE_RANGE: std::ops::RangeInclusive<u32> = 2..=20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    /// Minutes.
    pub time_available: u32,
    pub group_size: u32,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.topic.trim().is_empty() {
            return Err(ValidationError::invalid("topic", "must not be empty"));
        }
        if !TIME_AVAILABLE_RANGE.contains(&self.time_available) {
            return Err(ValidationError::invalid(
                "time_available",
                "must be between 10 and 180 minutes",
            ));
        }
        if !GROUP_SIZE_RANGE.contains(&self.group_size) {
            return Err(ValidationError::invalid("group_size", "must be between 2 and 20"));
        }
        Ok(())
    }
}

pub struct AiScenarioGenerator<'a, G, S> {
    generator: &'a G,
    store: &'a S,
}

impl<'a, G, S> AiScenarioGenerator<'a, G, S>
where
    G: TextGenerator,
    S: ScenarioStore,
{
    pub fn new(generator: &'a G, store: &'a S) -> Self {
        Self { generator, store }
    }

    /// Ask the service for a scenario and check it, without saving.
    ///
    /// # Errors
    /// Validation errors for a bad request or an unusable tree, parse errors
    /// for a malformed reply, upstream errors from the service.
    pub async fn draft(&self, request: &GenerateRequest) -> Result<Scenario> {
        request.validate()?;

        let topic = request.topic.trim();
        let prompt = scenario_prompt(
            topic,
            request.difficulty,
            request.time_available,
            request.group_size,
        );
        let reply = self.generator.send(&prompt, Some(SYSTEM_PROMPT)).await?;

        let mut scenario = parse_scenario_response(&reply)?.into_scenario(
            topic,
            request.time_available,
            request.group_size,
        );

        let stale: Vec<&str> = scenario
            .stages
            .iter()
            .filter(|s| !s.is_synced())
            .map(|s| s.id.as_str())
            .collect();
        if !stale.is_empty() {
            warn!(stages = ?stale, "stage totals from service did not match activities; re-synced");
        }
        scenario.recompute_totals();
        scenario.validate()?;

        let planned = scenario.planned_minutes();
        if planned > request.time_available {
            warn!(
                planned,
                time_available = request.time_available,
                "generated scenario exceeds the available time"
            );
        }

        scenario.user_id = request.user_id.clone();
        Ok(scenario)
    }

    /// Generate a scenario and persist it.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<Scenario> {
        let scenario = self.draft(request).await?;
        let saved = self.store.create(&scenario)?;
        info!(
            id = %saved.id,
            service = self.generator.name(),
            stages = saved.stages.len(),
            "generated scenario with text service"
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::storage::ScenarioDb;
    use std::sync::Mutex;

    struct CannedReply {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedReply {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for CannedReply {
        fn name(&self) -> &str {
            "canned"
        }

        async fn send(&self, prompt: &str, system_instruction: Option<&str>) -> Result<String> {
            assert_eq!(system_instruction, Some(SYSTEM_PROMPT));
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(|m| CoreError::upstream("canned", m))
        }
    }

    fn request() -> GenerateRequest {
        GenerateRequest {
            topic: "Should homework be banned?".into(),
            difficulty: Difficulty::Advanced,
            time_available: 40,
            group_size: 4,
            user_id: Some("coach-1".into()),
        }
    }

    const REPLY: &str = r#"Here is your scenario:
    {"title": "Homework", "totalTime": 40, "groupCount": 4, "stages": [
      {"id": "s1", "title": "Prep", "totalTime": 99,
       "activities": [{"id": "a", "title": "Read", "timeMinutes": 10},
                      {"title": "Plan", "timeMinutes": 5}]},
      {"title": "Debate",
       "activities": [{"title": "Argue", "timeMinutes": 20}]}
    ]}
    Good luck!"#;

    #[tokio::test]
    async fn generate_repairs_totals_and_saves_with_owner() {
        let service = CannedReply::ok(REPLY);
        let db = ScenarioDb::open_memory().unwrap();
        let saved = AiScenarioGenerator::new(&service, &db)
            .generate(&request())
            .await
            .unwrap();

        assert_eq!(saved.stages[0].total_time, 15);
        assert_eq!(saved.stages[0].activities[0].id, "a");
        assert!(!saved.stages[0].activities[1].id.is_empty());
        assert_eq!(saved.user_id.as_deref(), Some("coach-1"));
        assert_eq!(db.get(&saved.id).unwrap().unwrap(), saved);

        let prompts = service.prompts.lock().unwrap();
        assert!(prompts[0].contains("sophisticated policy analysis"));
    }

    #[tokio::test]
    async fn bad_request_never_reaches_the_service() {
        let service = CannedReply::ok(REPLY);
        let db = ScenarioDb::open_memory().unwrap();
        let mut req = request();
        req.time_available = 5;
        let err = AiScenarioGenerator::new(&service, &db)
            .generate(&req)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(service.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn prose_reply_is_a_parse_error_and_nothing_is_saved() {
        let service = CannedReply::ok("Sorry, I cannot help with that.");
        let db = ScenarioDb::open_memory().unwrap();
        let err = AiScenarioGenerator::new(&service, &db)
            .generate(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Parse(_)));
        assert!(db.list(None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_propagates_unchanged() {
        let service = CannedReply::failing("connection reset");
        let db = ScenarioDb::open_memory().unwrap();
        let err = AiScenarioGenerator::new(&service, &db)
            .generate(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Upstream { .. }));
        assert!(db.list(None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn structurally_broken_tree_is_rejected() {
        let service = CannedReply::ok(
            r#"{"stages": [{"id": "x", "title": "A", "activities": [{"title": "a", "timeMinutes": 0}]}]}"#,
        );
        let db = ScenarioDb::open_memory().unwrap();
        let err = AiScenarioGenerator::new(&service, &db)
            .draft(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn request_validation_names_the_constraint() {
        let mut req = request();
        req.group_size = 30;
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("between 2 and 20"));
        req.group_size = 4;
        req.topic = " ".into();
        assert!(req.validate().is_err());
    }
}
