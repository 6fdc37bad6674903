//! Facilitator guidance keyed by template activity id.
//!
//! The lookup is total: unknown ids resolve to an empty record so callers
//! simply render nothing. Built-in entries can be overridden from a TOML
//! file of the form:
//!
//! ```toml
//! [entries."1-1"]
//! guide_text = "..."
//! example_questions = ["...", "..."]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidance {
    pub guide_text: String,
    #[serde(default)]
    pub example_questions: Vec<String>,
}

impl Guidance {
    fn new(guide_text: &str, example_questions: &[&str]) -> Self {
        Self {
            guide_text: guide_text.to_string(),
            example_questions: example_questions.iter().map(|q| q.to_string()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.guide_text.is_empty() && self.example_questions.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
struct GuidanceFile {
    #[serde(default)]
    entries: HashMap<String, Guidance>,
}

#[derive(Debug, Clone, Default)]
pub struct GuidanceTable {
    entries: HashMap<String, Guidance>,
    empty: Guidance,
}

impl GuidanceTable {
    /// Guidance for the eleven activities of the standard template.
    pub fn standard() -> Self {
        let entries = [
            (
                "1-1",
                Guidance::new(
                    "Look at a photo or clip and freely pose 'why' and 'how' questions, then share them.",
                    &[
                        "What do you see in this scene?",
                        "What thoughts come to mind?",
                        "Why do you think this situation happened?",
                    ],
                ),
            ),
            (
                "1-2",
                Guidance::new(
                    "Find the core issues of the motion and discuss them within your group.",
                    &[
                        "What is the most important point of this topic?",
                        "What could each side argue?",
                        "Where do the two sides clash?",
                    ],
                ),
            ),
            (
                "1-3",
                Guidance::new(
                    "Research and analyse material on the topic with your group.",
                    &[
                        "What does this source tell us?",
                        "Which position does it support?",
                        "How reliable is this source?",
                    ],
                ),
            ),
            (
                "1-4",
                Guidance::new(
                    "Write your group's position paper from what you found.",
                    &[
                        "Is your claim stated clearly?",
                        "Is your evidence sufficient?",
                        "How will you answer the rebuttals you expect?",
                    ],
                ),
            ),
            (
                "2-1",
                Guidance::new(
                    "Each group presents the claim that opens the debate.",
                    &[
                        "Let's hear the affirmative side first.",
                        "Now let's hear the negative side.",
                        "Each team has three minutes.",
                    ],
                ),
            ),
            (
                "2-2",
                Guidance::new(
                    "Prepare questions and rebuttals to the other side within your group.",
                    &[
                        "Which part of their claim do you want to question?",
                        "What logic looks weakest?",
                        "What evidence seems to be missing?",
                    ],
                ),
            ),
            (
                "2-3",
                Guidance::new(
                    "Question and rebut the other group's claims.",
                    &[
                        "Good questions expose the weak points of the other side.",
                        "Back every rebuttal with concrete evidence.",
                        "Listen carefully and stay respectful.",
                    ],
                ),
            ),
            (
                "2-4",
                Guidance::new(
                    "Confer in groups, then hold an open floor debate.",
                    &[
                        "Let's make sure everyone speaks at least once.",
                        "Take notes while others speak and rebut on your turn.",
                        "Offer reasons rather than emotional remarks.",
                    ],
                ),
            ),
            (
                "2-5",
                Guidance::new(
                    "Summarize your claim in a way that accepts differences and allows coexistence.",
                    &[
                        "What did you come to understand about the other side?",
                        "What values do both sides share?",
                        "How could different positions coexist?",
                    ],
                ),
            ),
            (
                "3-1",
                Guidance::new(
                    "Share how your thinking changed through the debate.",
                    &[
                        "How did your view change from before the debate?",
                        "Which argument from the other side was most persuasive?",
                        "What did you learn for the first time?",
                    ],
                ),
            ),
            (
                "3-2",
                Guidance::new(
                    "Discuss actions and civic participation related to the topic.",
                    &[
                        "What can we do in our classroom?",
                        "Is there an idea we could propose to the school or community?",
                        "What can we do to help solve this problem?",
                    ],
                ),
            ),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|(id, guidance)| (id.to_string(), guidance))
                .collect(),
            empty: Guidance::default(),
        }
    }

    /// Guidance for `activity_id`, or an empty record when there is none.
    pub fn get(&self, activity_id: &str) -> &Guidance {
        self.entries.get(activity_id).unwrap_or(&self.empty)
    }

    pub fn contains(&self, activity_id: &str) -> bool {
        self.entries.contains_key(activity_id)
    }

    /// Merge entries parsed from TOML over the current ones.
    pub fn merge_toml(&mut self, content: &str) -> Result<usize> {
        let file: GuidanceFile =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let count = file.entries.len();
        self.entries.extend(file.entries);
        Ok(count)
    }

    /// Merge entries from a TOML file over the current ones.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_overrides(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.merge_toml(&content)
    }
}
