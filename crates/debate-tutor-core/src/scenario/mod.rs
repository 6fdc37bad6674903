mod ai;
mod guidance;
mod model;
mod prompts;
pub mod template;

pub use ai::{AiScenarioGenerator, GenerateRequest, GROUP_SIZE_RANGE, TIME_AVAILABLE_RANGE};
pub use guidance::{Guidance, GuidanceTable};
pub use model::{Activity, Scenario, Stage};
pub use prompts::{
    extract_json_object, parse_scenario_response, scenario_prompt, Difficulty, DraftScenario,
    SYSTEM_PROMPT,
};
pub use template::{generate_standard, stage_budgets, STANDARD_STAGES};
