pub mod config;
pub mod facilitate;
pub mod scenario;

use debate_tutor_core::{authorize, Access, CoreError, Result, Scenario, ScenarioStore};

/// Fetch a scenario and check that `user` may access it.
pub(crate) fn load_scenario<S: ScenarioStore>(
    store: &S,
    id: &str,
    user: Option<&str>,
    access: Access,
) -> Result<Scenario> {
    let scenario = store.get(id)?.ok_or_else(|| CoreError::not_found(id))?;
    authorize(&scenario, user, access)?;
    Ok(scenario)
}
