//! Ownership checks applied at the CLI boundary.
//!
//! Scenarios without an owner are shared: anyone can read them, and any
//! identified caller can change them.

use crate::error::{CoreError, Result};
use crate::scenario::Scenario;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Check that `caller` may perform `access` on `scenario`.
///
/// # Errors
/// Returns [`CoreError::Authorization`] when the scenario belongs to someone
/// else, or when a write is attempted without a caller.
pub fn authorize(scenario: &Scenario, caller: Option<&str>, access: Access) -> Result<()> {
    if access == Access::Write && caller.is_none() {
        return Err(CoreError::Authorization(format!(
            "modifying scenario {} requires --user",
            scenario.id
        )));
    }
    match scenario.user_id.as_deref() {
        None => Ok(()),
        Some(owner) if caller == Some(owner) => Ok(()),
        Some(_) => Err(CoreError::Authorization(format!(
            "scenario {} belongs to another user",
            scenario.id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::generate_standard;

    fn owned_by(user: Option<&str>) -> Scenario {
        let mut scenario = generate_standard("Uniforms", 30, 2).unwrap();
        scenario.user_id = user.map(String::from);
        scenario
    }

    #[test]
    fn unowned_is_readable_by_anyone() {
        let scenario = owned_by(None);
        assert!(authorize(&scenario, None, Access::Read).is_ok());
        assert!(authorize(&scenario, Some("bob"), Access::Read).is_ok());
    }

    #[test]
    fn write_requires_a_caller() {
        let scenario = owned_by(None);
        let err = authorize(&scenario, None, Access::Write).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(authorize(&scenario, Some("bob"), Access::Write).is_ok());
    }

    #[test]
    fn owned_is_private_to_owner() {
        let scenario = owned_by(Some("alice"));
        assert!(authorize(&scenario, Some("alice"), Access::Read).is_ok());
        assert!(authorize(&scenario, Some("alice"), Access::Write).is_ok());
        assert!(authorize(&scenario, Some("bob"), Access::Read).is_err());
        assert!(authorize(&scenario, None, Access::Read).is_err());
        assert!(matches!(
            authorize(&scenario, Some("bob"), Access::Write),
            Err(CoreError::Authorization(_))
        ));
    }
}
