use std::collections::BTreeSet;

use chaincode_types::DeploymentPlan;

use crate::error::{OrchestratorError, Result};

/// Reject a plan whose step names are not unique. Runs before any network
/// call.
pub fn validate(plan: &DeploymentPlan) -> Result<()> {
    let mut seen = BTreeSet::new();
    for step in plan.steps() {
        if !seen.insert(step.name.as_str()) {
            return Err(OrchestratorError::PlanValidation(format!(
                "all step names must be unique; {:?} appears more than once",
                step.name
            )));
        }
    }
    Ok(())
}
