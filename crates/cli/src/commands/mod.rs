pub mod deploy;
pub mod reap;

use std::path::PathBuf;

use anyhow::Context;
use chaincode_types::DeploymentPlan;

const PARAMS_FILE_ENV: &str = "CHAINCODE_PARAMS_FILE";

/// Default persisted-parameter location: ~/.chaincode/params.json
pub fn default_params_file() -> PathBuf {
    if let Ok(path) = std::env::var(PARAMS_FILE_ENV) {
        PathBuf::from(path)
    } else {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".chaincode").join("params.json")
    }
}

pub fn read_plan(path: &PathBuf) -> anyhow::Result<DeploymentPlan> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading plan from {}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&raw).context("deployment plan is not valid JSON")?;
    DeploymentPlan::from_json(json).context("invalid deployment plan")
}
