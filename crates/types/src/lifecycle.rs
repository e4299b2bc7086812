use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The lifecycle event the orchestrator was invoked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(RequestType::Create),
            "update" => Ok(RequestType::Update),
            "delete" => Ok(RequestType::Delete),
            other => Err(format!("unknown request type {other:?}")),
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestType::Create => "create",
            RequestType::Update => "update",
            RequestType::Delete => "delete",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Failed,
}

/// What the orchestrator reports back to its invoker: a status, a stable
/// physical id for the run, and one `{Name}Addr` entry per processed step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleResponse {
    pub status: Status,
    pub physical_id: String,
    pub data: BTreeMap<String, String>,
}

impl LifecycleResponse {
    pub fn success(physical_id: String, data: BTreeMap<String, String>) -> Self {
        LifecycleResponse {
            status: Status::Success,
            physical_id,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_types_case_insensitively() {
        assert_eq!("Create".parse::<RequestType>().unwrap(), RequestType::Create);
        assert_eq!("update".parse::<RequestType>().unwrap(), RequestType::Update);
        assert_eq!("DELETE".parse::<RequestType>().unwrap(), RequestType::Delete);
        assert!("rollback".parse::<RequestType>().is_err());
    }

    #[test]
    fn response_serializes_with_camel_case_keys() {
        let resp = LifecycleResponse::success("sv-test-chaincode-2-cr".into(), BTreeMap::new());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "SUCCESS");
        assert_eq!(json["physicalId"], "sv-test-chaincode-2-cr");
    }
}
