use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("operation type {0:?} is not recognised as a valid type of operation")]
    UnsupportedStepType(String),
    #[error("malformed plan input: {0}")]
    MalformedInput(String),
    #[error("failed to decode deployment plan: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A symbolic value appearing in a plan step's inputs or library map.
///
/// Bare strings are classified by their leading sigil: `$name` points at the
/// address of a previously deployed step, `%tag` names one of the synthesized
/// special addresses, anything else is a literal passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableValue {
    Literal(String),
    AddressPointer(String),
    SpecialAddress(String),
}

impl VariableValue {
    pub fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix('$') {
            VariableValue::AddressPointer(name.to_string())
        } else if let Some(tag) = raw.strip_prefix('%') {
            VariableValue::SpecialAddress(tag.to_string())
        } else {
            VariableValue::Literal(raw.to_string())
        }
    }

    /// The raw string form as it appears in plan JSON.
    pub fn as_raw(&self) -> String {
        match self {
            VariableValue::Literal(s) => s.clone(),
            VariableValue::AddressPointer(name) => format!("${name}"),
            VariableValue::SpecialAddress(tag) => format!("%{tag}"),
        }
    }

    /// The referenced step name, when this value is an address pointer.
    pub fn pointer(&self) -> Option<&str> {
        match self {
            VariableValue::AddressPointer(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

impl Serialize for VariableValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_raw())
    }
}

impl<'de> Deserialize<'de> for VariableValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(VariableValue::parse(&raw))
    }
}

/// One constructor input of a plan step.
///
/// Plan JSON allows either a bare string or `{"Value": ..., "Type": ...}`;
/// both forms round-trip through serde unchanged, which the cache layer
/// relies on when comparing current inputs against persisted ones.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub value: VariableValue,
    pub declared_type: Option<String>,
}

impl InputSpec {
    pub fn bare(raw: &str) -> Self {
        InputSpec {
            value: VariableValue::parse(raw),
            declared_type: None,
        }
    }

    pub fn typed(raw: &str, ty: &str) -> Self {
        InputSpec {
            value: VariableValue::parse(raw),
            declared_type: Some(ty.to_string()),
        }
    }

    pub fn from_json(json: &Json) -> Result<Self, PlanError> {
        match json {
            Json::String(s) => Ok(InputSpec::bare(s)),
            Json::Object(map) => {
                let raw = map
                    .get("Value")
                    .ok_or_else(|| PlanError::MalformedInput("object is missing \"Value\"".into()))?;
                let value = match raw {
                    Json::String(s) => VariableValue::parse(s),
                    other => VariableValue::Literal(other.to_string()),
                };
                let declared_type = match map.get("Type") {
                    None | Some(Json::Null) => None,
                    Some(Json::String(t)) => Some(t.clone()),
                    Some(other) => {
                        return Err(PlanError::MalformedInput(format!(
                            "\"Type\" must be a string, got {other}"
                        )))
                    }
                };
                Ok(InputSpec {
                    value,
                    declared_type,
                })
            }
            other => Err(PlanError::MalformedInput(format!(
                "expected a string or an object, got {other}"
            ))),
        }
    }
}

impl Serialize for InputSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.declared_type {
            None => serializer.serialize_str(&self.value.as_raw()),
            Some(ty) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("Value", &self.value.as_raw())?;
                map.serialize_entry("Type", ty)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for InputSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Json::deserialize(deserializer)?;
        InputSpec::from_json(&json).map_err(de::Error::custom)
    }
}

/// The kind of operation a plan step performs. Deliberately a closed enum so
/// that adding a new operation kind is a compile-time-checked decision at
/// every dispatch site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
    Deploy,
}

impl FromStr for StepType {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deploy" => Ok(StepType::Deploy),
            other => Err(PlanError::UnsupportedStepType(other.to_string())),
        }
    }
}

/// One named unit of work in a deployment plan.
#[derive(Debug, Clone)]
pub struct ContractSpec {
    pub name: String,
    pub step_type: StepType,
    pub inputs: Vec<InputSpec>,
    pub libraries: BTreeMap<String, VariableValue>,
    /// Present iff the constructor is payable. The payload itself is opaque.
    pub value: Option<Json>,
    /// Remote bytecode source. Parsed but never supported.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Type")]
    step_type: String,
    #[serde(rename = "Inputs", default)]
    inputs: Vec<InputSpec>,
    #[serde(rename = "Libraries", default)]
    libraries: BTreeMap<String, VariableValue>,
    #[serde(rename = "Value")]
    value: Option<Json>,
    #[serde(rename = "URL")]
    url: Option<String>,
}

impl TryFrom<RawStep> for ContractSpec {
    type Error = PlanError;

    fn try_from(raw: RawStep) -> Result<Self, Self::Error> {
        Ok(ContractSpec {
            step_type: raw.step_type.parse()?,
            name: raw.name,
            inputs: raw.inputs,
            libraries: raw.libraries,
            value: raw.value,
            url: raw.url,
        })
    }
}

/// The ordered list of contract-deployment steps for one orchestrator run.
/// Shape and operation kinds are checked once here, at load time.
#[derive(Debug, Clone, Default)]
pub struct DeploymentPlan {
    steps: Vec<ContractSpec>,
}

impl DeploymentPlan {
    pub fn new(steps: Vec<ContractSpec>) -> Self {
        DeploymentPlan { steps }
    }

    pub fn from_json(json: Json) -> Result<Self, PlanError> {
        let raw: Vec<RawStep> = serde_json::from_value(json)?;
        let steps = raw
            .into_iter()
            .map(ContractSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DeploymentPlan { steps })
    }

    pub fn steps(&self) -> &[ContractSpec] {
        &self.steps
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_values_by_sigil() {
        assert_eq!(
            VariableValue::parse("$membership"),
            VariableValue::AddressPointer("membership".into())
        );
        assert_eq!(
            VariableValue::parse("%self"),
            VariableValue::SpecialAddress("self".into())
        );
        assert_eq!(
            VariableValue::parse("0x1234"),
            VariableValue::Literal("0x1234".into())
        );
    }

    #[test]
    fn parses_plan_with_mixed_input_forms() {
        let plan = DeploymentPlan::from_json(json!([
            {"Name": "membership", "Type": "deploy"},
            {
                "Name": "voting",
                "Type": "deploy",
                "Inputs": ["$membership", {"Value": "%self", "Type": "address"}],
                "Libraries": {"__BallotLib__": "$ballotLib"}
            }
        ]))
        .unwrap();

        assert_eq!(plan.len(), 2);
        let voting = &plan.steps()[1];
        assert_eq!(voting.inputs.len(), 2);
        assert_eq!(
            voting.inputs[0].value,
            VariableValue::AddressPointer("membership".into())
        );
        assert_eq!(voting.inputs[1].declared_type.as_deref(), Some("address"));
        assert_eq!(
            voting.libraries["__BallotLib__"],
            VariableValue::AddressPointer("ballotLib".into())
        );
    }

    #[test]
    fn rejects_unknown_step_type() {
        let err = DeploymentPlan::from_json(json!([
            {"Name": "a", "Type": "call"}
        ]))
        .unwrap_err();
        assert!(matches!(err, PlanError::UnsupportedStepType(t) if t == "call"));
    }

    #[test]
    fn inputs_round_trip_through_serde() {
        let inputs = vec![InputSpec::bare("$a"), InputSpec::typed("%self", "address")];
        let json = serde_json::to_value(&inputs).unwrap();
        assert_eq!(json, json!(["$a", {"Value": "%self", "Type": "address"}]));
        let back: Vec<InputSpec> = serde_json::from_value(json).unwrap();
        assert_eq!(back, inputs);
    }

    #[test]
    fn rejects_malformed_input_object() {
        let err = InputSpec::from_json(&json!({"Type": "address"})).unwrap_err();
        assert!(matches!(err, PlanError::MalformedInput(_)));
    }
}
