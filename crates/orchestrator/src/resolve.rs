//! Symbolic variable resolution: address pointers to earlier steps, the
//! fixed set of special addresses, and literal passthrough.

use std::collections::BTreeMap;

use chaincode_types::{ResolvedContract, VariableValue};
use ethers::types::Address;

use crate::error::{OrchestratorError, Result};

/// Results accumulated so far in one run, keyed by step name.
pub type Results = BTreeMap<String, ResolvedContract>;

pub const ADDR_ZERO: &str = "0x0000000000000000000000000000000000000000";
pub const ADDR_ONES: &str = "0x1111111111111111111111111111111111111111";

/// Resolve one variable against the results produced so far. Never mutates
/// `results`; literals come back unchanged.
pub fn resolve(value: &VariableValue, account: Address, results: &Results) -> Result<String> {
    match value {
        VariableValue::Literal(s) => Ok(s.clone()),
        VariableValue::AddressPointer(name) => results
            .get(name)
            .map(|c| format!("{:#x}", c.address))
            .ok_or_else(|| {
                OrchestratorError::UnresolvedReference(format!(
                    "${name} does not refer to any completed step"
                ))
            }),
        VariableValue::SpecialAddress(tag) => match tag.as_str() {
            "self" => Ok(format!("{:#x}", account)),
            "addr-zero" => Ok(ADDR_ZERO.to_string()),
            "addr-ones" => Ok(ADDR_ONES.to_string()),
            other => Err(OrchestratorError::UnresolvedReference(format!(
                "unknown special address %{other}"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Address {
        "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap()
    }

    #[test]
    fn special_addresses_resolve_without_results() {
        let results = Results::new();
        assert_eq!(
            resolve(&VariableValue::parse("%self"), account(), &results).unwrap(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(
            resolve(&VariableValue::parse("%addr-zero"), account(), &results).unwrap(),
            ADDR_ZERO
        );
        assert_eq!(
            resolve(&VariableValue::parse("%addr-ones"), account(), &results).unwrap(),
            ADDR_ONES
        );
    }

    #[test]
    fn pointer_resolves_to_step_address() {
        let mut results = Results::new();
        let addr: Address = "0x000000000000000000000000000000000000abcd".parse().unwrap();
        results.insert(
            "dep".into(),
            ResolvedContract::from_cache("dep", addr, vec![]),
        );
        assert_eq!(
            resolve(&VariableValue::parse("$dep"), account(), &results).unwrap(),
            "0x000000000000000000000000000000000000abcd"
        );
    }

    #[test]
    fn missing_pointer_is_unresolved() {
        let err = resolve(&VariableValue::parse("$nope"), account(), &Results::new()).unwrap_err();
        assert!(matches!(err, OrchestratorError::UnresolvedReference(_)));
    }

    #[test]
    fn unknown_special_tag_is_unresolved() {
        let err = resolve(&VariableValue::parse("%addr-twos"), account(), &Results::new())
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::UnresolvedReference(_)));
    }

    #[test]
    fn literal_passes_through() {
        assert_eq!(
            resolve(&VariableValue::parse("0x1234"), account(), &Results::new()).unwrap(),
            "0x1234"
        );
    }
}
