//! The per-step cache decision: may a prior deployment be reused instead of
//! broadcasting again?

use chaincode_common::{
    logger,
    params::{ParamKeys, ParamStore},
};
use chaincode_types::{ContractSpec, InputSpec};

use crate::{
    error::{OrchestratorError, Result},
    resolve::Results,
};

/// Whether `spec` may be served from the persisted store this run.
///
/// Two independent checks, both of which must pass:
/// 1. every address pointer in Inputs/Libraries refers to a step that was
///    itself served from cache this run — a freshly deployed upstream
///    generally has a new address, so it invalidates downstream reuse even
///    when the downstream inputs text is unchanged;
/// 2. the persisted address and inputs records for this step exist, and the
///    persisted inputs compare positionally equal to the current ones. The
///    comparison is over the raw, unresolved input values.
///
/// Store read failures are conservative: the step is simply not cacheable.
/// A pointer to a step absent from `results` is a fatal configuration error.
pub async fn can_skip(
    spec: &ContractSpec,
    results: &Results,
    store: &dyn ParamStore,
    keys: &ParamKeys,
) -> Result<bool> {
    let pointers = spec
        .inputs
        .iter()
        .map(|i| &i.value)
        .chain(spec.libraries.values())
        .filter_map(|v| v.pointer());

    for name in pointers {
        let upstream = results.get(name).ok_or_else(|| {
            OrchestratorError::UnresolvedReference(format!(
                "${name} does not refer to any completed step"
            ))
        })?;
        if !upstream.cached {
            return Ok(false);
        }
    }

    Ok(persisted_record_matches(spec, store, keys).await)
}

async fn persisted_record_matches(
    spec: &ContractSpec,
    store: &dyn ParamStore,
    keys: &ParamKeys,
) -> bool {
    let addr_key = keys.sc_addr(&spec.name);
    let inputs_key = keys.sc_inputs(&spec.name);

    match (store.exists(&addr_key).await, store.exists(&inputs_key).await) {
        (Ok(true), Ok(true)) => {}
        (Ok(_), Ok(_)) => return false,
        (Err(e), _) | (_, Err(e)) => {
            logger::warn(format!(
                "error checking persisted records for {}: {e}",
                spec.name
            ));
            return false;
        }
    }

    let persisted = match store.get_json(&inputs_key).await {
        Ok(Some(json)) => json,
        Ok(None) => return false,
        Err(e) => {
            logger::warn(format!("error reading cached inputs for {}: {e}", spec.name));
            return false;
        }
    };
    let persisted: Vec<InputSpec> = match serde_json::from_value(persisted) {
        Ok(inputs) => inputs,
        Err(e) => {
            logger::warn(format!("cached inputs for {} are malformed: {e}", spec.name));
            return false;
        }
    };

    persisted == spec.inputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincode_common::testing::MemoryParamStore;
    use chaincode_types::{DeploymentPlan, ResolvedContract};
    use ethers::types::Address;
    use serde_json::json;

    fn spec(inputs: serde_json::Value) -> ContractSpec {
        let plan = DeploymentPlan::from_json(json!([
            {"Name": "b", "Type": "deploy", "Inputs": inputs}
        ]))
        .unwrap();
        plan.steps()[0].clone()
    }

    fn results_with(name: &str, cached: bool) -> Results {
        let mut results = Results::new();
        let addr = Address::from_low_u64_be(0xabcd);
        let contract = if cached {
            ResolvedContract::from_cache(name, addr, vec![])
        } else {
            ResolvedContract::deployed(name, "0x60".into(), addr, vec![], 1.into())
        };
        results.insert(name.to_string(), contract);
        results
    }

    fn seeded_store(keys: &ParamKeys, name: &str, inputs: &str) -> MemoryParamStore {
        let store = MemoryParamStore::new();
        store.insert(&keys.sc_addr(name), "0x000000000000000000000000000000000000abcd");
        store.insert(&keys.sc_inputs(name), inputs);
        store
    }

    #[tokio::test]
    async fn skips_when_deps_cached_and_inputs_match() {
        let keys = ParamKeys::new("t");
        let store = seeded_store(&keys, "b", r#"["$a"]"#);
        let spec = spec(json!(["$a"]));
        let results = results_with("a", true);

        assert!(can_skip(&spec, &results, &store, &keys).await.unwrap());
    }

    #[tokio::test]
    async fn fresh_upstream_blocks_skip() {
        let keys = ParamKeys::new("t");
        let store = seeded_store(&keys, "b", r#"["$a"]"#);
        let spec = spec(json!(["$a"]));
        let results = results_with("a", false);

        assert!(!can_skip(&spec, &results, &store, &keys).await.unwrap());
    }

    #[tokio::test]
    async fn missing_persisted_record_blocks_skip() {
        let keys = ParamKeys::new("t");
        let store = MemoryParamStore::new();
        let spec = spec(json!(["$a"]));
        let results = results_with("a", true);

        assert!(!can_skip(&spec, &results, &store, &keys).await.unwrap());
    }

    #[tokio::test]
    async fn changed_inputs_block_skip() {
        let keys = ParamKeys::new("t");
        let store = seeded_store(&keys, "b", r#"["$a", "0x01"]"#);
        let spec = spec(json!(["$a", "0x02"]));
        let results = results_with("a", true);

        assert!(!can_skip(&spec, &results, &store, &keys).await.unwrap());
    }

    #[tokio::test]
    async fn input_length_mismatch_blocks_skip() {
        let keys = ParamKeys::new("t");
        let store = seeded_store(&keys, "b", r#"["$a", "0x01"]"#);
        let spec = spec(json!(["$a"]));
        let results = results_with("a", true);

        assert!(!can_skip(&spec, &results, &store, &keys).await.unwrap());
    }

    #[tokio::test]
    async fn store_read_failure_is_treated_as_not_cacheable() {
        let keys = ParamKeys::new("t");
        let store = seeded_store(&keys, "b", r#"["$a"]"#);
        store.set_fail_reads(true);
        let spec = spec(json!(["$a"]));
        let results = results_with("a", true);

        assert!(!can_skip(&spec, &results, &store, &keys).await.unwrap());
    }

    #[tokio::test]
    async fn pointer_to_unknown_step_is_fatal() {
        let keys = ParamKeys::new("t");
        let store = MemoryParamStore::new();
        let spec = spec(json!(["$ghost"]));

        let err = can_skip(&spec, &Results::new(), &store, &keys)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::OrchestratorError::UnresolvedReference(_)
        ));
    }
}
