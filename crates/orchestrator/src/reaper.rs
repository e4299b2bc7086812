//! Deletion of persisted results for contracts no longer in the plan.

use std::collections::BTreeSet;

use chaincode_common::{
    logger,
    params::{ParamKeys, ParamStore},
};

use crate::error::Result;

/// Delete every persisted address/inputs record whose contract is not in
/// `keep_names`. Returns how many keys were deleted.
pub async fn reap_stale<'a>(
    store: &dyn ParamStore,
    keys: &ParamKeys,
    keep_names: impl IntoIterator<Item = &'a str>,
) -> Result<usize> {
    let mut keep = BTreeSet::new();
    for name in keep_names {
        keep.insert(keys.sc_addr(name));
        keep.insert(keys.sc_inputs(name));
    }

    let mut listed = store.list_by_prefix(&keys.sc_addr_prefix()).await?;
    listed.extend(store.list_by_prefix(&keys.sc_inputs_prefix()).await?);

    let mut deleted = 0;
    for key in listed {
        if keep.contains(&key) {
            logger::debug(format!("keeping {key}"));
        } else {
            logger::info(format!("deleting stale parameter {key}"));
            store.delete(&key).await?;
            deleted += 1;
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincode_common::testing::MemoryParamStore;

    fn seeded(keys: &ParamKeys, names: &[&str]) -> MemoryParamStore {
        let store = MemoryParamStore::new();
        for name in names {
            store.insert(&keys.sc_addr(name), "0x01");
            store.insert(&keys.sc_inputs(name), "[]");
        }
        store
    }

    #[tokio::test]
    async fn deletes_only_contracts_dropped_from_the_plan() {
        let keys = ParamKeys::new("t");
        let store = seeded(&keys, &["a", "b", "c"]);

        let deleted = reap_stale(&store, &keys, ["a", "b"]).await.unwrap();
        assert_eq!(deleted, 2);

        let snapshot = store.snapshot();
        assert!(snapshot.contains_key(&keys.sc_addr("a")));
        assert!(snapshot.contains_key(&keys.sc_inputs("b")));
        assert!(!snapshot.contains_key(&keys.sc_addr("c")));
        assert!(!snapshot.contains_key(&keys.sc_inputs("c")));
    }

    #[tokio::test]
    async fn empty_keep_set_clears_everything() {
        let keys = ParamKeys::new("t");
        let store = seeded(&keys, &["a", "b"]);

        let deleted = reap_stale(&store, &keys, []).await.unwrap();
        assert_eq!(deleted, 4);
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn leaves_unrelated_keys_alone() {
        let keys = ParamKeys::new("t");
        let store = seeded(&keys, &["a"]);
        store.insert("sv-t-nodekey-service-members", "secret");

        reap_stale(&store, &keys, []).await.unwrap();
        assert!(store.snapshot().contains_key("sv-t-nodekey-service-members"));
    }
}
