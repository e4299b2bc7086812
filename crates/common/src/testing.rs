//! In-memory fakes for the chain and parameter-store collaborators, shared
//! by unit and integration tests.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use ethers::{
    types::{Address, Bytes, Transaction, H256, U256},
    utils::{keccak256, rlp},
};

use crate::{
    ethereum::{ChainError, EthClient, TxConfirmation},
    params::{ParamStore, PutOptions, StoreError},
};

/// A `ParamStore` held entirely in memory, with switchable read failures for
/// exercising the conservative cache path.
#[derive(Default)]
pub struct MemoryParamStore {
    entries: Mutex<BTreeMap<String, String>>,
    fail_reads: AtomicBool,
}

impl MemoryParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All subsequent reads error until reset.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.lock().unwrap().clone()
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(StoreError::Other("injected read failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ParamStore for MemoryParamStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.check_reads()?;
        Ok(self.entries.lock().unwrap().contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_reads()?;
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str, opts: PutOptions) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        if !opts.overwrite && entries.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// A fake node: records every raw broadcast and mines each transaction
/// immediately, assigning contract addresses from a queue (or a
/// deterministic series when the queue is empty).
pub struct FakeChain {
    start_nonce: U256,
    gas_limit: U256,
    /// When set, no broadcast ever gets a receipt.
    never_confirm: bool,
    broadcasts: Mutex<Vec<Bytes>>,
    addresses: Mutex<VecDeque<Address>>,
    receipts: Mutex<HashMap<H256, TxConfirmation>>,
}

impl FakeChain {
    pub fn new(start_nonce: u64) -> Self {
        FakeChain {
            start_nonce: U256::from(start_nonce),
            gas_limit: U256::from(8_000_000u64),
            never_confirm: false,
            broadcasts: Mutex::new(Vec::new()),
            addresses: Mutex::new(VecDeque::new()),
            receipts: Mutex::new(HashMap::new()),
        }
    }

    pub fn never_confirming(mut self) -> Self {
        self.never_confirm = true;
        self
    }

    pub fn with_addresses(self, addrs: impl IntoIterator<Item = Address>) -> Self {
        self.addresses.lock().unwrap().extend(addrs);
        self
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().unwrap().len()
    }

    /// Nonces of every broadcast so far, decoded from the signed RLP.
    pub fn broadcast_nonces(&self) -> Vec<U256> {
        self.broadcasts
            .lock()
            .unwrap()
            .iter()
            .map(|raw| {
                let tx: Transaction = rlp::decode(raw).expect("fake chain got undecodable tx");
                tx.nonce
            })
            .collect()
    }

    fn next_address(&self) -> Address {
        let mut queue = self.addresses.lock().unwrap();
        queue.pop_front().unwrap_or_else(|| {
            let n = self.broadcasts.lock().unwrap().len() as u64;
            Address::from_low_u64_be(0xc0ffee00 + n)
        })
    }
}

#[async_trait]
impl EthClient for FakeChain {
    async fn transaction_count(&self, _address: Address) -> Result<U256, ChainError> {
        Ok(self.start_nonce)
    }

    async fn latest_gas_limit(&self) -> Result<U256, ChainError> {
        Ok(self.gas_limit)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, ChainError> {
        let hash = H256::from(keccak256(&raw));
        let address = self.next_address();
        self.broadcasts.lock().unwrap().push(raw);
        if !self.never_confirm {
            self.receipts.lock().unwrap().insert(
                hash,
                TxConfirmation {
                    contract_address: Some(address),
                    gas_used: U256::from(1_000_000u64),
                },
            );
        }
        Ok(hash)
    }

    async fn transaction_receipt(&self, tx: H256) -> Result<Option<TxConfirmation>, ChainError> {
        Ok(self.receipts.lock().unwrap().get(&tx).copied())
    }
}
