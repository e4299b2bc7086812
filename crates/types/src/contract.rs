use std::fmt;

use ethers::types::{Address, U256};

use crate::InputSpec;

/// The outcome of one plan step: the contract's on-chain address, plus the
/// exact inputs it was deployed with so later runs can compare them.
#[derive(Debug, Clone)]
pub struct ResolvedContract {
    pub name: String,
    /// Final linked bytecode. Empty when the result was served from cache.
    pub bytecode: String,
    pub address: Address,
    pub inputs: Vec<InputSpec>,
    pub gas_used: Option<U256>,
    /// True iff this result came from the persisted store rather than a
    /// fresh broadcast.
    pub cached: bool,
}

impl ResolvedContract {
    pub fn from_cache(name: &str, address: Address, inputs: Vec<InputSpec>) -> Self {
        ResolvedContract {
            name: name.to_string(),
            bytecode: String::new(),
            address,
            inputs,
            gas_used: None,
            cached: true,
        }
    }

    pub fn deployed(
        name: &str,
        bytecode: String,
        address: Address,
        inputs: Vec<InputSpec>,
        gas_used: U256,
    ) -> Self {
        ResolvedContract {
            name: name.to_string(),
            bytecode,
            address,
            inputs,
            gas_used: Some(gas_used),
            cached: false,
        }
    }
}

impl fmt::Display for ResolvedContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Contract({}): [Addr:{:#x}{}]>",
            self.name,
            self.address,
            if self.cached { ", cached" } else { "" }
        )
    }
}
