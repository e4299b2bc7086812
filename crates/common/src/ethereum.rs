//! The chain RPC collaborator: the minimal JSON-RPC surface the deployment
//! executor needs, behind a trait so tests can substitute a fake node.

use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider},
    types::{Address, BlockNumber, Bytes, H256, U256},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc: {0}")]
    Rpc(String),
    #[error("invalid rpc url {0:?}: {1}")]
    Url(String, String),
}

/// The mined confirmation record for a broadcast transaction.
#[derive(Debug, Clone, Copy)]
pub struct TxConfirmation {
    pub contract_address: Option<Address>,
    pub gas_used: U256,
}

#[async_trait]
pub trait EthClient: Send + Sync {
    async fn transaction_count(&self, address: Address) -> Result<U256, ChainError>;

    /// Gas limit of the latest block.
    async fn latest_gas_limit(&self) -> Result<U256, ChainError>;

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, ChainError>;

    /// None until the transaction has been mined.
    async fn transaction_receipt(&self, tx: H256) -> Result<Option<TxConfirmation>, ChainError>;
}

pub struct HttpEthClient {
    provider: Provider<Http>,
}

impl HttpEthClient {
    pub fn connect(url: &str) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| ChainError::Url(url.to_string(), e.to_string()))?;
        Ok(HttpEthClient { provider })
    }
}

fn rpc_err(e: impl std::fmt::Display) -> ChainError {
    ChainError::Rpc(e.to_string())
}

#[async_trait]
impl EthClient for HttpEthClient {
    async fn transaction_count(&self, address: Address) -> Result<U256, ChainError> {
        self.provider
            .get_transaction_count(address, None)
            .await
            .map_err(rpc_err)
    }

    async fn latest_gas_limit(&self) -> Result<U256, ChainError> {
        let block = self
            .provider
            .get_block(BlockNumber::Latest)
            .await
            .map_err(rpc_err)?
            .ok_or_else(|| ChainError::Rpc("node returned no latest block".into()))?;
        Ok(block.gas_limit)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, ChainError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(rpc_err)?;
        Ok(*pending)
    }

    async fn transaction_receipt(&self, tx: H256) -> Result<Option<TxConfirmation>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx)
            .await
            .map_err(rpc_err)?;
        Ok(receipt.map(|r| TxConfirmation {
            contract_address: r.contract_address,
            gas_used: r.gas_used.unwrap_or_default(),
        }))
    }
}
