//! Builds, signs and broadcasts one contract-creation transaction, then
//! polls for its receipt under a hard timeout. The only blocking operation
//! in the pipeline.

use std::time::Duration;

use chaincode_common::{
    ethereum::{ChainError, EthClient},
    logger,
    wallets::Wallet,
};
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, TransactionRequest, U256,
};
use tokio::time::{sleep, Instant};

use crate::error::{OrchestratorError, Result};

pub const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(50);
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(120);

pub struct Deployer<'a> {
    pub chain: &'a dyn EthClient,
    pub wallet: &'a Wallet,
    pub chain_id: u64,
    pub confirm_timeout: Duration,
}

impl Deployer<'_> {
    /// Broadcast `bytecode` as a contract creation with the given nonce and
    /// wait for it to be mined. Returns the new contract's address and the
    /// gas it used.
    pub async fn deploy(&self, name: &str, bytecode: &str, nonce: U256) -> Result<(Address, U256)> {
        // 90% of the block gas limit, so the node cannot reject the tx for
        // exceeding the current block.
        let gas = self.chain.latest_gas_limit().await? * U256::from(9) / U256::from(10);

        let stripped = bytecode.strip_prefix("0x").unwrap_or(bytecode);
        let data =
            hex::decode(stripped).map_err(|e| OrchestratorError::InvalidBytecode(e.to_string()))?;

        let tx: TypedTransaction = TransactionRequest::new()
            .value(0u64)
            .gas(gas)
            .gas_price(1u64)
            .nonce(nonce)
            .chain_id(self.chain_id)
            .data(data)
            .into();
        let raw = self.wallet.sign_transaction(&tx)?;

        let tx_id = self.chain.send_raw_transaction(raw).await?;
        logger::info(format!("sent transaction for {name}; txid: {tx_id:#x}"));

        let started = Instant::now();
        let deadline = started + self.confirm_timeout;
        let confirmation = loop {
            if let Some(confirmation) = self.chain.transaction_receipt(tx_id).await? {
                break confirmation;
            }
            if Instant::now() >= deadline {
                return Err(OrchestratorError::ConfirmationTimeout {
                    name: name.to_string(),
                    tx: tx_id,
                    timeout_secs: self.confirm_timeout.as_secs(),
                });
            }
            sleep(CONFIRM_POLL_INTERVAL).await;
        };

        let address = confirmation.contract_address.ok_or_else(|| {
            ChainError::Rpc(format!("receipt for {tx_id:#x} carries no contract address"))
        })?;
        logger::info(format!(
            "confirmed {name} at {address:#x} after {:?} (gas used: {})",
            started.elapsed(),
            confirmation.gas_used
        ));
        Ok((address, confirmation.gas_used))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincode_common::testing::FakeChain;
    use ethers::types::H256;

    fn wallet() -> Wallet {
        let pk: H256 = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            .parse()
            .unwrap();
        Wallet::from_private_key(pk, 1337).unwrap()
    }

    #[tokio::test]
    async fn deploys_and_returns_receipt_fields() {
        let expected = Address::from_low_u64_be(0xbeef);
        let chain = FakeChain::new(0).with_addresses([expected]);
        let wallet = wallet();
        let deployer = Deployer {
            chain: &chain,
            wallet: &wallet,
            chain_id: 1337,
            confirm_timeout: Duration::from_secs(1),
        };

        let (address, gas_used) = deployer.deploy("a", "0x6080", U256::zero()).await.unwrap();
        assert_eq!(address, expected);
        assert_eq!(gas_used, U256::from(1_000_000u64));
        assert_eq!(chain.broadcast_count(), 1);
        assert_eq!(chain.broadcast_nonces(), vec![U256::zero()]);
    }

    #[tokio::test]
    async fn missing_receipt_times_out() {
        let chain = FakeChain::new(0).never_confirming();
        let wallet = wallet();
        let deployer = Deployer {
            chain: &chain,
            wallet: &wallet,
            chain_id: 1337,
            confirm_timeout: Duration::from_millis(150),
        };

        let started = std::time::Instant::now();
        let err = deployer.deploy("a", "0x6080", U256::zero()).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ConfirmationTimeout { .. }));
        // One broadcast went out, then polling ran the clock down.
        assert_eq!(chain.broadcast_count(), 1);
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn invalid_bytecode_is_rejected_before_broadcast() {
        let chain = FakeChain::new(0);
        let wallet = wallet();
        let deployer = Deployer {
            chain: &chain,
            wallet: &wallet,
            chain_id: 1337,
            confirm_timeout: Duration::from_secs(1),
        };

        let err = deployer.deploy("a", "0xzz", U256::zero()).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidBytecode(_)));
        assert_eq!(chain.broadcast_count(), 0);
    }
}
