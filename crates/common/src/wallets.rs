use ethers::{
    signers::{LocalWallet, Signer, WalletError},
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, H256},
};

/// The deploying account: a local private key able to sign transactions for
/// one chain id.
#[derive(Debug, Clone)]
pub struct Wallet {
    signer: LocalWallet,
}

impl Wallet {
    pub fn from_private_key(private_key: H256, chain_id: u64) -> Result<Self, WalletError> {
        let signer = LocalWallet::from_bytes(private_key.as_bytes())?.with_chain_id(chain_id);
        Ok(Wallet { signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.signer.chain_id()
    }

    /// Sign and RLP-encode a transaction, ready for `sendRawTransaction`.
    pub fn sign_transaction(&self, tx: &TypedTransaction) -> Result<Bytes, WalletError> {
        let signature = self.signer.sign_transaction_sync(tx)?;
        Ok(tx.rlp_signed(&signature))
    }
}
