use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ethers::types::H256;

use chaincode_common::{
    bytecode::DirBytecodeSource,
    ethereum::HttpEthClient,
    logger,
    params::{FileParamStore, ParamKeys},
    wallets::Wallet,
};
use chaincode_orchestrator::{deploy::DEFAULT_CONFIRM_TIMEOUT, handle, Sequencer};
use chaincode_types::RequestType;

use super::{default_params_file, read_plan};

#[derive(Debug, Parser)]
pub struct DeployArgs {
    /// JSON deployment plan: an ordered array of step objects
    #[clap(long)]
    pub plan: PathBuf,

    /// Deployment name prefix; namespaces every persisted parameter
    #[clap(long)]
    pub name_prefix: String,

    #[clap(long, help = "Node RPC URL", default_value = "http://localhost:8545")]
    pub rpc_url: String,

    #[clap(long)]
    pub chain_id: u64,

    /// Private key for the deploying account
    #[clap(long)]
    pub private_key: H256,

    /// Directory holding one {name}.bin artifact per contract
    #[clap(long, default_value = "bytecode")]
    pub bytecode_dir: PathBuf,

    /// Where deployment results persist between runs
    #[clap(long)]
    pub params_file: Option<PathBuf>,

    /// Lifecycle event: create, update or delete
    #[clap(long, default_value = "create")]
    pub request_type: RequestType,
}

pub async fn run(args: DeployArgs) -> anyhow::Result<()> {
    let plan = read_plan(&args.plan)?;

    let params_path = args.params_file.clone().unwrap_or_else(default_params_file);
    let store = FileParamStore::open(&params_path)
        .with_context(|| format!("opening parameter store at {}", params_path.display()))?;
    let keys = ParamKeys::new(&args.name_prefix);
    let chain = HttpEthClient::connect(&args.rpc_url)?;
    let wallet = Wallet::from_private_key(args.private_key, args.chain_id)
        .context("invalid private key")?;
    let bytecode = DirBytecodeSource::new(&args.bytecode_dir);

    let sequencer = Sequencer {
        chain: &chain,
        store: &store,
        keys: &keys,
        bytecode: &bytecode,
        wallet: &wallet,
        chain_id: args.chain_id,
        confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
    };

    logger::info(format!(
        "running {} with {} step(s) as {:#x}",
        args.request_type,
        plan.len(),
        wallet.address()
    ));
    let response = handle(args.request_type, &plan, &sequencer).await?;

    logger::new_empty_line();
    for (key, addr) in &response.data {
        logger::info(format!("{key}: {addr}"));
    }
    logger::outro(format!(
        "{} complete ({})",
        args.request_type, response.physical_id
    ));
    Ok(())
}
