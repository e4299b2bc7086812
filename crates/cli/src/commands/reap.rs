use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use chaincode_common::{
    logger,
    params::{FileParamStore, ParamKeys},
};
use chaincode_orchestrator::reaper::reap_stale;

use super::{default_params_file, read_plan};

#[derive(Debug, Parser)]
pub struct ReapArgs {
    /// Plan whose contracts should be kept; omit to delete everything
    /// persisted under the prefix
    #[clap(long)]
    pub plan: Option<PathBuf>,

    /// Deployment name prefix; namespaces every persisted parameter
    #[clap(long)]
    pub name_prefix: String,

    /// Where deployment results persist between runs
    #[clap(long)]
    pub params_file: Option<PathBuf>,
}

pub async fn run(args: ReapArgs) -> anyhow::Result<()> {
    let keep_names: Vec<String> = match &args.plan {
        Some(path) => read_plan(path)?.names().map(str::to_string).collect(),
        None => Vec::new(),
    };

    let params_path = args.params_file.clone().unwrap_or_else(default_params_file);
    let store = FileParamStore::open(&params_path)
        .with_context(|| format!("opening parameter store at {}", params_path.display()))?;
    let keys = ParamKeys::new(&args.name_prefix);

    let deleted = reap_stale(&store, &keys, keep_names.iter().map(String::as_str)).await?;
    logger::outro(format!("reaped {deleted} stale parameter(s)"));
    Ok(())
}
