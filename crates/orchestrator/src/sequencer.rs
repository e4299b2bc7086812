//! The strictly sequential fold over a validated plan. Owns the nonce
//! counter and the accumulating result map for the duration of one run;
//! nothing else writes them.

use std::time::Duration;

use chaincode_common::{
    bytecode::BytecodeSource,
    ethereum::EthClient,
    logger,
    params::{ParamKeys, ParamStore, PutOptions, StoreError},
    wallets::Wallet,
};
use chaincode_types::{ContractSpec, DeploymentPlan, InputSpec, ResolvedContract, StepType};
use ethers::types::{Address, U256};

use crate::{
    cache,
    deploy::Deployer,
    error::{OrchestratorError, Result},
    link::link,
    resolve::Results,
    validate::validate,
};

pub struct Sequencer<'a> {
    pub chain: &'a dyn EthClient,
    pub store: &'a dyn ParamStore,
    pub keys: &'a ParamKeys,
    pub bytecode: &'a dyn BytecodeSource,
    pub wallet: &'a Wallet,
    pub chain_id: u64,
    pub confirm_timeout: Duration,
}

impl Sequencer<'_> {
    /// Run the whole plan left to right. Later steps may reference earlier
    /// steps' addresses and nonces must increase per broadcast, so there is
    /// no parallelism here by design.
    pub async fn run(&self, plan: &DeploymentPlan) -> Result<Results> {
        validate(plan)?;

        let mut results = Results::new();
        let mut nonce = self.chain.transaction_count(self.wallet.address()).await?;

        for spec in plan.steps() {
            logger::info(format!("processing {}", spec.name));
            let contract = match spec.step_type {
                StepType::Deploy => self.deploy_step(spec, &results, &mut nonce).await?,
            };
            results.insert(spec.name.clone(), contract);
        }
        Ok(results)
    }

    async fn deploy_step(
        &self,
        spec: &ContractSpec,
        results: &Results,
        nonce: &mut U256,
    ) -> Result<ResolvedContract> {
        if cache::can_skip(spec, results, self.store, self.keys).await? {
            if let Some(cached) = self.load_cached(spec).await {
                logger::info(format!(
                    "skipping deploy of {}: cached and relies only on cached contracts",
                    spec.name
                ));
                return Ok(cached);
            }
            // The cached record vanished or went bad between the check and
            // the read; fall through and redeploy.
        }
        logger::info(format!("deploying {}: not cached", spec.name));

        if spec.url.is_some() {
            return Err(OrchestratorError::Unsupported(
                "remote bytecode deploys are not supported".into(),
            ));
        }
        let raw_bytecode = self.bytecode.load(&spec.name)?;
        let bytecode = link(&raw_bytecode, spec, self.wallet.address(), results, None)?;
        logger::debug(format!(
            "processed bytecode for {}; lengths: raw({}), linked({})",
            spec.name,
            raw_bytecode.len(),
            bytecode.len()
        ));

        let deployer = Deployer {
            chain: self.chain,
            wallet: self.wallet,
            chain_id: self.chain_id,
            confirm_timeout: self.confirm_timeout,
        };
        let (address, gas_used) = deployer.deploy(&spec.name, &bytecode, *nonce).await?;

        // Persisted only after the deploy confirmed, so a run that dies
        // partway is resumable from cache.
        self.persist(spec, address).await?;
        *nonce += U256::one();

        Ok(ResolvedContract::deployed(
            &spec.name,
            bytecode,
            address,
            spec.inputs.clone(),
            gas_used,
        ))
    }

    async fn persist(&self, spec: &ContractSpec, address: Address) -> Result<()> {
        let inputs_key = self.keys.sc_inputs(&spec.name);
        let inputs_json = serde_json::to_string(&spec.inputs)
            .map_err(|e| StoreError::Json(inputs_key.clone(), e))?;

        self.store
            .put(
                &self.keys.sc_addr(&spec.name),
                &format!("{address:#x}"),
                PutOptions::overwrite(),
            )
            .await?;
        self.store
            .put(&inputs_key, &inputs_json, PutOptions::overwrite())
            .await?;
        Ok(())
    }

    async fn load_cached(&self, spec: &ContractSpec) -> Option<ResolvedContract> {
        let raw_addr = self.store.get(&self.keys.sc_addr(&spec.name)).await.ok()??;
        let address: Address = raw_addr.parse().ok()?;
        let inputs_json = self
            .store
            .get_json(&self.keys.sc_inputs(&spec.name))
            .await
            .ok()??;
        let inputs: Vec<InputSpec> = serde_json::from_value(inputs_json).ok()?;
        Some(ResolvedContract::from_cache(&spec.name, address, inputs))
    }
}
