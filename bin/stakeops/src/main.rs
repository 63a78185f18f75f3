use std::sync::Arc;

use eyre::eyre;
use futures::future::join_all;
use stakeops_beacon::{build_beacon_client, BeaconClientTrait};
use stakeops_common::{
    load_config,
    utils::{init_panic_hook, init_tracing_log},
    StakeopsConfig,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = load_config();
    let _guard = init_tracing_log(&config.logging);
    init_panic_hook();

    info!(
        beacon = %config.beacon_client.url,
        kind = %config.beacon_client.kind,
        validators = config.validators.len(),
        "starting stakeops"
    );

    match run(config).await {
        Ok(_) => info!("stakeops exited"),
        Err(err) => {
            error!(%err, "stakeops exited with error");
            std::process::exit(1);
        }
    }
}

async fn run(config: StakeopsConfig) -> eyre::Result<()> {
    let client = build_beacon_client(&config.beacon_client)?;

    let chain_config = client.get_chain_config().await?;
    info!(
        genesis_fork_version = %chain_config.genesis_fork_version,
        slots_per_epoch = chain_config.slots_per_epoch,
        "chain config"
    );

    let head = client.get_head_state().await?;
    info!(
        epoch = head.epoch,
        justified_epoch = head.justified_epoch,
        finalized_epoch = head.finalized_epoch,
        "beacon head"
    );
    if !head.is_ordered() {
        warn!("beacon node reported checkpoints ahead of the head epoch");
    }

    let failures = report_validators(client, &config.validators, head.epoch).await;
    if failures > 0 {
        return Err(eyre!("{failures} of {} validator queries failed", config.validators.len()));
    }

    Ok(())
}

/// Logs every validator's status, returns the number of failed queries.
async fn report_validators(
    client: Arc<dyn BeaconClientTrait>,
    validators: &[String],
    epoch: u64,
) -> usize {
    let statuses =
        join_all(validators.iter().map(|pubkey| client.get_validator_status(pubkey))).await;

    let mut failures = 0;
    for (pubkey, status) in validators.iter().zip(statuses) {
        match status {
            Ok(status) if status.exists => info!(
                pubkey = %status.pubkey,
                active = status.is_active_at(epoch),
                exited = status.has_exited_at(epoch),
                slashed = status.slashed,
                effective_balance = status.effective_balance,
                activation_epoch = status.activation_epoch,
                "validator"
            ),
            Ok(status) => warn!(pubkey = %status.pubkey, "validator not found"),
            Err(err) => {
                failures += 1;
                error!(pubkey, %err, "failed to query validator");
            }
        }
    }
    failures
}
