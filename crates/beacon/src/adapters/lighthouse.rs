//! Legacy Lighthouse REST dialect: unversioned paths and plain JSON integers.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{get_json, parse_pubkey};
use crate::{
    aggregator::try_join2,
    dispatcher::{post, HttpDispatcher, RequestDispatcher},
    error::{BeaconClientError, DecodeError},
    normalize::{decode_fixed_hex, parse_decimal_bytes},
    traits::BeaconClientTrait,
    types::{BlsPublicKeyBytes, ChainConfig, HeadState, ValidatorStatus},
};

const REQUEST_ETH2_CONFIG_PATH: &str = "/spec";
const REQUEST_SLOTS_PER_EPOCH_PATH: &str = "/spec/slots_per_epoch";
const REQUEST_BEACON_HEAD_PATH: &str = "/beacon/head";
const REQUEST_VALIDATORS_PATH: &str = "/beacon/validators";

const QUERY_ETH2_CONFIG: &str = "eth2 config";
const QUERY_SLOTS_PER_EPOCH: &str = "slots per epoch";
const QUERY_BEACON_HEAD: &str = "beacon head";
const QUERY_VALIDATOR_STATUS: &str = "validator status";

#[derive(Serialize, Debug)]
struct ValidatorsRequest {
    pubkeys: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct Eth2ConfigResponse {
    genesis_fork_version: String,
    bls_withdrawal_prefix_byte: String,
    domain_beacon_proposer: u64,
    domain_beacon_attester: u64,
    domain_randao: u64,
    domain_deposit: u64,
    domain_voluntary_exit: u64,
}

impl Eth2ConfigResponse {
    fn into_chain_config(self, slots_per_epoch: u64) -> Result<ChainConfig, DecodeError> {
        ChainConfig {
            genesis_fork_version: decode_fixed_hex("genesis_fork_version", &self.genesis_fork_version)?,
            bls_withdrawal_prefix_byte: decode_fixed_hex(
                "bls_withdrawal_prefix_byte",
                &self.bls_withdrawal_prefix_byte,
            )?,
            domain_beacon_proposer: self.domain_beacon_proposer,
            domain_beacon_attester: self.domain_beacon_attester,
            domain_randao: self.domain_randao,
            domain_deposit: self.domain_deposit,
            domain_voluntary_exit: self.domain_voluntary_exit,
            slots_per_epoch,
        }
        .validate()
    }
}

#[derive(Deserialize, Debug)]
struct BeaconHeadResponse {
    slot: u64,
    finalized_slot: u64,
    justified_slot: u64,
}

#[derive(Deserialize, Debug)]
struct ValidatorResponse {
    #[serde(default)]
    pubkey: String,
    /// `null` when the node has no record of the key.
    #[serde(default)]
    validator: Option<ValidatorRecord>,
}

#[derive(Deserialize, Debug)]
struct ValidatorRecord {
    withdrawal_credentials: String,
    effective_balance: u64,
    slashed: bool,
    activation_eligibility_epoch: u64,
    activation_epoch: u64,
    exit_epoch: u64,
    withdrawable_epoch: u64,
}

impl ValidatorResponse {
    fn into_status(self, requested: BlsPublicKeyBytes) -> Result<ValidatorStatus, DecodeError> {
        let pubkey = if self.pubkey.is_empty() {
            requested
        } else {
            decode_fixed_hex("pubkey", &self.pubkey)?
        };

        let Some(validator) = self.validator else {
            return Ok(ValidatorStatus::missing(pubkey));
        };

        Ok(ValidatorStatus {
            pubkey,
            withdrawal_credentials: decode_fixed_hex(
                "withdrawal_credentials",
                &validator.withdrawal_credentials,
            )?,
            effective_balance: validator.effective_balance,
            slashed: validator.slashed,
            activation_eligibility_epoch: validator.activation_eligibility_epoch,
            activation_epoch: validator.activation_epoch,
            exit_epoch: validator.exit_epoch,
            withdrawable_epoch: validator.withdrawable_epoch,
            exists: ValidatorStatus::exists_from_activation_epoch(validator.activation_epoch),
        })
    }
}

#[derive(Clone, Debug)]
pub struct LighthouseClient<D = HttpDispatcher> {
    dispatcher: Arc<D>,
    aggregate_timeout: Option<Duration>,
}

impl<D: RequestDispatcher + 'static> LighthouseClient<D> {
    pub fn new(dispatcher: D, aggregate_timeout: Option<Duration>) -> Self {
        Self { dispatcher: Arc::new(dispatcher), aggregate_timeout }
    }

    async fn fetch_eth2_config(dispatcher: Arc<D>) -> Result<Eth2ConfigResponse, BeaconClientError> {
        get_json(dispatcher.as_ref(), REQUEST_ETH2_CONFIG_PATH, QUERY_ETH2_CONFIG).await
    }

    async fn fetch_slots_per_epoch(dispatcher: Arc<D>) -> Result<u64, BeaconClientError> {
        let body = dispatcher
            .get(REQUEST_SLOTS_PER_EPOCH_PATH)
            .await
            .map_err(|err| BeaconClientError::transport(QUERY_SLOTS_PER_EPOCH, err))?;
        parse_decimal_bytes("slots_per_epoch", &body)
            .map_err(|err| BeaconClientError::decode(QUERY_SLOTS_PER_EPOCH, err))
    }

    async fn fetch_beacon_head(dispatcher: Arc<D>) -> Result<BeaconHeadResponse, BeaconClientError> {
        get_json(dispatcher.as_ref(), REQUEST_BEACON_HEAD_PATH, QUERY_BEACON_HEAD).await
    }
}

#[async_trait]
impl<D: RequestDispatcher + 'static> BeaconClientTrait for LighthouseClient<D> {
    async fn get_chain_config(&self) -> Result<ChainConfig, BeaconClientError> {
        let (config, slots_per_epoch) = try_join2(
            QUERY_ETH2_CONFIG,
            self.aggregate_timeout,
            Self::fetch_eth2_config(self.dispatcher.clone()),
            Self::fetch_slots_per_epoch(self.dispatcher.clone()),
        )
        .await?;

        config
            .into_chain_config(slots_per_epoch)
            .map_err(|err| BeaconClientError::decode(QUERY_ETH2_CONFIG, err))
    }

    async fn get_head_state(&self) -> Result<HeadState, BeaconClientError> {
        let (head, slots_per_epoch) = try_join2(
            QUERY_BEACON_HEAD,
            self.aggregate_timeout,
            Self::fetch_beacon_head(self.dispatcher.clone()),
            Self::fetch_slots_per_epoch(self.dispatcher.clone()),
        )
        .await?;

        HeadState::from_slots(head.slot, head.finalized_slot, head.justified_slot, slots_per_epoch)
            .map_err(|err| BeaconClientError::decode(QUERY_SLOTS_PER_EPOCH, err))
    }

    async fn get_validator_status(
        &self,
        pubkey: &str,
    ) -> Result<ValidatorStatus, BeaconClientError> {
        let requested = parse_pubkey(pubkey)?;
        let request = ValidatorsRequest { pubkeys: vec![requested.to_string()] };

        let body = post(self.dispatcher.as_ref(), REQUEST_VALIDATORS_PATH, &request)
            .await
            .map_err(|err| BeaconClientError::transport(QUERY_VALIDATOR_STATUS, err))?;
        let validators: Vec<ValidatorResponse> = serde_json::from_slice(&body)
            .map_err(|err| BeaconClientError::decode(QUERY_VALIDATOR_STATUS, err))?;

        let Some(validator) = validators.into_iter().next() else {
            debug!(pubkey = %requested, "no validator record returned");
            return Ok(ValidatorStatus::missing(requested));
        };

        validator
            .into_status(requested)
            .map_err(|err| BeaconClientError::decode(QUERY_VALIDATOR_STATUS, err))
    }

    fn get_uri(&self) -> String {
        self.dispatcher.provider_url().to_string()
    }
}
