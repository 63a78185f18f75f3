//! Standard Beacon API dialect: `/eth/v1` paths, `data` envelopes and quoted integers.

use std::{collections::HashMap, sync::Arc, time::Duration};

use alloy_primitives::B256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{get_json, parse_pubkey};
use crate::{
    aggregator::{try_join2, try_join3},
    dispatcher::{HttpDispatcher, RequestDispatcher},
    error::{BeaconClientError, DecodeError},
    normalize::{decode_fixed_hex, domain_type_to_u64, epoch_at_slot, parse_decimal},
    traits::BeaconClientTrait,
    types::{BeaconResponse, BlsPublicKeyBytes, ChainConfig, HeadState, StateId, ValidatorStatus},
};

const REQUEST_CONFIG_SPEC_PATH: &str = "/eth/v1/config/spec";
const REQUEST_GENESIS_PATH: &str = "/eth/v1/beacon/genesis";
const REQUEST_HEADER_PATH: &str = "/eth/v1/beacon/headers/head";

const QUERY_ETH2_CONFIG: &str = "eth2 config";
const QUERY_GENESIS: &str = "genesis";
const QUERY_SLOTS_PER_EPOCH: &str = "slots per epoch";
const QUERY_BEACON_HEAD: &str = "beacon head";
const QUERY_FINALITY_CHECKPOINTS: &str = "finality checkpoints";
const QUERY_VALIDATOR_STATUS: &str = "validator status";

fn finality_checkpoints_path(state_id: &StateId) -> String {
    format!("/eth/v1/beacon/states/{state_id}/finality_checkpoints")
}

fn validators_path(state_id: &StateId, pubkey: &BlsPublicKeyBytes) -> String {
    format!("/eth/v1/beacon/states/{state_id}/validators?id={pubkey}")
}

/// `/eth/v1/config/spec` mixes string, numeric and nested values depending on the client.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(transparent)]
struct ConfigSpec(HashMap<String, serde_json::Value>);

impl ConfigSpec {
    fn string(&self, key: &'static str) -> Result<String, DecodeError> {
        match self.0.get(key) {
            Some(serde_json::Value::String(value)) => Ok(value.clone()),
            Some(serde_json::Value::Number(value)) => Ok(value.to_string()),
            Some(other) => {
                Err(DecodeError::Invalid { field: key, reason: format!("unexpected value {other}") })
            }
            None => Err(DecodeError::MissingField(key)),
        }
    }

    fn slots_per_epoch(&self) -> Result<u64, DecodeError> {
        parse_decimal("SLOTS_PER_EPOCH", &self.string("SLOTS_PER_EPOCH")?)
    }

    fn domain(&self, key: &'static str) -> Result<u64, DecodeError> {
        domain_type_to_u64(key, &self.string(key)?)
    }

    fn into_chain_config(self, genesis: Genesis) -> Result<ChainConfig, DecodeError> {
        ChainConfig {
            genesis_fork_version: decode_fixed_hex(
                "genesis_fork_version",
                &genesis.genesis_fork_version,
            )?,
            bls_withdrawal_prefix_byte: decode_fixed_hex(
                "BLS_WITHDRAWAL_PREFIX",
                &self.string("BLS_WITHDRAWAL_PREFIX")?,
            )?,
            domain_beacon_proposer: self.domain("DOMAIN_BEACON_PROPOSER")?,
            domain_beacon_attester: self.domain("DOMAIN_BEACON_ATTESTER")?,
            domain_randao: self.domain("DOMAIN_RANDAO")?,
            domain_deposit: self.domain("DOMAIN_DEPOSIT")?,
            domain_voluntary_exit: self.domain("DOMAIN_VOLUNTARY_EXIT")?,
            slots_per_epoch: self.slots_per_epoch()?,
        }
        .validate()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Genesis {
    genesis_fork_version: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct HeaderData {
    header: SignedHeader,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct SignedHeader {
    message: HeaderMessage,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct HeaderMessage {
    #[serde(with = "serde_utils::quoted_u64")]
    slot: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Checkpoint {
    #[serde(with = "serde_utils::quoted_u64")]
    epoch: u64,
    root: B256,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct FinalityCheckpoints {
    previous_justified: Checkpoint,
    current_justified: Checkpoint,
    finalized: Checkpoint,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ValidatorData {
    validator: ValidatorRecord,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ValidatorRecord {
    pubkey: String,
    withdrawal_credentials: String,
    #[serde(with = "serde_utils::quoted_u64")]
    effective_balance: u64,
    slashed: bool,
    #[serde(with = "serde_utils::quoted_u64")]
    activation_eligibility_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    activation_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    exit_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    withdrawable_epoch: u64,
}

impl ValidatorRecord {
    fn into_status(self) -> Result<ValidatorStatus, DecodeError> {
        Ok(ValidatorStatus {
            pubkey: decode_fixed_hex("pubkey", &self.pubkey)?,
            withdrawal_credentials: decode_fixed_hex(
                "withdrawal_credentials",
                &self.withdrawal_credentials,
            )?,
            effective_balance: self.effective_balance,
            slashed: self.slashed,
            activation_eligibility_epoch: self.activation_eligibility_epoch,
            activation_epoch: self.activation_epoch,
            exit_epoch: self.exit_epoch,
            withdrawable_epoch: self.withdrawable_epoch,
            exists: ValidatorStatus::exists_from_activation_epoch(self.activation_epoch),
        })
    }
}

#[derive(Clone, Debug)]
pub struct StandardClient<D = HttpDispatcher> {
    dispatcher: Arc<D>,
    aggregate_timeout: Option<Duration>,
}

impl<D: RequestDispatcher + 'static> StandardClient<D> {
    pub fn new(dispatcher: D, aggregate_timeout: Option<Duration>) -> Self {
        Self { dispatcher: Arc::new(dispatcher), aggregate_timeout }
    }

    async fn fetch_config_spec(dispatcher: Arc<D>) -> Result<ConfigSpec, BeaconClientError> {
        let response: BeaconResponse<ConfigSpec> =
            get_json(dispatcher.as_ref(), REQUEST_CONFIG_SPEC_PATH, QUERY_ETH2_CONFIG).await?;
        Ok(response.data)
    }

    async fn fetch_genesis(dispatcher: Arc<D>) -> Result<Genesis, BeaconClientError> {
        let response: BeaconResponse<Genesis> =
            get_json(dispatcher.as_ref(), REQUEST_GENESIS_PATH, QUERY_GENESIS).await?;
        Ok(response.data)
    }

    async fn fetch_slots_per_epoch(dispatcher: Arc<D>) -> Result<u64, BeaconClientError> {
        let response: BeaconResponse<ConfigSpec> =
            get_json(dispatcher.as_ref(), REQUEST_CONFIG_SPEC_PATH, QUERY_SLOTS_PER_EPOCH).await?;
        response
            .data
            .slots_per_epoch()
            .map_err(|err| BeaconClientError::decode(QUERY_SLOTS_PER_EPOCH, err))
    }

    async fn fetch_head_slot(dispatcher: Arc<D>) -> Result<u64, BeaconClientError> {
        let response: BeaconResponse<HeaderData> =
            get_json(dispatcher.as_ref(), REQUEST_HEADER_PATH, QUERY_BEACON_HEAD).await?;
        Ok(response.data.header.message.slot)
    }

    async fn fetch_finality_checkpoints(
        dispatcher: Arc<D>,
    ) -> Result<FinalityCheckpoints, BeaconClientError> {
        let path = finality_checkpoints_path(&StateId::Head);
        let response: BeaconResponse<FinalityCheckpoints> =
            get_json(dispatcher.as_ref(), &path, QUERY_FINALITY_CHECKPOINTS).await?;
        Ok(response.data)
    }
}

#[async_trait]
impl<D: RequestDispatcher + 'static> BeaconClientTrait for StandardClient<D> {
    async fn get_chain_config(&self) -> Result<ChainConfig, BeaconClientError> {
        let (spec, genesis) = try_join2(
            QUERY_ETH2_CONFIG,
            self.aggregate_timeout,
            Self::fetch_config_spec(self.dispatcher.clone()),
            Self::fetch_genesis(self.dispatcher.clone()),
        )
        .await?;

        spec.into_chain_config(genesis)
            .map_err(|err| BeaconClientError::decode(QUERY_ETH2_CONFIG, err))
    }

    async fn get_head_state(&self) -> Result<HeadState, BeaconClientError> {
        let (slot, checkpoints, slots_per_epoch) = try_join3(
            QUERY_BEACON_HEAD,
            self.aggregate_timeout,
            Self::fetch_head_slot(self.dispatcher.clone()),
            Self::fetch_finality_checkpoints(self.dispatcher.clone()),
            Self::fetch_slots_per_epoch(self.dispatcher.clone()),
        )
        .await?;

        if slots_per_epoch == 0 {
            return Err(BeaconClientError::decode(
                QUERY_SLOTS_PER_EPOCH,
                DecodeError::Invalid {
                    field: "SLOTS_PER_EPOCH",
                    reason: "must be greater than zero".to_string(),
                },
            ));
        }

        Ok(HeadState::from_epochs(
            epoch_at_slot(slot, slots_per_epoch),
            checkpoints.finalized.epoch,
            checkpoints.current_justified.epoch,
        ))
    }

    async fn get_validator_status(
        &self,
        pubkey: &str,
    ) -> Result<ValidatorStatus, BeaconClientError> {
        let requested = parse_pubkey(pubkey)?;
        let path = validators_path(&StateId::Head, &requested);

        let response: BeaconResponse<Vec<ValidatorData>> =
            get_json(self.dispatcher.as_ref(), &path, QUERY_VALIDATOR_STATUS).await?;

        let Some(data) = response.data.into_iter().next() else {
            debug!(pubkey = %requested, "no validator record returned");
            return Ok(ValidatorStatus::missing(requested));
        };

        data.validator
            .into_status()
            .map_err(|err| BeaconClientError::decode(QUERY_VALIDATOR_STATUS, err))
    }

    fn get_uri(&self) -> String {
        self.dispatcher.provider_url().to_string()
    }
}
