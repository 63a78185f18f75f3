use std::collections::HashMap;

use alloy_primitives::FixedBytes;
use async_trait::async_trait;

use crate::{
    adapters::parse_pubkey,
    error::BeaconClientError,
    traits::BeaconClientTrait,
    types::{BlsPublicKeyBytes, ChainConfig, HeadState, ValidatorStatus},
};

#[derive(Clone)]
pub struct MockBeaconClient {
    chain_config: ChainConfig,
    head_state: HeadState,
    validators: HashMap<BlsPublicKeyBytes, ValidatorStatus>,
}

impl MockBeaconClient {
    pub fn new() -> Self {
        Self {
            chain_config: ChainConfig {
                genesis_fork_version: FixedBytes([0, 0, 0, 0]),
                bls_withdrawal_prefix_byte: FixedBytes([0]),
                domain_beacon_proposer: 0,
                domain_beacon_attester: 1,
                domain_randao: 2,
                domain_deposit: 3,
                domain_voluntary_exit: 4,
                slots_per_epoch: 32,
            },
            head_state: HeadState { epoch: 10, finalized_epoch: 8, justified_epoch: 9 },
            validators: HashMap::new(),
        }
    }

    pub fn with_head_state(mut self, head_state: HeadState) -> Self {
        self.head_state = head_state;
        self
    }

    pub fn with_validator(mut self, status: ValidatorStatus) -> Self {
        self.validators.insert(status.pubkey, status);
        self
    }
}

impl Default for MockBeaconClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BeaconClientTrait for MockBeaconClient {
    async fn get_chain_config(&self) -> Result<ChainConfig, BeaconClientError> {
        Ok(self.chain_config.clone())
    }

    async fn get_head_state(&self) -> Result<HeadState, BeaconClientError> {
        Ok(self.head_state)
    }

    async fn get_validator_status(
        &self,
        pubkey: &str,
    ) -> Result<ValidatorStatus, BeaconClientError> {
        let pubkey = parse_pubkey(pubkey)?;
        Ok(self
            .validators
            .get(&pubkey)
            .cloned()
            .unwrap_or_else(|| ValidatorStatus::missing(pubkey)))
    }

    fn get_uri(&self) -> String {
        "http://mock.beacon:5052/".to_string()
    }
}
