use async_trait::async_trait;

use crate::{
    error::BeaconClientError,
    types::{ChainConfig, HeadState, ValidatorStatus},
};

/// Read-only queries every supported beacon node dialect answers.
///
/// Implementations hold only a provider address and a transport handle, so a single
/// instance may be shared across concurrent callers.
#[async_trait]
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait BeaconClientTrait: Send + Sync {
    async fn get_chain_config(&self) -> Result<ChainConfig, BeaconClientError>;

    async fn get_head_state(&self) -> Result<HeadState, BeaconClientError>;

    /// `pubkey` is a 48-byte BLS public key in hex, with or without `0x`.
    ///
    /// A key unknown to the node is not an error: the returned status has
    /// `exists == false`, callers must check the flag.
    async fn get_validator_status(
        &self,
        pubkey: &str,
    ) -> Result<ValidatorStatus, BeaconClientError>;

    fn get_uri(&self) -> String;
}
