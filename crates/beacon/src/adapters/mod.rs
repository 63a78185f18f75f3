pub mod lighthouse;
pub mod standard;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    dispatcher::RequestDispatcher,
    error::BeaconClientError,
    normalize::normalize_pubkey,
    types::BlsPublicKeyBytes,
};

pub use lighthouse::LighthouseClient;
pub use standard::StandardClient;

/// GETs `path` and decodes the JSON body, naming `query` in any error.
pub(crate) async fn get_json<D, T>(
    dispatcher: &D,
    path: &str,
    query: &'static str,
) -> Result<T, BeaconClientError>
where
    D: RequestDispatcher + ?Sized,
    T: DeserializeOwned,
{
    let body =
        dispatcher.get(path).await.map_err(|err| BeaconClientError::transport(query, err))?;
    debug!(query, len = body.len(), "received response");
    serde_json::from_slice(&body).map_err(|err| BeaconClientError::decode(query, err))
}

pub(crate) fn parse_pubkey(pubkey: &str) -> Result<BlsPublicKeyBytes, BeaconClientError> {
    normalize_pubkey(pubkey).map_err(|err| BeaconClientError::InvalidPubkey {
        pubkey: pubkey.to_string(),
        reason: err.to_string(),
    })
}
