pub mod adapters;
pub mod aggregator;
pub mod dispatcher;
pub mod error;
#[cfg(test)]
pub mod mock_beacon_client;
#[cfg(test)]
pub mod mock_dispatcher;
pub mod normalize;
pub mod resilient;
pub mod traits;
pub mod types;

use std::sync::Arc;

use stakeops_common::{BeaconClientConfig, BeaconNodeKind};
use tracing::info;

pub use adapters::{LighthouseClient, StandardClient};
pub use dispatcher::{HttpDispatcher, RequestDispatcher};
pub use error::BeaconClientError;
pub use resilient::{ResilientDispatcher, RetryPolicy};
pub use traits::*;

/// Builds the client for the configured node dialect. Called once at startup.
pub fn build_beacon_client(
    config: &BeaconClientConfig,
) -> Result<Arc<dyn BeaconClientTrait>, BeaconClientError> {
    if config.url.cannot_be_a_base() {
        return Err(BeaconClientError::Config(format!("{} is not a base url", config.url)));
    }

    let dispatcher = ResilientDispatcher::new(
        HttpDispatcher::new(reqwest::Client::new(), config.url.clone()),
        RetryPolicy::from(&config.timeouts),
    );
    let aggregate_timeout = config.timeouts.aggregate_timeout();

    info!(url = %config.url, kind = %config.kind, "using beacon node");

    Ok(match config.kind {
        BeaconNodeKind::Lighthouse => Arc::new(LighthouseClient::new(dispatcher, aggregate_timeout)),
        BeaconNodeKind::Standard => Arc::new(StandardClient::new(dispatcher, aggregate_timeout)),
    })
}

#[cfg(test)]
mod tests {
    use stakeops_common::TimeoutConfig;
    use url::Url;

    use super::*;
    use crate::{
        mock_beacon_client::MockBeaconClient,
        types::{BlsPublicKeyBytes, HeadState, ValidatorStatus},
    };

    fn config(url: &str, kind: BeaconNodeKind) -> BeaconClientConfig {
        BeaconClientConfig {
            url: Url::parse(url).unwrap(),
            kind,
            timeouts: TimeoutConfig { max_retries: 0, ..TimeoutConfig::default() },
        }
    }

    #[tokio::test]
    async fn test_build_lighthouse_client() {
        let mut server = mockito::Server::new_async().await;
        let _head = server
            .mock("GET", "/beacon/head")
            .with_body(r#"{"slot":64,"finalized_slot":0,"justified_slot":32}"#)
            .create_async()
            .await;
        let _slots =
            server.mock("GET", "/spec/slots_per_epoch").with_body("32").create_async().await;

        let client = build_beacon_client(&config(&server.url(), BeaconNodeKind::Lighthouse)).unwrap();
        let head = client.get_head_state().await.unwrap();

        assert_eq!(head, HeadState { epoch: 2, finalized_epoch: 0, justified_epoch: 1 });
        assert_eq!(client.get_uri(), format!("{}/", server.url()));
    }

    #[tokio::test]
    async fn test_build_standard_client() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", mockito::Matcher::Regex(r"^/eth/v1/beacon/states/head/validators".into()))
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let client = build_beacon_client(&config(&server.url(), BeaconNodeKind::Standard)).unwrap();
        let status = client.get_validator_status(&"ab".repeat(48)).await.unwrap();

        assert!(!status.exists);
    }

    #[test]
    fn test_build_rejects_non_base_url() {
        let result = build_beacon_client(&config("mailto:node@example.com", BeaconNodeKind::Standard));
        assert!(matches!(result, Err(BeaconClientError::Config(_))));
    }

    #[tokio::test]
    async fn test_mock_client_behind_trait_object() {
        let known = ValidatorStatus {
            activation_epoch: 3,
            exists: true,
            ..ValidatorStatus::missing(BlsPublicKeyBytes::repeat_byte(0x11))
        };
        let client: Arc<dyn BeaconClientTrait> = Arc::new(
            MockBeaconClient::new()
                .with_head_state(HeadState { epoch: 4, finalized_epoch: 2, justified_epoch: 3 })
                .with_validator(known.clone()),
        );

        assert_eq!(client.get_chain_config().await.unwrap().slots_per_epoch, 32);
        assert_eq!(client.get_head_state().await.unwrap().epoch, 4);
        assert_eq!(client.get_validator_status(&"11".repeat(48)).await.unwrap(), known);
        assert!(!client.get_validator_status(&"22".repeat(48)).await.unwrap().exists);
        assert!(client.get_validator_status("0x11").await.is_err());
    }
}
