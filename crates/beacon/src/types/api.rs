use std::collections::HashMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Envelope used by the standard Beacon API: `{"data": ..., <meta>}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(bound = "T: Serialize + serde::de::DeserializeOwned")]
pub struct BeaconResponse<T: Serialize + DeserializeOwned> {
    pub data: T,
    #[serde(flatten)]
    pub meta: HashMap<String, serde_json::Value>,
}
