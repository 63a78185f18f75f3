use alloy_primitives::{FixedBytes, B256};
use serde::{Deserialize, Serialize};

use super::Epoch;

pub type BlsPublicKeyBytes = FixedBytes<48>;

/// Epoch value for lifecycle transitions that have not been scheduled yet.
pub const FAR_FUTURE_EPOCH: Epoch = u64::MAX;

/// One validator's record as reported by the beacon node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ValidatorStatus {
    pub pubkey: BlsPublicKeyBytes,
    pub withdrawal_credentials: B256,
    pub effective_balance: u64,
    pub slashed: bool,
    pub activation_eligibility_epoch: Epoch,
    pub activation_epoch: Epoch,
    pub exit_epoch: Epoch,
    pub withdrawable_epoch: Epoch,
    /// Derived, see [`ValidatorStatus::exists_from_activation_epoch`].
    pub exists: bool,
}

impl ValidatorStatus {
    /// Existence is inferred from a non-zero activation epoch, since nodes report a missing
    /// validator as a zeroed record.
    ///
    /// KNOWN DEFECT: a validator activated at genesis (epoch 0) is reported as non-existent.
    /// Callers relying on `exists` inherit this; it is kept for compatibility with the
    /// legacy node behaviour.
    pub fn exists_from_activation_epoch(activation_epoch: Epoch) -> bool {
        activation_epoch != 0
    }

    /// Status for a key the node has no record of.
    pub fn missing(pubkey: BlsPublicKeyBytes) -> Self {
        Self {
            pubkey,
            withdrawal_credentials: B256::ZERO,
            effective_balance: 0,
            slashed: false,
            activation_eligibility_epoch: 0,
            activation_epoch: 0,
            exit_epoch: 0,
            withdrawable_epoch: 0,
            exists: Self::exists_from_activation_epoch(0),
        }
    }

    pub fn is_active_at(&self, epoch: Epoch) -> bool {
        self.exists && self.activation_epoch <= epoch && epoch < self.exit_epoch
    }

    pub fn has_exited_at(&self, epoch: Epoch) -> bool {
        self.exists && self.exit_epoch != FAR_FUTURE_EPOCH && self.exit_epoch <= epoch
    }
}
