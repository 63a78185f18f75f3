use alloy_primitives::FixedBytes;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{error::DecodeError, normalize::epoch_at_slot};

pub type Slot = u64;
pub type Epoch = u64;
pub type Version = FixedBytes<4>;

/// Network-wide consensus parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub genesis_fork_version: Version,
    pub bls_withdrawal_prefix_byte: FixedBytes<1>,
    pub domain_beacon_proposer: u64,
    pub domain_beacon_attester: u64,
    pub domain_randao: u64,
    pub domain_deposit: u64,
    pub domain_voluntary_exit: u64,
    pub slots_per_epoch: u64,
}

impl ChainConfig {
    /// Rejects a zero `slots_per_epoch`, every epoch computation divides by it.
    pub fn validate(self) -> Result<Self, DecodeError> {
        if self.slots_per_epoch == 0 {
            return Err(DecodeError::Invalid {
                field: "slots_per_epoch",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(self)
    }
}

/// The node's view of the chain tip, in epochs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeadState {
    pub epoch: Epoch,
    pub finalized_epoch: Epoch,
    pub justified_epoch: Epoch,
}

impl HeadState {
    pub fn from_slots(
        slot: Slot,
        finalized_slot: Slot,
        justified_slot: Slot,
        slots_per_epoch: u64,
    ) -> Result<Self, DecodeError> {
        if slots_per_epoch == 0 {
            return Err(DecodeError::Invalid {
                field: "slots_per_epoch",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Self::from_epochs(
            epoch_at_slot(slot, slots_per_epoch),
            epoch_at_slot(finalized_slot, slots_per_epoch),
            epoch_at_slot(justified_slot, slots_per_epoch),
        ))
    }

    /// Ordering is reported by the node and not enforced here.
    pub fn from_epochs(epoch: Epoch, finalized_epoch: Epoch, justified_epoch: Epoch) -> Self {
        let head = Self { epoch, finalized_epoch, justified_epoch };
        if !head.is_ordered() {
            warn!(epoch, finalized_epoch, justified_epoch, "beacon head checkpoints out of order");
        }
        head
    }

    /// `finalized <= justified <= current`
    pub fn is_ordered(&self) -> bool {
        self.finalized_epoch <= self.justified_epoch && self.justified_epoch <= self.epoch
    }
}

/// State the standard dialect queries are evaluated against.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateId {
    Head,
}

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StateId::Head => write!(f, "head"),
        }
    }
}
