//! Tab-lifetime session state.

use crate::catalog::Charity;
use alloy_primitives::Address;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use serde::Serialize;
use std::{fmt, sync::Arc};

/// A confirmed donation, kept for the rest of the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub charity_name: String,
    /// The amount as entered, in ether.
    pub amount: String,
    /// Local time the donation was confirmed.
    pub timestamp: String,
}

impl DonationRecord {
    pub(crate) fn now(charity: &Charity, amount: &str) -> Self {
        Self {
            charity_name: charity.name.to_string(),
            amount: amount.to_string(),
            timestamp: chrono::Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        }
    }
}

impl fmt::Display for DonationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Donated {} ETH to {} on {}", self.amount, self.charity_name, self.timestamp)
    }
}

/// Result of the most recent operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum WorkflowStatus {
    #[default]
    Idle,
    Pending,
    Success(String),
    Failure(String),
}

impl WorkflowStatus {
    /// The message to show, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Idle | Self::Pending => None,
            Self::Success(msg) | Self::Failure(msg) => Some(msg),
        }
    }

    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// Everything the presentation layer renders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// The active account, `None` while not connected.
    pub account: Option<Address>,
    /// Whether the initial wallet connection is still running.
    pub loading: bool,
    pub selected_charity: Option<Charity>,
    /// The amount as typed by the user.
    pub donation_amount: String,
    pub is_donating: bool,
    pub status: WorkflowStatus,
    /// Confirmed donations, oldest first.
    pub history: Vec<DonationRecord>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            account: None,
            loading: true,
            selected_charity: None,
            donation_amount: String::new(),
            is_donating: false,
            status: WorkflowStatus::Idle,
            history: Vec::new(),
        }
    }
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }
}

/// Shared handle to the [`SessionState`].
///
/// Clones refer to the same state. The lock is never held across an await point.
#[derive(Clone, Debug, Default)]
pub struct SessionHandle {
    inner: Arc<Mutex<Slot>>,
}

/// The state together with the number of resets it has seen.
#[derive(Debug, Default)]
struct Slot {
    state: SessionState,
    generation: u64,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    pub(crate) fn lock(&self) -> MappedMutexGuard<'_, SessionState> {
        MutexGuard::map(self.inner.lock(), |slot| &mut slot.state)
    }

    /// Replaces the state with a fresh session.
    ///
    /// A donation still in flight keeps `is_donating` set until its guard drops, but its
    /// outcome is no longer applied to the new session.
    pub(crate) fn reset(&self) {
        let mut slot = self.inner.lock();
        let is_donating = slot.state.is_donating;
        slot.generation += 1;
        slot.state = SessionState { is_donating, ..Default::default() };
    }

    /// Marks a donation as in flight until the returned guard is dropped.
    ///
    /// Returns `None` if another donation already holds the flag.
    pub(crate) fn begin_donation(&self) -> Option<InFlightGuard> {
        let mut slot = self.inner.lock();
        if slot.state.is_donating {
            return None;
        }
        slot.state.is_donating = true;
        slot.state.status = WorkflowStatus::Pending;
        Some(InFlightGuard { session: self.clone(), generation: slot.generation })
    }
}

/// Clears the in-flight flag on drop, whichever way the submission ended.
#[derive(Debug)]
#[must_use]
pub(crate) struct InFlightGuard {
    session: SessionHandle,
    /// Generation of the session the donation was started in.
    generation: u64,
}

impl InFlightGuard {
    /// Applies `f` to the state if the session has not been reset since the donation began.
    ///
    /// Returns whether `f` ran.
    pub(crate) fn commit(&self, f: impl FnOnce(&mut SessionState)) -> bool {
        let mut slot = self.session.inner.lock();
        if slot.generation != self.generation {
            return false;
        }
        f(&mut slot.state);
        true
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.session.inner.lock().state.is_donating = false;
    }
}
