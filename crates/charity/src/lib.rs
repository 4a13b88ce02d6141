//! # charity
//!
//! Donation workflow for the charity contract.
//!
//! The [`DonationWorkflow`] connects a wallet through a [`WalletConnector`], binds the
//! [`CharityContract`] proxy and keeps the [`SessionState`] that a front-end renders:
//!
//! 1. [`load`](DonationWorkflow::load) requests account access and binds the contract
//! 2. the front-end forwards user intents (select a charity, edit the amount)
//! 3. [`donate`](DonationWorkflow::donate) validates, applies the trust gate and submits
//! 4. [`check_status`](DonationWorkflow::check_status) queries the contract read-only
//!
//! Wallet notifications arrive as [`WalletEvent`]s and are applied with
//! [`handle_event`](DonationWorkflow::handle_event).

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
extern crate tracing;

pub mod catalog;
pub mod config;
pub mod contract;
pub mod deploy;
pub mod error;
pub mod session;
pub mod wallet;

mod workflow;

pub use catalog::{CHARITIES, Charity};
pub use config::CharityConfig;
pub use contract::{CharityContract, DONATION_GAS_LIMIT, DonationReceipt, RpcCharityContract};
pub use error::{ContractError, DonationError, ValidationError, WalletError};
pub use session::{DonationRecord, SessionHandle, SessionState, WorkflowStatus};
pub use wallet::{RpcWalletHost, WalletConnector, WalletEvent, WalletHost};
pub use workflow::{
    DONATION_FAILED, DONATION_RECEIVED, DONATION_SUCCESSFUL, DonationWorkflow,
    NO_DONATIONS_RECEIVED, STATUS_CHECK_FAILED,
};
