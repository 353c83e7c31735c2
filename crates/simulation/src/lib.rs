//! In-memory network for omnigraph.
//!
//! [`SimulatedNetwork`] hosts endpoints and OApps without any chain behind
//! them. It serves endpoint, OApp and OApp read SDKs plus signers through
//! [`omnigraph_core::OmniFactory`], so configurators and the sign-and-send
//! engine run against it exactly as they would against real adapters:
//!
//! ```text
//! graph ──► configurators ──► transactions ──► SignAndSend ──► SimulatedNetwork
//!               ▲                                                    │
//!               └──────────────── reads through SDKs ◄───────────────┘
//! ```
//!
//! SDK reads see only mined state. Writes return transactions whose data is a
//! JSON [`SimulatedCall`]; a signer applies the call when it submits the
//! transaction. Calls the real contracts would reject revert with a
//! [`Revert`] reason and leave the state untouched.

mod call;
mod network;
mod sdk;
mod signer;
mod state;

pub use call::{ConfigEntry, EnforcedOptionsEntry, SimulatedCall};
pub use network::{SetupError, SimulatedNetwork};
pub use sdk::{SimulatedEndpoint, SimulatedOApp};
pub use signer::SimulatedSigner;
pub use state::Revert;
