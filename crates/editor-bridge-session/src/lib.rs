//! Session arbitration and command routing for the editor bridge.
//!
//! Provides:
//! - `SessionArbitrator` - Which window is authoritative for the session
//! - `CommandRouter` - Command messages to host primitives
//! - `BridgeController` - Composition root exposed to the host

pub mod arbitrator;
pub mod controller;
pub mod hosts;
pub mod router;
pub mod status;

#[cfg(test)]
mod testing;

pub use arbitrator::SessionArbitrator;
pub use controller::BridgeController;
pub use hosts::EditorHosts;
pub use router::{ArgumentParseError, CommandError, CommandRouter, parse_arguments};
pub use status::StatusPresenter;
