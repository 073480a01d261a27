// Portal Autologin - Background Services
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Background services for automated portal handling.
//!
//! - Automation: Search-and-activate attempts against the UI tree
//! - Driver: Pluggable portal handling strategies
//! - Orchestrator: Reacts to network changes and triggers portals
//! - Validation: Periodic connectivity checks for the active profile
//! - Notify: User-facing outcome notifications

pub mod automation;
pub mod driver;
pub mod notify;
pub mod orchestrator;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use automation::{AttemptOutcome, AutomationController, SessionPhase};
pub use driver::{AutomationDriver, DriverRegistry, PortalDriver};
pub use notify::{DesktopNotifier, LogNotifier, Notifier, PortalNotification};
pub use orchestrator::{NetworkOrchestrator, PortalTrigger};
pub use validation::{ValidationTask, ValidationVerdict};
