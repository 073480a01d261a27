// Portal Autologin - Automation Controller
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Automation controller.
//!
//! Holds one session for the profile currently armed. UI change signals
//! start a bounded run of search-and-activate attempts; the run ends in
//! success (notify, hold, reset) or exhaustion (notify, reset).
//!
//! The session lives behind a single mutex that is never held across an
//! await. Arming bumps a generation number; a run that finds its generation
//! stale after any suspension stops without touching the session.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::notify::{Notifier, PortalNotification};
use crate::models::{AutomationConfig, Profile};
use crate::ui::{search_and_activate, UiEventKind, UiTree};

/// Lifecycle of the automation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Nothing armed.
    #[default]
    Idle,
    /// A profile is armed and waiting for a UI change.
    Armed,
    /// A run of attempts is in flight.
    Attempting,
    /// The control was activated; holding before reset.
    Succeeded,
    /// Every attempt failed.
    Exhausted,
}

/// How a run of attempts ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32 },
    /// The session was re-armed while this run was suspended.
    Superseded,
}

#[derive(Debug, Default)]
struct Session {
    profile: Option<Profile>,
    phase: SessionPhase,
    click_performed: bool,
    in_flight: bool,
    retries: u32,
    generation: u64,
}

impl Session {
    fn reset(&mut self) {
        self.profile = None;
        self.phase = SessionPhase::Idle;
        self.click_performed = false;
        self.in_flight = false;
        self.retries = 0;
    }
}

/// Drives search-and-activate attempts for the armed profile.
pub struct AutomationController<T: UiTree> {
    tree: Arc<T>,
    notifier: Arc<dyn Notifier>,
    config: AutomationConfig,
    session: Mutex<Session>,
}

impl<T: UiTree> AutomationController<T> {
    pub fn new(tree: Arc<T>, notifier: Arc<dyn Notifier>, config: AutomationConfig) -> Self {
        Self {
            tree,
            notifier,
            config,
            session: Mutex::new(Session::default()),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Mutex poisoned on automation session, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.session().generation == generation
    }

    /// Reset the session if it still belongs to `generation`.
    fn reset_if_current(&self, generation: u64) {
        let mut session = self.session();
        if session.generation == generation {
            session.reset();
        }
    }

    /// The UI tree this controller searches.
    pub fn tree(&self) -> &Arc<T> {
        &self.tree
    }

    /// Arm the controller for `profile`, superseding any previous session.
    pub fn arm(&self, profile: Profile) {
        let mut session = self.session();
        info!(profile_id = %profile.id, ssid = %profile.ssid, "Armed portal automation");
        session.reset();
        session.profile = Some(profile);
        session.phase = SessionPhase::Armed;
        session.generation = session.generation.wrapping_add(1);
    }

    /// Current phase of the session.
    pub fn phase(&self) -> SessionPhase {
        self.session().phase
    }

    /// ID of the armed profile, if any.
    pub fn armed_profile(&self) -> Option<String> {
        self.session().profile.as_ref().map(|p| p.id.clone())
    }

    /// React to a UI change signal.
    ///
    /// Returns the spawned run, or `None` when the signal was ignored
    /// (irrelevant class, nothing armed, or a run already in flight).
    pub fn handle_ui_event(self: &Arc<Self>, kind: UiEventKind) -> Option<JoinHandle<AttemptOutcome>> {
        if !kind.is_relevant() {
            return None;
        }

        let (profile, generation) = {
            let mut session = self.session();
            if session.phase != SessionPhase::Armed || session.in_flight || session.click_performed {
                return None;
            }
            let profile = session.profile.clone()?;
            session.in_flight = true;
            session.phase = SessionPhase::Attempting;
            (profile, session.generation)
        };

        debug!(profile_id = %profile.id, ?kind, "UI change, starting attempts");
        let controller = Arc::clone(self);
        Some(tokio::spawn(async move { controller.run(profile, generation).await }))
    }

    async fn run(self: Arc<Self>, profile: Profile, generation: u64) -> AttemptOutcome {
        tokio::time::sleep(self.config.settle_delay()).await;
        if !self.is_current(generation) {
            return AttemptOutcome::Superseded;
        }

        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(profile_id = %profile.id, attempt, "Searching for portal control");

            let tree = Arc::clone(&self.tree);
            let target = profile.clone();
            let clicked = tokio::task::spawn_blocking(move || search_and_activate(&*tree, &target))
                .await
                .unwrap_or_else(|e| {
                    warn!("UI search task failed: {}", e);
                    false
                });

            if clicked {
                {
                    let mut session = self.session();
                    if session.generation != generation {
                        return AttemptOutcome::Superseded;
                    }
                    session.click_performed = true;
                    session.in_flight = false;
                    session.phase = SessionPhase::Succeeded;
                }
                info!(profile_id = %profile.id, attempt, "Portal control activated");
                self.send(PortalNotification::Success {
                    profile_id: profile.id.clone(),
                    ssid: profile.ssid.clone(),
                })
                .await;

                tokio::time::sleep(profile.timeout).await;
                self.reset_if_current(generation);
                return AttemptOutcome::Succeeded { attempts: attempt };
            }

            {
                let mut session = self.session();
                if session.generation != generation {
                    return AttemptOutcome::Superseded;
                }
                session.retries = attempt;
                if attempt >= max_attempts {
                    session.in_flight = false;
                    session.phase = SessionPhase::Exhausted;
                }
            }

            if attempt >= max_attempts {
                warn!(profile_id = %profile.id, attempts = attempt, "Portal control not found, giving up");
                self.send(PortalNotification::Failure {
                    profile_id: profile.id.clone(),
                    ssid: profile.ssid.clone(),
                    attempts: attempt,
                })
                .await;
                self.reset_if_current(generation);
                return AttemptOutcome::Exhausted { attempts: attempt };
            }

            let delay = self.config.retry_delay(attempt);
            debug!(profile_id = %profile.id, attempt, ?delay, "Attempt failed, retrying");
            tokio::time::sleep(delay).await;
            if !self.is_current(generation) {
                return AttemptOutcome::Superseded;
            }
        }
    }

    async fn send(&self, notification: PortalNotification) {
        if let Err(e) = self.notifier.notify(notification).await {
            warn!("Failed to send notification: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchKind;
    use crate::services::testing::RecordingNotifier;
    use crate::ui::testing::FakeTree;
    use std::time::Duration;
    use tokio::time::Instant;

    fn profile(id: &str) -> Profile {
        let mut p = Profile::new("Guest", MatchKind::Contains, "http://example.com/");
        p.id = id.to_string();
        p.click_text_contains = vec!["Accept".to_string()];
        p.timeout = Duration::from_millis(10_000);
        p
    }

    fn controller(tree: &FakeTree) -> (Arc<AutomationController<FakeTree>>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = Arc::new(AutomationController::new(
            Arc::new(tree.clone()),
            notifier.clone(),
            AutomationConfig::default(),
        ));
        (controller, notifier)
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_search_exhausts() {
        let tree = FakeTree::new();
        let root = tree.root("Welcome", false);
        tree.child(root, "Terms and conditions", false);
        let (controller, notifier) = controller(&tree);

        controller.arm(profile("p1"));
        let start = Instant::now();
        let run = controller
            .handle_ui_event(UiEventKind::WindowStateChanged)
            .expect("run started");
        assert_eq!(run.await.expect("join"), AttemptOutcome::Exhausted { attempts: 3 });

        // settle + retry delays of 1s and 2s.
        assert!(start.elapsed() >= Duration::from_millis(3_500));
        assert_eq!(tree.root_calls(), 3);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], PortalNotification::Failure { attempts: 3, .. }));
        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert_eq!(tree.live_handles(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_second_attempt() {
        let tree = FakeTree::new();
        let root = tree.root("Portal", false);
        let button = tree.child(root, "Accept and connect", true);
        tree.hide_root_for(1);
        let (controller, notifier) = controller(&tree);

        controller.arm(profile("p1"));
        let run = controller
            .handle_ui_event(UiEventKind::ContentChanged)
            .expect("run started");

        // Events during the run are dropped.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(controller.handle_ui_event(UiEventKind::ContentChanged).is_none());

        assert_eq!(run.await.expect("join"), AttemptOutcome::Succeeded { attempts: 2 });
        assert_eq!(tree.root_calls(), 2);
        assert_eq!(tree.activations(button), 1);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], PortalNotification::Success { .. }));
        assert_eq!(controller.phase(), SessionPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_holds_then_resets() {
        let tree = FakeTree::new();
        tree.root("Accept", true);
        let (controller, _notifier) = controller(&tree);

        controller.arm(profile("p1"));
        let run = controller
            .handle_ui_event(UiEventKind::WindowStateChanged)
            .expect("run started");

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(controller.phase(), SessionPhase::Succeeded);
        assert!(controller.handle_ui_event(UiEventKind::WindowStateChanged).is_none());

        run.await.expect("join");
        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert_eq!(controller.armed_profile(), None);
        assert_eq!(tree.total_activations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_irrelevant_or_unarmed_events_ignored() {
        let tree = FakeTree::new();
        tree.root("Accept", true);
        let (controller, notifier) = controller(&tree);

        assert!(controller.handle_ui_event(UiEventKind::ContentChanged).is_none());
        controller.arm(profile("p1"));
        assert!(controller.handle_ui_event(UiEventKind::Other).is_none());
        assert_eq!(controller.phase(), SessionPhase::Armed);
        assert_eq!(tree.root_calls(), 0);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_supersedes_running_session() {
        let tree = FakeTree::new();
        tree.root("Nothing to click", false);
        let (controller, notifier) = controller(&tree);

        controller.arm(profile("old"));
        let stale = controller
            .handle_ui_event(UiEventKind::WindowStateChanged)
            .expect("run started");

        // Let the first attempt fail and the run sit in its backoff.
        tokio::time::sleep(Duration::from_millis(700)).await;
        controller.arm(profile("new"));

        assert_eq!(stale.await.expect("join"), AttemptOutcome::Superseded);
        assert!(notifier.sent().is_empty());
        assert_eq!(controller.phase(), SessionPhase::Armed);
        assert_eq!(controller.armed_profile().as_deref(), Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_during_settle_delay() {
        let tree = FakeTree::new();
        tree.root("Accept", true);
        let (controller, notifier) = controller(&tree);

        controller.arm(profile("old"));
        let stale = controller
            .handle_ui_event(UiEventKind::WindowStateChanged)
            .expect("run started");
        controller.arm(profile("new"));

        assert_eq!(stale.await.expect("join"), AttemptOutcome::Superseded);
        assert_eq!(tree.root_calls(), 0);
        assert!(notifier.sent().is_empty());

        let fresh = controller
            .handle_ui_event(UiEventKind::WindowStateChanged)
            .expect("fresh run");
        assert_eq!(fresh.await.expect("join"), AttemptOutcome::Succeeded { attempts: 1 });
        assert_eq!(notifier.sent().len(), 1);
    }
}
