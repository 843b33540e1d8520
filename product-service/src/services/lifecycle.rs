//! Process-wide readiness state.
//!
//! ```text
//! Starting -> Connecting -> Ready
//!                        -> Degraded
//! ```
//!
//! `Ready` and `Degraded` are terminal: there is no reconnect.

use serde::Serialize;
use service_core::error::AppError;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Starting,
    Connecting,
    Ready,
    Degraded,
}

impl LifecycleState {
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        matches!(
            (self, next),
            (LifecycleState::Starting, LifecycleState::Connecting)
                | (LifecycleState::Connecting, LifecycleState::Ready)
                | (LifecycleState::Connecting, LifecycleState::Degraded)
        )
    }

    pub fn is_settled(self) -> bool {
        matches!(self, LifecycleState::Ready | LifecycleState::Degraded)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Connecting => "connecting",
            LifecycleState::Ready => "ready",
            LifecycleState::Degraded => "degraded",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<LifecycleState>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LifecycleState::Starting);
        Self { tx: Arc::new(tx) }
    }

    pub fn state(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == LifecycleState::Ready
    }

    pub fn transition(&self, next: LifecycleState) -> Result<(), AppError> {
        let mut current = LifecycleState::Starting;
        let changed = self.tx.send_if_modified(|state| {
            current = *state;
            if state.can_transition_to(next) {
                *state = next;
                true
            } else {
                false
            }
        });

        if !changed {
            return Err(AppError::InvalidState(format!("{} -> {}", current, next)));
        }

        tracing::info!(from = %current, to = %next, "Lifecycle transition");
        Ok(())
    }

    /// Resolves once the state is `Ready` or `Degraded`.
    pub async fn settled(&self) -> LifecycleState {
        let mut rx = self.tx.subscribe();
        let settled = match rx.wait_for(|state| state.is_settled()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn happy_path_reaches_ready() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Starting);

        lifecycle.transition(LifecycleState::Connecting).unwrap();
        lifecycle.transition(LifecycleState::Ready).unwrap();

        assert!(lifecycle.is_ready());
    }

    #[test]
    fn rejects_skipping_connecting() {
        let lifecycle = Lifecycle::new();
        let err = lifecycle.transition(LifecycleState::Ready).unwrap_err();

        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(lifecycle.state(), LifecycleState::Starting);
    }

    #[test]
    fn terminal_states_do_not_move() {
        let lifecycle = Lifecycle::new();
        lifecycle.transition(LifecycleState::Connecting).unwrap();
        lifecycle.transition(LifecycleState::Degraded).unwrap();

        assert!(lifecycle.transition(LifecycleState::Ready).is_err());
        assert!(lifecycle.transition(LifecycleState::Connecting).is_err());
        assert_eq!(lifecycle.state(), LifecycleState::Degraded);
    }

    #[tokio::test]
    async fn settled_waits_for_terminal_state() {
        let lifecycle = Lifecycle::new();
        let waiter = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.settled().await })
        };

        lifecycle.transition(LifecycleState::Connecting).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        lifecycle.transition(LifecycleState::Ready).unwrap();

        let state = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state, LifecycleState::Ready);
    }

    #[tokio::test]
    async fn settled_returns_current_state_once_degraded() {
        let lifecycle = Lifecycle::new();
        lifecycle.transition(LifecycleState::Connecting).unwrap();
        lifecycle.transition(LifecycleState::Degraded).unwrap();

        let state = tokio::time::timeout(Duration::from_secs(1), lifecycle.settled())
            .await
            .unwrap();
        assert_eq!(state, LifecycleState::Degraded);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(LifecycleState::Degraded).unwrap(),
            "degraded"
        );
    }
}
