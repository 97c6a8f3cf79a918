//! Per-operation progress state machine
//!
//! ```text
//! Idle → Preparing → AwaitingRemote ⟲ → Submitting | Decrypting → Done
//!            └──────────────┴──────────────┴──────────────────→ Failed
//! ```
//!
//! `AwaitingRemote` is the only phase that may repeat (one entry per oracle
//! or wallet round-trip). `Done` and `Failed` are terminal.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationPhase {
    Idle,
    Preparing,
    AwaitingRemote,
    Submitting,
    Decrypting,
    Done,
    Failed,
}

impl OperationPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationPhase::Done | OperationPhase::Failed)
    }
}

impl std::fmt::Display for OperationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationPhase::Idle => "idle",
            OperationPhase::Preparing => "preparing",
            OperationPhase::AwaitingRemote => "awaiting remote",
            OperationPhase::Submitting => "submitting",
            OperationPhase::Decrypting => "decrypting",
            OperationPhase::Done => "done",
            OperationPhase::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Which vault operation a tracker follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Submit,
    /// Submit without the ledger write
    Prepare,
    Retrieve,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Illegal {kind:?} transition: {from} -> {to}")]
pub struct IllegalTransition {
    pub kind: OperationKind,
    pub from: OperationPhase,
    pub to: OperationPhase,
}

/// Receives every phase change
pub trait ProgressObserver: Send + Sync {
    fn on_transition(&self, kind: OperationKind, from: OperationPhase, to: OperationPhase);
}

fn is_legal(kind: OperationKind, from: OperationPhase, to: OperationPhase) -> bool {
    use OperationPhase::*;

    if to == Failed {
        return !from.is_terminal();
    }
    match (from, to) {
        (Idle, Preparing) => true,
        (Preparing, AwaitingRemote) => true,
        (AwaitingRemote, AwaitingRemote) => true,
        (AwaitingRemote, Submitting) => kind == OperationKind::Submit,
        (AwaitingRemote, Decrypting) => kind == OperationKind::Retrieve,
        (AwaitingRemote, Done) => kind == OperationKind::Prepare,
        (Submitting, Done) | (Decrypting, Done) => true,
        _ => false,
    }
}

/// Enforces legal transitions and notifies an optional observer
pub struct OperationTracker {
    kind: OperationKind,
    phase: OperationPhase,
    history: Vec<OperationPhase>,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl OperationTracker {
    pub fn new(kind: OperationKind, observer: Option<Arc<dyn ProgressObserver>>) -> Self {
        Self {
            kind,
            phase: OperationPhase::Idle,
            history: vec![OperationPhase::Idle],
            observer,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn phase(&self) -> OperationPhase {
        self.phase
    }

    /// Every phase entered so far, starting with `Idle`
    pub fn history(&self) -> &[OperationPhase] {
        &self.history
    }

    pub fn advance(&mut self, to: OperationPhase) -> Result<(), IllegalTransition> {
        let from = self.phase;
        if !is_legal(self.kind, from, to) {
            return Err(IllegalTransition {
                kind: self.kind,
                from,
                to,
            });
        }

        self.phase = to;
        self.history.push(to);
        tracing::debug!(kind = ?self.kind, %from, %to, "operation phase");
        if let Some(observer) = &self.observer {
            observer.on_transition(self.kind, from, to);
        }
        Ok(())
    }

    /// Enter (or re-enter) `AwaitingRemote` before a remote round-trip
    pub fn note_remote_attempt(&mut self) {
        if let Err(e) = self.advance(OperationPhase::AwaitingRemote) {
            tracing::error!(error = %e, "remote attempt outside an active operation");
        }
    }

    /// Move to `Failed` unless already terminal
    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            // Failed is reachable from every non-terminal phase
            let _ = self.advance(OperationPhase::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use OperationPhase::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(OperationPhase, OperationPhase)>>);

    impl ProgressObserver for Recorder {
        fn on_transition(&self, _kind: OperationKind, from: OperationPhase, to: OperationPhase) {
            self.0.lock().unwrap().push((from, to));
        }
    }

    #[test]
    fn test_submit_path_with_repeated_remote() {
        let mut t = OperationTracker::new(OperationKind::Submit, None);
        for phase in [Preparing, AwaitingRemote, AwaitingRemote, AwaitingRemote, Submitting, Done] {
            t.advance(phase).unwrap();
        }
        assert_eq!(t.phase(), Done);
        assert_eq!(t.history().len(), 7);
    }

    #[test]
    fn test_illegal_transitions() {
        let mut t = OperationTracker::new(OperationKind::Submit, None);
        assert!(t.advance(Submitting).is_err());

        t.advance(Preparing).unwrap();
        assert!(t.advance(Preparing).is_err());
        t.advance(AwaitingRemote).unwrap();
        assert!(t.advance(Decrypting).is_err());
        t.advance(Submitting).unwrap();
        assert!(t.advance(Submitting).is_err());
        t.advance(Done).unwrap();
        assert!(t.advance(Failed).is_err());
    }

    #[test]
    fn test_retrieve_path() {
        let mut t = OperationTracker::new(OperationKind::Retrieve, None);
        t.advance(Preparing).unwrap();
        t.advance(AwaitingRemote).unwrap();
        assert!(t.advance(Submitting).is_err());
        t.advance(Decrypting).unwrap();
        t.advance(Done).unwrap();
    }

    #[test]
    fn test_observer_and_fail() {
        let recorder = Arc::new(Recorder::default());
        let mut t = OperationTracker::new(OperationKind::Submit, Some(recorder.clone()));
        t.advance(Preparing).unwrap();
        t.note_remote_attempt();
        t.fail();
        t.fail();

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![
                (Idle, Preparing),
                (Preparing, AwaitingRemote),
                (AwaitingRemote, Failed)
            ]
        );
    }
}
