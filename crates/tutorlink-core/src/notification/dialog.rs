//! The single-dialog invariant.
//!
//! The client never shows more than one pending proposal dialog at a
//! time. `DialogGate` owns that state so neither the poll loop, the push
//! task, nor the presentation layer has to re-check it.

use super::model::ProposalNotification;
use std::sync::Mutex;

/// State of the proposal dialog.
///
/// `Hidden -> Shown` on a notification received while `Hidden`;
/// `Shown -> Hidden` on accept, reject, or dismiss. No other states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    Hidden,
    Shown(ProposalNotification),
}

/// Shared gate enforcing at most one visible proposal dialog.
#[derive(Debug)]
pub struct DialogGate {
    state: Mutex<DialogState>,
}

impl DialogGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DialogState::Hidden),
        }
    }

    /// Transitions `Hidden -> Shown` for the given proposal.
    ///
    /// Returns `true` if the dialog was taken, `false` if one is already
    /// shown (the new proposal is dropped, keeping display idempotent).
    pub fn try_show(&self, proposal: ProposalNotification) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match *state {
            DialogState::Hidden => {
                *state = DialogState::Shown(proposal);
                true
            }
            DialogState::Shown(_) => false,
        }
    }

    /// Transitions `Shown -> Hidden`, handing back the proposal that was
    /// on display.
    ///
    /// Exactly-once: a second call before another `try_show` returns
    /// `None`, so a double-click on either dialog action resolves at most
    /// one respond call.
    pub fn resolve(&self) -> Option<ProposalNotification> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match std::mem::replace(&mut *state, DialogState::Hidden) {
            DialogState::Shown(proposal) => Some(proposal),
            DialogState::Hidden => None,
        }
    }

    /// The proposal currently on display, if any.
    pub fn current(&self) -> Option<ProposalNotification> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match &*state {
            DialogState::Shown(proposal) => Some(proposal.clone()),
            DialogState::Hidden => None,
        }
    }

    /// Whether a dialog is currently shown.
    pub fn is_shown(&self) -> bool {
        self.current().is_some()
    }
}

impl Default for DialogGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(id: &str) -> ProposalNotification {
        ProposalNotification {
            id: id.to_string(),
            tutor_name: "Amy".to_string(),
            tutor_points: 10,
            topic: "Algebra".to_string(),
            date: "2024-01-01".to_string(),
            time: "10:00".to_string(),
        }
    }

    #[test]
    fn test_show_then_resolve() {
        let gate = DialogGate::new();
        assert!(!gate.is_shown());

        assert!(gate.try_show(proposal("p1")));
        assert!(gate.is_shown());

        let resolved = gate.resolve().unwrap();
        assert_eq!(resolved.id, "p1");
        assert!(!gate.is_shown());
    }

    #[test]
    fn test_second_show_is_dropped_while_shown() {
        let gate = DialogGate::new();
        assert!(gate.try_show(proposal("p1")));
        assert!(!gate.try_show(proposal("p2")));

        // Still the first proposal.
        assert_eq!(gate.current().unwrap().id, "p1");
    }

    #[test]
    fn test_resolve_is_exactly_once() {
        let gate = DialogGate::new();
        gate.try_show(proposal("p1"));

        assert!(gate.resolve().is_some());
        assert!(gate.resolve().is_none());
    }

    #[test]
    fn test_show_again_after_resolve() {
        let gate = DialogGate::new();
        gate.try_show(proposal("p1"));
        gate.resolve();

        assert!(gate.try_show(proposal("p2")));
        assert_eq!(gate.current().unwrap().id, "p2");
    }
}
