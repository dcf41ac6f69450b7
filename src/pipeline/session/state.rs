use serde::Serialize;

use crate::error::ErrorKind;

/// Lifecycle of one analysis session. Transitions only move forward:
/// `Idle -> ModelsLoading -> Analyzing -> Complete | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    ModelsLoading,
    Analyzing,
    Complete,
    Failed(ErrorKind),
}

impl SessionState {
    fn rank(&self) -> u8 {
        match self {
            SessionState::Idle => 0,
            SessionState::ModelsLoading => 1,
            SessionState::Analyzing => 2,
            SessionState::Complete | SessionState::Failed(_) => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::ModelsLoading => "ModelsLoading",
            SessionState::Analyzing => "Analyzing",
            SessionState::Complete => "Complete",
            SessionState::Failed(_) => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Complete | SessionState::Failed(_))
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, SessionState::ModelsLoading | SessionState::Analyzing)
    }

    pub fn can_advance_to(&self, next: SessionState) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_monotonic() {
        use SessionState::*;
        assert!(ModelsLoading.can_advance_to(Analyzing));
        assert!(ModelsLoading.can_advance_to(Failed(ErrorKind::ModelLoad)));
        assert!(Analyzing.can_advance_to(Complete));
        assert!(!Analyzing.can_advance_to(ModelsLoading));
        assert!(!Analyzing.can_advance_to(Analyzing));
        assert!(!Complete.can_advance_to(Analyzing));
        assert!(!Complete.can_advance_to(Failed(ErrorKind::Inference)));
        assert!(!Failed(ErrorKind::Inference).can_advance_to(Complete));
    }
}
