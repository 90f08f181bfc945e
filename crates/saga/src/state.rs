//! Lifecycle of a single saga run.

/// Where a run stands.
///
/// ```text
/// Running ──┬──► Completed
///           └──► Aborted
/// ```
///
/// A run is created `Running`; there is no idle state because the
/// coordinator starts the first step immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SagaState {
    Running,
    /// Every step was attempted. A swallowed final-step failure still ends here.
    Completed,
    /// An aborting step failed and the steps after it never ran.
    Aborted,
}

impl SagaState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SagaState::Running)
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SagaState::Running => "running",
            SagaState::Completed => "completed",
            SagaState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}
