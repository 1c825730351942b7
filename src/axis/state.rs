/// Per-axis position-move state.
///
/// The drive's alert register is read once per iteration by the parameter
/// store, so there is no separate alert-checking state here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveState {
    #[default]
    Idle,
    /// Enable was requested; waiting for it to settle before issuing the move.
    Start,
    WaitFeedback,
    Done,
}

impl MoveState {
    pub fn is_moving(&self) -> bool {
        matches!(self, MoveState::Start | MoveState::WaitFeedback)
    }
}
