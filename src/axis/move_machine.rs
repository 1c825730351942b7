use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{fault::AxisFault, state::MoveState, MotorAxis};

#[derive(Debug, Clone, Copy)]
pub struct MoveTiming {
    pub timeout: Duration,
    pub enable_settle: Duration,
}

impl Default for MoveTiming {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10_000),
            enable_settle: Duration::from_millis(100),
        }
    }
}

/// Non-blocking absolute-move driver for one axis.
///
/// `advance` is called every iteration. A target is only latched when the
/// machine is idle; a move always runs to completion (or timeout) before a
/// new target is accepted.
#[derive(Debug, Clone)]
pub struct MoveMachine {
    state: MoveState,
    target: Option<i32>,
    timing: MoveTiming,
    enable_requested_at: Option<Instant>,
    move_started_at: Option<Instant>,
    start_position: i32,
}

impl MoveMachine {
    pub fn new(timing: MoveTiming) -> Self {
        Self {
            state: MoveState::Idle,
            target: None,
            timing,
            enable_requested_at: None,
            move_started_at: None,
            start_position: 0,
        }
    }

    pub fn state(&self) -> MoveState {
        self.state
    }

    /// Target of the move in flight, if any.
    pub fn target(&self) -> Option<i32> {
        self.target
    }

    /// Drop back to idle without touching the hardware.
    pub fn reset(&mut self) {
        self.state = MoveState::Idle;
        self.target = None;
        self.enable_requested_at = None;
        self.move_started_at = None;
    }

    /// Returns `Ok(true)` on the calls that observe completion.
    ///
    /// A timed-out move yields [`AxisFault::MoveTimeout`] and leaves the
    /// machine idle without reporting completion.
    pub fn advance(
        &mut self,
        hw: &mut dyn MotorAxis,
        target: i32,
        now: Instant,
    ) -> Result<bool, AxisFault> {
        match self.state {
            MoveState::Idle => {
                self.target = Some(target);
                if !hw.enable_requested() {
                    debug!("Motor is not enabled, requesting enable before move");
                    hw.set_enable_request(true);
                    self.enable_requested_at = Some(now);
                    self.state = MoveState::Start;
                } else {
                    self.issue(hw, target, now);
                }
                Ok(false)
            }
            MoveState::Start => {
                // The enable input gates the drive every iteration, so a move
                // is held until it comes back and the settle time restarts.
                if !hw.enable_input() {
                    if self.enable_requested_at.is_some() {
                        debug!("Enable input is off, holding move to {}", target);
                    }
                    self.enable_requested_at = None;
                    return Ok(false);
                }
                if self.enable_requested_at.is_none() {
                    hw.set_enable_request(true);
                    self.enable_requested_at = Some(now);
                }
                let settled = self
                    .enable_requested_at
                    .map_or(true, |at| now.duration_since(at) >= self.timing.enable_settle);
                if settled {
                    let target = self.target.unwrap_or(target);
                    self.issue(hw, target, now);
                }
                Ok(false)
            }
            MoveState::WaitFeedback => {
                if hw.is_move_complete() {
                    self.state = MoveState::Done;
                    return Ok(true);
                }

                let elapsed = self
                    .move_started_at
                    .map_or(Duration::ZERO, |at| now.duration_since(at));
                if elapsed > self.timing.timeout {
                    let target = self.target.unwrap_or(target);
                    warn!(
                        "Move from {} to {} timed out at position {}",
                        self.start_position,
                        target,
                        hw.position_commanded()
                    );
                    self.reset();
                    return Err(AxisFault::MoveTimeout { target, elapsed });
                }
                Ok(false)
            }
            MoveState::Done => {
                self.reset();
                Ok(hw.steps_complete())
            }
        }
    }

    fn issue(&mut self, hw: &mut dyn MotorAxis, target: i32, now: Instant) {
        self.start_position = hw.position_commanded();
        hw.move_absolute(target);
        self.move_started_at = Some(now);
        self.enable_requested_at = None;
        self.state = MoveState::WaitFeedback;
    }
}

impl Default for MoveMachine {
    fn default() -> Self {
        Self::new(MoveTiming::default())
    }
}
