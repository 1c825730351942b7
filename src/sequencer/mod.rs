//! Choreography sequencer ("state engine").
//!
//! Drives servos 1 and 2 through the eleven-phase swing while in automatic
//! mode. Each phase advances under one of three policies (see
//! [`phase::Advance`]); on every phase change the controller reloads the
//! phase's setpoint row for all four servos.

pub mod config;
pub mod phase;
pub mod table;

use std::time::Instant;

use tracing::{debug, info};

use crate::{
    axis::{store::ParameterStore, MotorAxis},
    controller::state::ControllerState,
};
use config::{ChoreographyConfig, TrackTargets};
use phase::{Advance, Phase};

/// Number of servos that perform the swing (servos 1 and 2).
const TRACKED: usize = 2;

/// Signals from one `tick` the caller has to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// The finish phase completed and the start trigger was cleared.
    CycleComplete,
}

#[derive(Debug, Clone)]
pub struct Sequencer {
    config: ChoreographyConfig,
    current_step: usize,
    last_announced_step: usize,
    done: [bool; TRACKED],
}

impl Sequencer {
    pub fn new(config: ChoreographyConfig) -> Self {
        Self {
            config,
            current_step: 0,
            last_announced_step: 0,
            done: [false; TRACKED],
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn phase(&self) -> Phase {
        Phase::from_index(self.current_step).unwrap_or(Phase::Idle)
    }

    /// Returns the new step exactly once per change.
    pub fn take_step_change(&mut self) -> Option<usize> {
        if self.current_step != self.last_announced_step {
            self.last_announced_step = self.current_step;
            Some(self.current_step)
        } else {
            None
        }
    }

    /// Load the scaled setpoint row of `step` for every servo. Returns
    /// `false`, leaving the store untouched, when `step` is out of range.
    pub fn load_setpoints(store: &mut ParameterStore, step: i32) -> bool {
        let loaded = store.load_rows(|record| {
            table::base_setpoint(record.id, step).map(|base| record.gains.scale(base))
        });
        if !loaded {
            debug!("Ignoring setpoint load for out-of-range step {}", step);
        }
        loaded
    }

    fn tracks(&self) -> [TrackTargets; TRACKED] {
        [self.config.primary, self.config.secondary]
    }

    /// Run one automatic-mode iteration of the current phase.
    pub fn tick(
        &mut self,
        state: &mut ControllerState,
        hw: &mut [Box<dyn MotorAxis>],
        now: Instant,
    ) -> TickOutcome {
        let phase = self.phase();

        if phase == Phase::Idle {
            let hold = self.tracks().map(|track| track.hold_velocity);
            state.store.hold_velocities(&hold);
        }

        for (i, track) in self.tracks().iter().enumerate() {
            if !state.operators[i].enabled {
                continue;
            }
            let (Some(mover), Some(axis)) = (state.movers.get_mut(i), hw.get_mut(i)) else {
                continue;
            };
            match mover.advance(axis.as_mut(), track.target(phase.target()), now) {
                Ok(done) => self.done[i] = done,
                Err(fault) => {
                    self.done[i] = false;
                    state.store.record_fault(i + 1, fault);
                }
            }
        }

        match phase.advance() {
            Advance::OnStart => {
                if state.start {
                    self.goto(Phase::Address);
                }
            }
            Advance::BothDone => {
                if self.done.iter().all(|d| *d) {
                    for mover in state.movers.iter_mut().take(TRACKED) {
                        mover.reset();
                    }
                    if phase == Phase::Finish {
                        state.start = false;
                        let next = if state.repeat {
                            Phase::Address
                        } else {
                            Phase::Idle
                        };
                        info!("Swing complete, returning to {}", next.name());
                        self.goto(next);
                        return TickOutcome::CycleComplete;
                    }
                    self.goto_next();
                }
            }
            Advance::Threshold(crossing) => {
                let crossed = state
                    .store
                    .records()
                    .iter()
                    .take(TRACKED)
                    .all(|r| crossing.reached(r.position_actual, r.setpoint.position));
                if crossed {
                    self.goto_next();
                }
            }
        }
        TickOutcome::Continue
    }

    fn goto_next(&mut self) {
        if let Some(next) = Phase::from_index(self.current_step + 1) {
            self.goto(next);
        }
    }

    fn goto(&mut self, phase: Phase) {
        debug!("State engine -> {} ({})", phase.index(), phase.name());
        self.current_step = phase.index();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::axis::{
        move_machine::MoveMachine, parameters::AxisConfig, testing::FakeAxis, AXES_PER_BOARD,
    };
    use crate::controller::state::Mode;

    struct Rig {
        seq: Sequencer,
        state: ControllerState,
        fakes: Vec<FakeAxis>,
        hw: Vec<Box<dyn MotorAxis>>,
        now: Instant,
    }

    impl Rig {
        fn new() -> Self {
            let axes = [1, 2, 3, 4].map(AxisConfig::for_servo);
            let store = ParameterStore::new(1, &axes, Duration::from_millis(100), false);
            let movers = (0..AXES_PER_BOARD).map(|_| MoveMachine::default()).collect();
            let mut state = ControllerState::new(store, movers);
            state.mode = Mode::Automatic;
            let fakes: Vec<FakeAxis> = (0..AXES_PER_BOARD).map(|_| FakeAxis::new()).collect();
            let hw = fakes
                .iter()
                .map(|f| Box::new(f.clone()) as Box<dyn MotorAxis>)
                .collect();
            Self {
                seq: Sequencer::new(ChoreographyConfig::default()),
                state,
                fakes,
                hw,
                now: Instant::now(),
            }
        }

        /// One automatic iteration in loop order.
        fn iterate(&mut self) -> TickOutcome {
            self.now += Duration::from_millis(10);
            self.state.store.refresh_telemetry(&mut self.hw, self.now);
            if let Some(step) = self.seq.take_step_change() {
                Sequencer::load_setpoints(&mut self.state.store, step as i32);
            }
            self.seq.tick(&mut self.state, &mut self.hw, self.now)
        }

        fn finish_tracked(&self) {
            self.fakes[0].finish_move();
            self.fakes[1].finish_move();
        }

        /// Iterate, completing tracked moves, until the step changes.
        fn run_until_step_changes(&mut self) -> usize {
            let start = self.seq.current_step();
            for _ in 0..50 {
                self.finish_tracked();
                self.iterate();
                if self.seq.current_step() != start {
                    return self.seq.current_step();
                }
            }
            panic!("step {} never advanced", start);
        }
    }

    #[test]
    fn test_idle_holds_until_start() {
        let mut rig = Rig::new();
        for _ in 0..5 {
            rig.finish_tracked();
            rig.iterate();
        }
        assert_eq!(rig.seq.current_step(), 0);
        assert_eq!(rig.fakes[0].snapshot().moves.last(), Some(&2000));
        assert_eq!(rig.state.store.record(1).unwrap().setpoint.velocity, 500);

        rig.state.start = true;
        rig.iterate();
        assert_eq!(rig.seq.current_step(), 1);
    }

    #[test]
    fn test_single_run_visits_every_phase_in_order() {
        let mut rig = Rig::new();
        rig.state.start = true;

        let mut visited = vec![rig.seq.current_step()];
        loop {
            let step = rig.run_until_step_changes();
            if step == 0 {
                break;
            }
            visited.push(step);
        }

        assert_eq!(visited, (0..=10).collect::<Vec<_>>());
        assert!(!rig.state.start);
    }

    #[test]
    fn test_repeat_reenters_at_address() {
        let mut rig = Rig::new();
        rig.state.start = true;
        rig.state.repeat = true;

        for _ in 0..10 {
            rig.run_until_step_changes();
        }
        assert_eq!(rig.seq.current_step(), 10);

        let mut outcome = TickOutcome::Continue;
        for _ in 0..50 {
            rig.finish_tracked();
            outcome = rig.iterate();
            if rig.seq.current_step() != 10 {
                break;
            }
        }
        assert_eq!(outcome, TickOutcome::CycleComplete);
        assert_eq!(rig.seq.current_step(), 1);
        assert!(!rig.state.start);
    }

    #[test]
    fn test_threshold_uses_live_setpoint() {
        let mut rig = Rig::new();
        rig.seq.current_step = 2;
        rig.seq.last_announced_step = 2;
        Sequencer::load_setpoints(&mut rig.state.store, 2);

        rig.fakes[0].with(|s| s.position = 1600);
        rig.fakes[1].with(|s| s.position = 2000);
        rig.iterate();
        assert_eq!(rig.seq.current_step(), 2);

        assert!(rig.state.store.load_rows(|r| {
            Some(if r.id == 1 {
                crate::axis::parameters::Setpoint::new(1000, 8000, 1700)
            } else {
                r.setpoint
            })
        }));
        rig.iterate();
        assert_eq!(rig.seq.current_step(), 3);
    }

    #[test]
    fn test_both_done_requires_both_axes() {
        let mut rig = Rig::new();
        rig.seq.current_step = 1;
        rig.seq.last_announced_step = 1;

        rig.iterate();
        rig.fakes[0].finish_move();
        for _ in 0..3 {
            rig.iterate();
        }
        assert_eq!(rig.seq.current_step(), 1);

        rig.finish_tracked();
        rig.iterate();
        assert_eq!(rig.seq.current_step(), 2);
    }

    #[test]
    fn test_disabled_operator_gets_no_moves() {
        let mut rig = Rig::new();
        rig.state.operators[1].enabled = false;
        for _ in 0..3 {
            rig.iterate();
        }
        assert!(!rig.fakes[0].snapshot().moves.is_empty());
        assert!(rig.fakes[1].snapshot().moves.is_empty());
    }

    #[test]
    fn test_servos_three_and_four_receive_setpoints_only() {
        let mut rig = Rig::new();
        rig.state.start = true;
        rig.run_until_step_changes();
        rig.iterate();

        assert_eq!(
            rig.state.store.record(3).unwrap().setpoint,
            crate::axis::parameters::Setpoint::new(2003, 8000, 900)
        );
        assert!(rig.fakes[2].snapshot().moves.is_empty());
        assert!(rig.fakes[3].snapshot().moves.is_empty());
    }

    #[test]
    fn test_load_setpoints_scales_and_bounds() {
        let mut rig = Rig::new();
        assert!(Sequencer::load_setpoints(&mut rig.state.store, 6));
        assert_eq!(
            &rig.state.store.setpoints()[..6],
            &[10_000, 8000, 500, 10_200, 8000, 0]
        );

        let before = rig.state.store.setpoints();
        assert!(!Sequencer::load_setpoints(&mut rig.state.store, 11));
        assert!(!Sequencer::load_setpoints(&mut rig.state.store, -1));
        assert_eq!(rig.state.store.setpoints(), before);
    }
}
