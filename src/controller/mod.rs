pub mod config;
pub mod handler;
pub mod state;

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::{
    axis::{
        logical_axis, move_machine::MoveMachine, store::ParameterStore, MotorAxis, AXES_PER_BOARD,
    },
    protocol::telemetry::Telemetry,
    sequencer::{Sequencer, TickOutcome},
};
use config::ControllerConfig;
use state::{ControllerState, Mode};

/// One controller instance: the state aggregate, the sequencer and the
/// hardware handles, driven one iteration at a time by the control task.
///
/// Telemetry produced while handling commands or iterating is queued in an
/// outbox and handed to the transport by the caller.
pub struct Controller {
    config: ControllerConfig,
    state: ControllerState,
    sequencer: Sequencer,
    hw: [Box<dyn MotorAxis>; AXES_PER_BOARD],
    outbox: Vec<Telemetry>,
    last_iteration: Option<Instant>,
    scan_time: Duration,
    last_state_engine_publish: Option<Instant>,
    last_values_publish: Option<Instant>,
    last_status_log: Option<Instant>,
}

impl Controller {
    pub fn new(config: ControllerConfig, hw: [Box<dyn MotorAxis>; AXES_PER_BOARD]) -> Self {
        let store = ParameterStore::new(
            config.board_id,
            &config.axes,
            Duration::from_millis(config.telemetry.acceleration_sample_ms),
            config.handle_alerts,
        );
        let movers = (0..AXES_PER_BOARD)
            .map(|_| MoveMachine::new(config.move_timing()))
            .collect();
        Self {
            sequencer: Sequencer::new(config.choreography),
            state: ControllerState::new(store, movers),
            config,
            hw,
            outbox: Vec::new(),
            last_iteration: None,
            scan_time: Duration::ZERO,
            last_state_engine_publish: None,
            last_values_publish: None,
            last_status_log: None,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn current_step(&self) -> usize {
        self.sequencer.current_step()
    }

    pub fn scan_time(&self) -> Duration {
        self.scan_time
    }

    /// Power-on setup: program the active limits, latch each axis' enable
    /// from its input and report any alerts already present.
    pub fn initialize(&mut self, now: Instant) {
        self.state.store.load_default_setpoints(&mut self.hw);
        self.state.store.refresh_telemetry(&mut self.hw, now);

        let board_id = self.config.board_id;
        for record in self.state.store.records() {
            let servo = logical_axis(board_id, record.id);
            if !record.enable_requested {
                info!("Servo{} enable input is off, axis stays disabled", servo);
            } else if record.last_alerts.is_clear() {
                info!("Servo{} enabled, no alerts", servo);
            }
        }
    }

    /// Enabled servos whose HLFB has not come up yet and that show no alert.
    pub fn pending_feedback(&self) -> Vec<usize> {
        self.hw
            .iter()
            .enumerate()
            .filter(|(_, axis)| {
                axis.enable_requested() && !axis.hlfb_asserted() && !axis.alerts().any_active()
            })
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// One control-loop iteration. Inbound commands must already have been
    /// applied through [`Controller::handle`].
    pub fn iterate(&mut self, now: Instant) {
        if let Some(previous) = self.last_iteration {
            self.scan_time = now.saturating_duration_since(previous);
        }
        self.last_iteration = Some(now);

        self.state.store.refresh_telemetry(&mut self.hw, now);

        if let Some(step) = self.sequencer.take_step_change() {
            self.publish(Telemetry::StateEngine(step));
            self.last_state_engine_publish = Some(now);
            if self.state.mode == Mode::Automatic {
                self.load_setpoints(step as i32);
            }
        }

        self.state.store.load_default_setpoints(&mut self.hw);

        match self.state.mode {
            Mode::Manual => self.advance_manual(now),
            Mode::Automatic => {
                let outcome = self.sequencer.tick(&mut self.state, &mut self.hw, now);
                if outcome == TickOutcome::CycleComplete {
                    self.publish(Telemetry::ButtonStates(self.state.button_states()));
                }
            }
        }

        self.publish_heartbeats(now);
        self.log_status(now);
    }

    /// Load the sequencer table row for `step` and publish the setpoints.
    /// An out-of-range step leaves the store untouched but still publishes.
    pub fn load_setpoints(&mut self, step: i32) {
        Sequencer::load_setpoints(&mut self.state.store, step);
        self.publish(Telemetry::Setpoints(self.state.store.setpoints()));
    }

    pub fn drain_outbox(&mut self) -> Vec<Telemetry> {
        std::mem::take(&mut self.outbox)
    }

    fn publish(&mut self, telemetry: Telemetry) {
        self.outbox.push(telemetry);
    }

    /// Manual mode drives every axis to its own position setpoint.
    fn advance_manual(&mut self, now: Instant) {
        for (i, (mover, axis)) in self
            .state
            .movers
            .iter_mut()
            .zip(self.hw.iter_mut())
            .enumerate()
        {
            let servo = i + 1;
            let Ok(target) = self.state.store.record(servo).map(|r| r.setpoint.position) else {
                continue;
            };
            if let Err(fault) = mover.advance(axis.as_mut(), target, now) {
                self.state.store.record_fault(servo, fault);
            }
        }
    }

    fn publish_heartbeats(&mut self, now: Instant) {
        let state_engine_interval =
            Duration::from_millis(self.config.telemetry.state_engine_interval_ms);
        if due(self.last_state_engine_publish, state_engine_interval, now) {
            self.publish(Telemetry::StateEngine(self.sequencer.current_step()));
            self.last_state_engine_publish = Some(now);
        }

        if let Some(interval_ms) = self.config.telemetry.values_interval_ms {
            if due(self.last_values_publish, Duration::from_millis(interval_ms), now) {
                self.publish(Telemetry::Values(self.state.store.values()));
                self.last_values_publish = Some(now);
            }
        }
    }

    fn log_status(&mut self, now: Instant) {
        let interval = Duration::from_millis(self.config.telemetry.status_interval_ms);
        if !due(self.last_status_log, interval, now) {
            return;
        }
        self.last_status_log = Some(now);

        if let Some(record) = self.state.store.records().first() {
            debug!(
                "Mode: {:?} Step: {} Moving: {} S1 SPT V:{} A:{} P:{} ACT V:{} A:{} P:{} Scan: {} us",
                self.state.mode,
                self.sequencer.current_step(),
                self.state.movers.iter().filter(|m| m.state().is_moving()).count(),
                record.setpoint.velocity,
                record.setpoint.acceleration,
                record.setpoint.position,
                record.velocity_actual,
                record.acceleration_actual,
                record.position_actual,
                self.scan_time.as_micros()
            );
        }
        for record in self.state.store.records() {
            if let Some(event) = &record.last_fault {
                debug!(
                    "Servo{} last fault: {}",
                    logical_axis(self.config.board_id, record.id),
                    event
                );
            }
        }
        if self.scan_time > self.config.loop_period() * 2 {
            warn!(
                "Scan time {} us exceeds twice the loop period",
                self.scan_time.as_micros()
            );
        }
    }
}

fn due(last: Option<Instant>, interval: Duration, now: Instant) -> bool {
    last.map_or(true, |at| now.saturating_duration_since(at) >= interval)
}
