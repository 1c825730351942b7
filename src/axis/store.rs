use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{
    alerts::AlertRegister,
    fault::{AxisFault, FaultEvent},
    logical_axis,
    parameters::{validate_parameters, AxisConfig, Gains, Limits, ParameterError, Setpoint},
    MotorAxis, AXES_PER_BOARD,
};

/// Setpoints and live telemetry of one axis.
#[derive(Debug, Clone)]
pub struct AxisRecord {
    /// Board-local servo number, 1-based.
    pub id: usize,
    pub limits: Limits,
    pub gains: Gains,
    pub enable_requested: bool,
    pub setpoint: Setpoint,
    pub velocity_actual: i32,
    pub acceleration_actual: i32,
    pub position_actual: i32,
    pub last_alerts: AlertRegister,
    pub last_fault: Option<FaultEvent>,
    velocity_sample: Option<(Instant, i32)>,
}

impl AxisRecord {
    fn new(id: usize, config: &AxisConfig) -> Self {
        Self {
            id,
            limits: config.limits,
            gains: config.gains,
            enable_requested: false,
            setpoint: config.setpoint,
            velocity_actual: 0,
            acceleration_actual: 0,
            position_actual: 0,
            last_alerts: AlertRegister::clear(),
            last_fault: None,
            velocity_sample: None,
        }
    }
}

/// Per-axis parameter store shared by the protocol handler, the sequencer
/// and the move loop. Hardware handles are passed in index-aligned with the
/// records (`hw[0]` is servo 1).
#[derive(Debug, Clone)]
pub struct ParameterStore {
    board_id: u8,
    records: Vec<AxisRecord>,
    sample_interval: Duration,
    handle_alerts: bool,
}

impl ParameterStore {
    pub fn new(
        board_id: u8,
        axes: &[AxisConfig; AXES_PER_BOARD],
        sample_interval: Duration,
        handle_alerts: bool,
    ) -> Self {
        let records = axes
            .iter()
            .enumerate()
            .map(|(i, cfg)| AxisRecord::new(i + 1, cfg))
            .collect();
        Self {
            board_id,
            records,
            sample_interval,
            handle_alerts,
        }
    }

    pub fn records(&self) -> &[AxisRecord] {
        &self.records
    }

    pub fn record(&self, servo: usize) -> Result<&AxisRecord, ParameterError> {
        servo
            .checked_sub(1)
            .and_then(|i| self.records.get(i))
            .ok_or(ParameterError::UnknownServo(servo))
    }

    fn record_mut(&mut self, servo: usize) -> Result<&mut AxisRecord, ParameterError> {
        servo
            .checked_sub(1)
            .and_then(|i| self.records.get_mut(i))
            .ok_or(ParameterError::UnknownServo(servo))
    }

    /// Push each axis' velocity and acceleration setpoints to the drive's
    /// active limits, clamped to the configured ceilings.
    pub fn load_default_setpoints(&self, hw: &mut [Box<dyn MotorAxis>]) {
        for (record, axis) in self.records.iter().zip(hw.iter_mut()) {
            axis.set_velocity_max(record.limits.clamp_velocity(record.setpoint.velocity));
            axis.set_acceleration_max(
                record
                    .limits
                    .clamp_acceleration(record.setpoint.acceleration),
            );
        }
    }

    /// Mirror the enable inputs onto the drives and pull commanded
    /// velocity/position, the acceleration estimate and alert state back
    /// into the records.
    pub fn refresh_telemetry(&mut self, hw: &mut [Box<dyn MotorAxis>], now: Instant) {
        let board_id = self.board_id;
        let sample_interval = self.sample_interval;
        let handle_alerts = self.handle_alerts;

        for (record, axis) in self.records.iter_mut().zip(hw.iter_mut()) {
            record.enable_requested = axis.enable_input();
            axis.set_enable_request(record.enable_requested);

            record.velocity_actual = axis.velocity_commanded();
            record.position_actual = axis.position_commanded();

            match record.velocity_sample {
                Some((at, velocity)) => {
                    let dt = now.saturating_duration_since(at);
                    if dt >= sample_interval && !dt.is_zero() {
                        let dv = i128::from(record.velocity_actual) - i128::from(velocity);
                        let rate = dv * 1_000_000_000 / dt.as_nanos() as i128;
                        record.acceleration_actual =
                            rate.clamp(i128::from(i32::MIN), i128::from(i32::MAX)) as i32;
                        record.velocity_sample = Some((now, record.velocity_actual));
                    }
                }
                None => record.velocity_sample = Some((now, record.velocity_actual)),
            }

            let alerts = axis.alerts();
            let servo = logical_axis(board_id, record.id);
            if alerts != record.last_alerts {
                if alerts.any_active() {
                    warn!("Servo{} alerts present: {}", servo, alerts);
                    if alerts.has_limit() {
                        warn!("Servo{} motion stopped at a travel limit", servo);
                    }
                    record.last_fault = Some(FaultEvent::new(AxisFault::Alert(alerts)));
                } else {
                    info!("Servo{} alerts cleared", servo);
                }
                record.last_alerts = alerts;
            }

            if handle_alerts && alerts.motor_faulted {
                warn!(
                    "Servo{} faults present, cycling enable signal to clear faults",
                    servo
                );
                axis.set_enable_request(false);
                axis.set_enable_request(true);
                axis.clear_alerts();
            }
        }
    }

    /// Validated setpoint update, as requested by the operator console.
    pub fn set_parameters(&mut self, servo: usize, setpoint: Setpoint) -> Result<(), ParameterError> {
        let record = self.record_mut(servo)?;
        validate_parameters(&record.limits, &setpoint)?;
        record.setpoint = setpoint;
        Ok(())
    }

    /// Unvalidated setpoint load used by the choreography tables. All or
    /// nothing: if `row` has no entry for some axis the store is untouched.
    pub fn load_rows<F>(&mut self, row: F) -> bool
    where
        F: Fn(&AxisRecord) -> Option<Setpoint>,
    {
        let Some(rows) = self.records.iter().map(row).collect::<Option<Vec<_>>>() else {
            return false;
        };
        for (record, setpoint) in self.records.iter_mut().zip(rows) {
            record.setpoint = setpoint;
        }
        true
    }

    /// Override the velocity setpoints of the leading axes, in servo order.
    pub fn hold_velocities(&mut self, velocities: &[i32]) {
        for (record, velocity) in self.records.iter_mut().zip(velocities) {
            record.setpoint = record.setpoint.with_velocity(*velocity);
        }
    }

    /// Zero the drive's position reference without moving.
    pub fn clear_position(
        &mut self,
        servo: usize,
        hw: &mut [Box<dyn MotorAxis>],
    ) -> Result<(), ParameterError> {
        let axis = servo
            .checked_sub(1)
            .and_then(|i| hw.get_mut(i))
            .ok_or(ParameterError::UnknownServo(servo))?;
        axis.set_position_reference(0);
        self.record_mut(servo)?.position_actual = 0;
        debug!("Servo{} position reference set to 0", servo);
        Ok(())
    }

    pub fn record_fault(&mut self, servo: usize, fault: AxisFault) {
        let servo_label = logical_axis(self.board_id, servo);
        warn!("Servo{} fault: {}", servo_label, fault);
        if let Ok(record) = self.record_mut(servo) {
            record.last_fault = Some(FaultEvent::new(fault));
        }
    }

    /// V, A, P actuals for all axes, in wire order.
    pub fn values(&self) -> [i32; 3 * AXES_PER_BOARD] {
        let mut out = [0; 3 * AXES_PER_BOARD];
        for (chunk, record) in out.chunks_mut(3).zip(&self.records) {
            chunk.copy_from_slice(&[
                record.velocity_actual,
                record.acceleration_actual,
                record.position_actual,
            ]);
        }
        out
    }

    /// V, A, P setpoints for all axes, in wire order.
    pub fn setpoints(&self) -> [i32; 3 * AXES_PER_BOARD] {
        let mut out = [0; 3 * AXES_PER_BOARD];
        for (chunk, record) in out.chunks_mut(3).zip(&self.records) {
            chunk.copy_from_slice(&[
                record.setpoint.velocity,
                record.setpoint.acceleration,
                record.setpoint.position,
            ]);
        }
        out
    }
}
