use std::{path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    axis::{move_machine::MoveTiming, parameters::AxisConfig, AXES_PER_BOARD},
    sequencer::config::ChoreographyConfig,
    transport::config::TransportConfig,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `STATE_ENGINE` heartbeat period.
    pub state_engine_interval_ms: u64,
    /// Optional `VALUES` heartbeat; without it values are sent on query only.
    pub values_interval_ms: Option<u64>,
    /// Window over which the actual acceleration is estimated.
    pub acceleration_sample_ms: u64,
    /// Period of the debug status line.
    pub status_interval_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            state_engine_interval_ms: 3000,
            values_interval_ms: None,
            acceleration_sample_ms: 100,
            status_interval_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub board_id: u8,
    pub transport: TransportConfig,
    pub loop_period_ms: u64,
    pub move_timeout_ms: u64,
    pub enable_settle_ms: u64,
    /// Startup wait for HLFB on every enabled axis.
    pub feedback_wait_ms: u64,
    /// Cycle the enable line and clear alerts when a motor fault shows up.
    pub handle_alerts: bool,
    pub telemetry: TelemetryConfig,
    pub axes: [AxisConfig; AXES_PER_BOARD],
    pub choreography: ChoreographyConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            board_id: 1,
            transport: TransportConfig::default(),
            loop_period_ms: 10,
            move_timeout_ms: 10_000,
            enable_settle_ms: 100,
            feedback_wait_ms: 3000,
            handle_alerts: false,
            telemetry: TelemetryConfig::default(),
            axes: [1, 2, 3, 4].map(AxisConfig::for_servo),
            choreography: ChoreographyConfig::default(),
        }
    }
}

impl ControllerConfig {
    pub fn for_board(board_id: u8) -> Self {
        Self {
            board_id,
            ..Self::default()
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.board_id == 0 {
            bail!("board_id must be at least 1");
        }
        if self.loop_period_ms == 0 {
            bail!("loop_period_ms must be non-zero");
        }
        if self.transport.max_packet_length == 0 {
            bail!("transport.max_packet_length must be non-zero");
        }
        if self.transport.channel_capacity == 0 {
            bail!("transport.channel_capacity must be non-zero");
        }
        for (i, axis) in self.axes.iter().enumerate() {
            if axis.limits.velocity < 0 || axis.limits.acceleration < 1 {
                bail!("axes[{}] has invalid limits {:?}", i, axis.limits);
            }
        }
        Ok(())
    }

    pub fn loop_period(&self) -> Duration {
        Duration::from_millis(self.loop_period_ms)
    }

    pub fn feedback_wait(&self) -> Duration {
        Duration::from_millis(self.feedback_wait_ms)
    }

    pub fn move_timing(&self) -> MoveTiming {
        MoveTiming {
            timeout: Duration::from_millis(self.move_timeout_ms),
            enable_settle: Duration::from_millis(self.enable_settle_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::axis::parameters::Setpoint;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let file = write_config("{}");
        let config = ControllerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.transport.local_port(config.board_id), 8888);
        assert_eq!(config.axes[3].setpoint, Setpoint::new(500, 250, 0));
    }

    #[test]
    fn test_partial_override() {
        let file = write_config(
            r#"{
                "board_id": 2,
                "transport": { "peer": "10.0.0.5:9999" },
                "telemetry": { "values_interval_ms": 500 },
                "choreography": { "primary": { "finish": 3500 } }
            }"#,
        );
        let config = ControllerConfig::from_json_file(file.path()).unwrap();

        assert_eq!(config.board_id, 2);
        assert_eq!(config.transport.local_addr(2).port(), 8890);
        assert_eq!(config.transport.peer.port(), 9999);
        assert_eq!(config.telemetry.values_interval_ms, Some(500));
        assert_eq!(config.telemetry.state_engine_interval_ms, 3000);
        assert_eq!(config.choreography.primary.finish, 3500);
        assert_eq!(config.choreography.primary.address, 2000);
    }

    #[test]
    fn test_rejects_board_zero() {
        let file = write_config(r#"{ "board_id": 0 }"#);
        assert!(ControllerConfig::from_json_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = ControllerConfig::from_json_file("/nonexistent/servoctl.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/servoctl.json"));
    }
}
