/// Snapshot of a drive's alert register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertRegister {
    pub motion_canceled_in_alert: bool,
    pub motion_canceled_positive_limit: bool,
    pub motion_canceled_negative_limit: bool,
    pub motion_canceled_sensor_estop: bool,
    pub motion_canceled_motor_disabled: bool,
    pub motor_faulted: bool,
}

impl AlertRegister {
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn faulted() -> Self {
        Self {
            motor_faulted: true,
            ..Self::default()
        }
    }

    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }

    pub fn any_active(&self) -> bool {
        !self.is_clear()
    }

    pub fn has_limit(&self) -> bool {
        self.motion_canceled_positive_limit || self.motion_canceled_negative_limit
    }

    pub fn active_names(&self) -> Vec<&'static str> {
        [
            (self.motion_canceled_in_alert, "MotionCanceledInAlert"),
            (
                self.motion_canceled_positive_limit,
                "MotionCanceledPositiveLimit",
            ),
            (
                self.motion_canceled_negative_limit,
                "MotionCanceledNegativeLimit",
            ),
            (self.motion_canceled_sensor_estop, "MotionCanceledSensorEStop"),
            (
                self.motion_canceled_motor_disabled,
                "MotionCanceledMotorDisabled",
            ),
            (self.motor_faulted, "MotorFaulted"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}

impl std::fmt::Display for AlertRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_clear() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.active_names().join(", "))
        }
    }
}
