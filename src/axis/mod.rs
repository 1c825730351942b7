pub mod alerts;
pub mod fault;
pub mod move_machine;
pub mod parameters;
pub mod simulated;
pub mod state;
pub mod store;

#[cfg(test)]
pub mod testing;

use alerts::AlertRegister;

/// Number of axes driven by one controller instance.
pub const AXES_PER_BOARD: usize = 4;

/// Hardware interface of one step/direction servo connector.
///
/// Every call must return promptly; the control loop calls these from a
/// single task once per iteration.
pub trait MotorAxis: Send {
    /// Level of the external digital input that gates this axis' enable line.
    fn enable_input(&self) -> bool;

    fn enable_requested(&self) -> bool;
    fn set_enable_request(&mut self, enabled: bool);

    fn set_velocity_max(&mut self, velocity: i32);
    fn set_acceleration_max(&mut self, acceleration: i32);

    fn move_absolute(&mut self, position: i32);

    fn steps_complete(&self) -> bool;
    fn hlfb_asserted(&self) -> bool;

    fn velocity_commanded(&self) -> i32;
    fn position_commanded(&self) -> i32;

    /// Redefine the current commanded position without moving.
    fn set_position_reference(&mut self, position: i32);

    fn alerts(&self) -> AlertRegister;
    fn clear_alerts(&mut self);

    fn is_move_complete(&self) -> bool {
        self.steps_complete() && self.hlfb_asserted()
    }
}

/// Console-facing axis number for a board-local servo (1..=4).
///
/// A second board's servos 1-4 are shown as axes 5-8 by the operator console;
/// the controller itself only ever addresses its local servos.
pub fn logical_axis(board_id: u8, servo: usize) -> usize {
    servo + AXES_PER_BOARD * (board_id.max(1) as usize - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_axis_offsets_second_board() {
        assert_eq!(logical_axis(1, 1), 1);
        assert_eq!(logical_axis(1, 4), 4);
        assert_eq!(logical_axis(2, 1), 5);
        assert_eq!(logical_axis(2, 4), 8);
    }
}
