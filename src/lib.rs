pub mod axis;
pub mod controller;
pub mod protocol;
pub mod runtime;
pub mod sequencer;
pub mod transport;
