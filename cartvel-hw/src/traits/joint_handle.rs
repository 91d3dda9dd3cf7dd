use auto_impl::auto_impl;

use crate::error::Error;

/// One actuated joint as seen by a controller.
///
/// The handle reads back the measured state and owns a single command slot.
/// Whether the command is interpreted as a velocity or a position setpoint is
/// decided by the hardware interface the handle belongs to, not by the handle.
#[auto_impl(&, Box, Arc)]
pub trait JointHandle: Send + Sync {
    /// Returns the name of the joint.
    fn name(&self) -> &str;

    /// Returns the measured joint position.
    fn position(&self) -> Result<f64, Error>;

    /// Returns the measured joint velocity.
    fn velocity(&self) -> Result<f64, Error>;

    /// Writes the command slot of this joint.
    fn set_command(&self, command: f64) -> Result<(), Error>;
}
