use parking_lot::Mutex;

use crate::{error::Error, traits::JointHandle};

/// A joint handle backed by plain memory.
///
/// The measured state only changes through [`DummyJoint::set_state`]; commands are
/// stored and can be read back with [`DummyJoint::command`].
#[derive(Debug)]
pub struct DummyJoint {
    name: String,
    pub current_position: Mutex<f64>,
    pub current_velocity: Mutex<f64>,
    pub current_command: Mutex<f64>,
}

impl DummyJoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current_position: Mutex::new(0f64),
            current_velocity: Mutex::new(0f64),
            current_command: Mutex::new(0f64),
        }
    }

    /// Creates one dummy joint per name.
    pub fn from_names<S>(names: impl IntoIterator<Item = S>) -> Vec<Self>
    where
        S: Into<String>,
    {
        names.into_iter().map(Self::new).collect()
    }

    pub fn set_state(&self, position: f64, velocity: f64) {
        *self.current_position.lock() = position;
        *self.current_velocity.lock() = velocity;
    }

    /// Returns the last value written with [`JointHandle::set_command`].
    pub fn command(&self) -> f64 {
        *self.current_command.lock()
    }
}

impl JointHandle for DummyJoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Result<f64, Error> {
        Ok(*self.current_position.lock())
    }

    fn velocity(&self) -> Result<f64, Error> {
        Ok(*self.current_velocity.lock())
    }

    fn set_command(&self, command: f64) -> Result<(), Error> {
        *self.current_command.lock() = command;
        Ok(())
    }
}
