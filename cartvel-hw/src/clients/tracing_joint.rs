use tracing::trace;

use crate::{error::Error, traits::JointHandle};

/// Wraps a joint handle and emits a `trace` event for every call.
#[derive(Debug)]
pub struct TracingJointHandle<J>(J);

impl<J> TracingJointHandle<J> {
    pub fn new(handle: J) -> Self {
        Self(handle)
    }

    pub fn get_ref(&self) -> &J {
        &self.0
    }

    pub fn into_inner(self) -> J {
        self.0
    }
}

impl<J> From<J> for TracingJointHandle<J> {
    fn from(value: J) -> Self {
        Self::new(value)
    }
}

impl<J: JointHandle> JointHandle for TracingJointHandle<J> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn position(&self) -> Result<f64, Error> {
        let position = self.0.position()?;
        trace!(
            method = "cartvel_hw::JointHandle::position",
            joint = self.0.name(),
            ?position
        );
        Ok(position)
    }

    fn velocity(&self) -> Result<f64, Error> {
        let velocity = self.0.velocity()?;
        trace!(
            method = "cartvel_hw::JointHandle::velocity",
            joint = self.0.name(),
            ?velocity
        );
        Ok(velocity)
    }

    fn set_command(&self, command: f64) -> Result<(), Error> {
        trace!(
            method = "cartvel_hw::JointHandle::set_command",
            joint = self.0.name(),
            ?command
        );
        self.0.set_command(command)
    }
}
