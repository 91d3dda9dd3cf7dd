use crate::{error::Error, traits::JointHandle};

/// Measured positions and velocities of all joints, refreshed once per cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointState {
    pub positions: Vec<f64>,
    pub velocities: Vec<f64>,
}

impl JointState {
    /// Creates a zeroed state for `dof` joints.
    pub fn new(dof: usize) -> Self {
        Self {
            positions: vec![0.0; dof],
            velocities: vec![0.0; dof],
        }
    }

    pub fn dof(&self) -> usize {
        self.positions.len()
    }

    /// Overwrites the whole state from `handles`.
    ///
    /// The number of handles must match the state length. Nothing is written if
    /// it does not.
    pub fn read_from<J>(&mut self, handles: &[J]) -> Result<(), Error>
    where
        J: JointHandle,
    {
        if handles.len() != self.dof() {
            return Err(Error::LengthMismatch {
                model: self.dof(),
                input: handles.len(),
            });
        }
        for (i, handle) in handles.iter().enumerate() {
            self.positions[i] = handle.position()?;
            self.velocities[i] = handle.velocity()?;
        }
        Ok(())
    }
}
