use std::{fmt, time::Duration};

use auto_impl::auto_impl;
use cartvel_hw::{JointHandle, JointState};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Turns the solved joint velocities into one command per joint.
///
/// Each call writes exactly one command slot per joint and changes nothing else.
#[auto_impl(&, Box, Arc)]
pub trait CommandWriter<J: JointHandle>: fmt::Debug + Send + Sync {
    fn write(
        &self,
        handles: &[J],
        joint_state: &JointState,
        joint_velocities: &[f64],
        period: Duration,
    ) -> Result<(), Error>;
}

fn check_lengths<J>(handles: &[J], joint_state: &JointState, joint_velocities: &[f64]) -> Result<(), Error> {
    for len in [joint_state.dof(), joint_velocities.len()] {
        if len != handles.len() {
            return Err(Error::LengthMismatch {
                model: handles.len(),
                input: len,
            });
        }
    }
    Ok(())
}

/// For actuators that take a velocity setpoint: writes the joint velocity as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityCommandWriter;

impl<J: JointHandle> CommandWriter<J> for VelocityCommandWriter {
    fn write(
        &self,
        handles: &[J],
        joint_state: &JointState,
        joint_velocities: &[f64],
        _period: Duration,
    ) -> Result<(), Error> {
        check_lengths(handles, joint_state, joint_velocities)?;
        for (handle, velocity) in handles.iter().zip(joint_velocities) {
            handle.set_command(*velocity)?;
        }
        Ok(())
    }
}

/// For actuators that only take a position setpoint: writes one explicit Euler
/// step, `position + velocity * period`, from the position measured this cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionCommandWriter;

impl<J: JointHandle> CommandWriter<J> for PositionCommandWriter {
    fn write(
        &self,
        handles: &[J],
        joint_state: &JointState,
        joint_velocities: &[f64],
        period: Duration,
    ) -> Result<(), Error> {
        check_lengths(handles, joint_state, joint_velocities)?;
        let dt = period.as_secs_f64();
        for ((handle, position), velocity) in handles
            .iter()
            .zip(&joint_state.positions)
            .zip(joint_velocities)
        {
            handle.set_command(position + velocity * dt)?;
        }
        Ok(())
    }
}

/// The kind of command slot the joint handles expose.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CommandInterface {
    #[default]
    Velocity,
    Position,
}

impl CommandInterface {
    pub fn writer<J: JointHandle>(self) -> Box<dyn CommandWriter<J>> {
        match self {
            Self::Velocity => Box::new(VelocityCommandWriter),
            Self::Position => Box::new(PositionCommandWriter),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use cartvel_hw::DummyJoint;

    use super::*;

    fn joints(positions: &[f64]) -> (Vec<DummyJoint>, JointState) {
        let handles: Vec<_> = (0..positions.len())
            .map(|i| DummyJoint::new(format!("j{i}")))
            .collect();
        for (handle, position) in handles.iter().zip(positions) {
            handle.set_state(*position, 0.0);
        }
        let mut state = JointState::new(handles.len());
        state.read_from(&handles).unwrap();
        (handles, state)
    }

    #[test]
    fn test_velocity_writer_ignores_period() {
        let (handles, state) = joints(&[0.5, -1.0, 2.0]);
        let velocities = [0.1, -0.2, 0.3];
        for period in [Duration::ZERO, Duration::from_millis(1), Duration::from_secs(3)] {
            VelocityCommandWriter
                .write(&handles, &state, &velocities, period)
                .unwrap();
            for (handle, velocity) in handles.iter().zip(velocities) {
                assert_eq!(handle.command(), velocity);
            }
        }
    }

    #[test]
    fn test_position_writer_integrates_one_step() {
        let (handles, state) = joints(&[0.5, -1.0, 2.0]);
        let velocities = [0.1, -0.2, 0.3];
        let period = Duration::from_millis(20);
        PositionCommandWriter
            .write(&handles, &state, &velocities, period)
            .unwrap();
        assert_approx_eq!(handles[0].command(), 0.5 + 0.1 * 0.02);
        assert_approx_eq!(handles[1].command(), -1.0 - 0.2 * 0.02);
        assert_approx_eq!(handles[2].command(), 2.0 + 0.3 * 0.02);
        // Measured positions are untouched.
        assert_approx_eq!(handles[0].position().unwrap(), 0.5);
    }

    #[test]
    fn test_length_mismatch() {
        let (handles, state) = joints(&[0.0, 0.0]);
        let err = VelocityCommandWriter
            .write(&handles, &state, &[0.0], Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { model: 2, input: 1 }));
        assert_eq!(handles[0].command(), 0.0);
    }

    #[test]
    fn test_interface_selects_writer() {
        let (handles, state) = joints(&[1.0]);
        let period = Duration::from_millis(100);
        CommandInterface::Velocity
            .writer::<DummyJoint>()
            .write(&handles, &state, &[2.0], period)
            .unwrap();
        assert_approx_eq!(handles[0].command(), 2.0);
        CommandInterface::Position
            .writer::<DummyJoint>()
            .write(&handles, &state, &[2.0], period)
            .unwrap();
        assert_approx_eq!(handles[0].command(), 1.2);
    }
}
