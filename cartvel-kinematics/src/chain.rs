use std::{fmt, path::Path};

use k::{joint::JointType, nalgebra as na};
use tracing::debug;

use crate::{errors::*, twist::Twist};

/// Serial kinematic chain from the base to the end-effector.
///
/// The structure never changes after construction. The joint positions stored
/// inside the `k` nodes are scratch values: every computation sets them first.
pub struct KinematicChain {
    arm: k::SerialChain<f64>,
    joint_names: Vec<String>,
}

impl KinematicChain {
    pub fn new(arm: k::SerialChain<f64>) -> Self {
        let joint_names = arm.iter_joints().map(|j| j.name.to_string()).collect();
        Self { arm, joint_names }
    }

    /// Builds the serial chain that ends at `end_joint_name` in `chain`.
    pub fn from_chain(chain: &k::Chain<f64>, end_joint_name: &str) -> Result<Self> {
        let end = chain
            .find(end_joint_name)
            .ok_or_else(|| Error::NotFound(end_joint_name.to_owned()))?;
        Ok(Self::new(k::SerialChain::from_end(end)))
    }

    /// Loads a URDF file and builds the serial chain that ends at `end_joint_name`.
    pub fn from_urdf_file<P: AsRef<Path>>(path: P, end_joint_name: &str) -> Result<Self> {
        let chain = k::Chain::<f64>::from_urdf_file(path.as_ref())?;
        let arm = Self::from_chain(&chain, end_joint_name)?;
        debug!(
            "loaded {:?}: {} joints up to {}",
            path.as_ref(),
            arm.dof(),
            end_joint_name
        );
        Ok(arm)
    }

    pub fn dof(&self) -> usize {
        self.joint_names.len()
    }

    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    fn check_len(&self, values: &[f64]) -> Result<()> {
        if values.len() == self.dof() {
            Ok(())
        } else {
            Err(Error::DofMismatch(self.dof(), values.len()))
        }
    }

    fn set_joint_positions(&self, positions: &[f64]) -> Result<()> {
        self.check_len(positions)?;
        self.arm.set_joint_positions_unchecked(positions);
        self.arm.update_transforms();
        Ok(())
    }

    /// Geometric Jacobian at `positions`.
    ///
    /// Expressed in the base frame with the reference point at the end-effector
    /// origin. Rows `0..3` are linear velocity and rows `3..6` angular velocity.
    pub fn jacobian(&self, positions: &[f64]) -> Result<na::Matrix6xX<f64>> {
        self.set_joint_positions(positions)?;
        let end = self.arm.end_transform().translation.vector;
        let mut jacobian = na::Matrix6xX::zeros(self.dof());
        let mut col = 0;
        for node in self.arm.iter() {
            // Both lock the node, so the transform is taken before the joint guard.
            let transform = node.world_transform();
            let joint = node.joint();
            let (axis, prismatic) = match joint.joint_type {
                JointType::Fixed => continue,
                JointType::Rotational { axis } => (axis, false),
                JointType::Linear { axis } => (axis, true),
            };
            let transform = transform
                .ok_or_else(|| Error::Degenerate(format!("no transform for {}", joint.name)))?;
            let axis = transform.rotation * axis.into_inner();
            let column = if prismatic {
                na::Vector6::new(axis.x, axis.y, axis.z, 0.0, 0.0, 0.0)
            } else {
                let linear = axis.cross(&(end - transform.translation.vector));
                na::Vector6::new(linear.x, linear.y, linear.z, axis.x, axis.y, axis.z)
            };
            jacobian.set_column(col, &column);
            col += 1;
        }
        if col != self.dof() {
            return Err(Error::DofMismatch(self.dof(), col));
        }
        Ok(jacobian)
    }

    /// Pose of the end-effector at `positions`.
    pub fn forward_position(&self, positions: &[f64]) -> Result<na::Isometry3<f64>> {
        self.set_joint_positions(positions)?;
        Ok(self.arm.end_transform())
    }

    /// Twist of the end-effector at `positions` moving with `velocities`.
    pub fn forward_velocity(&self, positions: &[f64], velocities: &[f64]) -> Result<Twist> {
        self.check_len(velocities)?;
        let jacobian = self.jacobian(positions)?;
        let twist = jacobian * na::DVector::from_column_slice(velocities);
        Ok(Twist::from_vector6(&twist))
    }
}

impl fmt::Debug for KinematicChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KinematicChain")
            .field("joint_names", &self.joint_names)
            .finish()
    }
}
