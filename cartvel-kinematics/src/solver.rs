use std::fmt;

use auto_impl::auto_impl;
use k::nalgebra as na;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{chain::KinematicChain, errors::*, twist::Twist};

const SVD_MAX_ITERATIONS: usize = 1000;

/// Output of an inverse velocity solve.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseVelocitySolution {
    pub joint_velocities: Vec<f64>,
    /// Smallest singular value of the Jacobian at the solved configuration.
    pub min_singular_value: f64,
    /// `true` if singular values were damped or dropped, i.e. the twist is tracked
    /// with reduced accuracy.
    pub damped: bool,
}

/// Maps a desired end-effector twist to joint velocities.
#[auto_impl(&, Box, Arc)]
pub trait InverseVelocitySolver: fmt::Debug + Send + Sync {
    fn solve(
        &self,
        chain: &KinematicChain,
        positions: &[f64],
        twist: &Twist,
    ) -> Result<InverseVelocitySolution>;
}

/// Thin SVD of the Jacobian, `J = U S V^T`.
struct JacobianSvd {
    u: na::DMatrix<f64>,
    singular_values: na::DVector<f64>,
    v_t: na::DMatrix<f64>,
}

impl JacobianSvd {
    fn new(chain: &KinematicChain, positions: &[f64]) -> Result<Self> {
        let jacobian = chain.jacobian(positions)?;
        let jacobian = na::DMatrix::from_iterator(6, chain.dof(), jacobian.iter().cloned());
        if jacobian.iter().any(|v| !v.is_finite()) {
            return Err(Error::Degenerate("jacobian is not finite".to_owned()));
        }
        let svd = jacobian
            .try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
            .ok_or_else(|| Error::Degenerate("svd did not converge".to_owned()))?;
        match (svd.u, svd.v_t) {
            (Some(u), Some(v_t)) => Ok(Self {
                u,
                singular_values: svd.singular_values,
                v_t,
            }),
            _ => Err(Error::Degenerate("svd returned no basis".to_owned())),
        }
    }

    fn min_singular_value(&self) -> f64 {
        self.singular_values
            .iter()
            .cloned()
            .fold(f64::INFINITY, f64::min)
    }

    /// `V diag(gain(s_i)) U^T x`
    fn solve_with<F>(&self, twist: &Twist, gain: F) -> Result<Vec<f64>>
    where
        F: Fn(f64) -> f64,
    {
        let x = na::DVector::from_column_slice(&twist.to_array());
        let mut projected = self.u.transpose() * x;
        for (value, sigma) in projected.iter_mut().zip(self.singular_values.iter()) {
            *value *= gain(*sigma);
        }
        let joint_velocities = self.v_t.transpose() * projected;
        if joint_velocities.iter().any(|v| !v.is_finite()) {
            return Err(Error::Degenerate(
                "joint velocities are not finite".to_owned(),
            ));
        }
        Ok(joint_velocities.iter().cloned().collect())
    }
}

/// Damped least squares with damping that only switches on near singularities.
///
/// Every singular value `s` is inverted as `s / (s^2 + lambda^2)`. `lambda` is zero
/// while the smallest singular value stays above `epsilon` and grows smoothly up to
/// `max_damping` as it approaches zero. No singular value is then inverted with a
/// gain above `1 / (2 * lambda)`, which keeps joint velocities bounded at a singularity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampedLeastSquaresSolver {
    epsilon: f64,
    max_damping: f64,
}

impl DampedLeastSquaresSolver {
    pub fn new(epsilon: f64, max_damping: f64) -> Result<Self> {
        if !(epsilon > 0.0 && epsilon.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "epsilon must be positive, got {epsilon}"
            )));
        }
        if !(max_damping > 0.0 && max_damping.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "max_damping must be positive, got {max_damping}"
            )));
        }
        Ok(Self {
            epsilon,
            max_damping,
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn max_damping(&self) -> f64 {
        self.max_damping
    }

    /// `lambda^2` for the given smallest singular value.
    pub fn damping_squared(&self, min_singular_value: f64) -> f64 {
        if min_singular_value >= self.epsilon {
            0.0
        } else {
            let ratio = min_singular_value / self.epsilon;
            (1.0 - ratio * ratio) * self.max_damping * self.max_damping
        }
    }
}

impl Default for DampedLeastSquaresSolver {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
            max_damping: default_max_damping(),
        }
    }
}

impl InverseVelocitySolver for DampedLeastSquaresSolver {
    fn solve(
        &self,
        chain: &KinematicChain,
        positions: &[f64],
        twist: &Twist,
    ) -> Result<InverseVelocitySolution> {
        let svd = JacobianSvd::new(chain, positions)?;
        let min_singular_value = svd.min_singular_value();
        let lambda_squared = self.damping_squared(min_singular_value);
        let joint_velocities = svd.solve_with(twist, |sigma| {
            let denominator = sigma * sigma + lambda_squared;
            if denominator > 0.0 {
                sigma / denominator
            } else {
                0.0
            }
        })?;
        Ok(InverseVelocitySolution {
            joint_velocities,
            min_singular_value,
            damped: lambda_squared > 0.0,
        })
    }
}

/// Pseudo-inverse that drops singular values below `epsilon`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruncatedPseudoInverseSolver {
    epsilon: f64,
}

impl TruncatedPseudoInverseSolver {
    pub fn new(epsilon: f64) -> Result<Self> {
        if !(epsilon > 0.0 && epsilon.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "epsilon must be positive, got {epsilon}"
            )));
        }
        Ok(Self { epsilon })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl Default for TruncatedPseudoInverseSolver {
    fn default() -> Self {
        Self {
            epsilon: default_truncation_epsilon(),
        }
    }
}

impl InverseVelocitySolver for TruncatedPseudoInverseSolver {
    fn solve(
        &self,
        chain: &KinematicChain,
        positions: &[f64],
        twist: &Twist,
    ) -> Result<InverseVelocitySolution> {
        let svd = JacobianSvd::new(chain, positions)?;
        let min_singular_value = svd.min_singular_value();
        let epsilon = self.epsilon;
        let joint_velocities = svd.solve_with(twist, |sigma| {
            if sigma < epsilon {
                0.0
            } else {
                1.0 / sigma
            }
        })?;
        Ok(InverseVelocitySolution {
            joint_velocities,
            min_singular_value,
            damped: min_singular_value < epsilon,
        })
    }
}

/// Which inverse velocity solver to use, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InverseVelocitySolverConfig {
    DampedLeastSquares {
        /// Smallest singular value below which damping starts.
        #[serde(default = "default_epsilon")]
        epsilon: f64,
        /// Damping applied at an exact singularity.
        #[serde(default = "default_max_damping")]
        max_damping: f64,
    },
    TruncatedPseudoInverse {
        /// Singular values below this are ignored.
        #[serde(default = "default_truncation_epsilon")]
        epsilon: f64,
    },
}

impl Default for InverseVelocitySolverConfig {
    fn default() -> Self {
        Self::DampedLeastSquares {
            epsilon: default_epsilon(),
            max_damping: default_max_damping(),
        }
    }
}

impl InverseVelocitySolverConfig {
    pub fn create_solver(&self) -> Result<Box<dyn InverseVelocitySolver>> {
        Ok(match *self {
            Self::DampedLeastSquares {
                epsilon,
                max_damping,
            } => Box::new(DampedLeastSquaresSolver::new(epsilon, max_damping)?),
            Self::TruncatedPseudoInverse { epsilon } => {
                Box::new(TruncatedPseudoInverseSolver::new(epsilon)?)
            }
        })
    }
}

fn default_epsilon() -> f64 {
    0.01
}

fn default_max_damping() -> f64 {
    0.05
}

fn default_truncation_epsilon() -> f64 {
    1e-5
}
