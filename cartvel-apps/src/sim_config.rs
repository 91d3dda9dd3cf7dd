use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use cartvel_controller::{CommandInterface, ControllerConfig};
use cartvel_kinematics::{sample, KinematicChain};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, SimulatedJoint};

/// Configuration of the `cartvel-sim` application.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// URDF file of the arm, relative to this config file. The built-in 6-axis
    /// sample arm is used if unset.
    pub urdf_path: Option<String>,
    #[serde(skip)]
    urdf_full_path: Option<PathBuf>,
    /// Last joint of the controlled chain. Required with `urdf_path`.
    pub end_joint_name: Option<String>,
    #[serde(default)]
    pub command_interface: CommandInterface,
    /// Control cycles per second.
    #[serde(default = "default_control_frequency")]
    pub control_frequency: f64,
    /// Joint positions at start, in chain order. All zero if empty.
    #[serde(default)]
    pub initial_positions: Vec<f64>,
    /// Required, and so is its `publish_rate`.
    pub controller: ControllerConfig,
}

fn default_control_frequency() -> f64 {
    100.0
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            urdf_path: None,
            urdf_full_path: None,
            end_joint_name: None,
            command_interface: CommandInterface::default(),
            control_frequency: default_control_frequency(),
            // Away from the singularities of the sample arm.
            initial_positions: vec![0.0, 0.6, 1.2, 0.0, 0.8, 0.0],
            controller: ControllerConfig {
                publish_rate: Some(50.0),
                ..Default::default()
            },
        }
    }
}

impl SimConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_str(
            &std::fs::read_to_string(&path)
                .map_err(|e| Error::NoFile(path.as_ref().to_owned(), e))?,
            path,
        )
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str<P: AsRef<Path>>(s: &str, path: P) -> Result<Self, Error> {
        let mut config: SimConfig =
            toml::from_str(s).map_err(|e| Error::TomlParseFailure(path.as_ref().to_owned(), e))?;
        if let Some(urdf_path) = &config.urdf_path {
            config.urdf_full_path = Some(resolve_relative_path(path.as_ref(), urdf_path)?);
        }
        debug!("{config:?}");
        Ok(config)
    }

    /// URDF path resolved against the config file location.
    pub fn urdf_full_path(&self) -> Option<&Path> {
        self.urdf_full_path
            .as_deref()
            .or_else(|| self.urdf_path.as_deref().map(Path::new))
    }

    pub fn control_period(&self) -> Result<Duration, Error> {
        if !(self.control_frequency.is_finite() && self.control_frequency > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "control_frequency must be positive, got {}",
                self.control_frequency
            )));
        }
        Duration::try_from_secs_f64(1.0 / self.control_frequency)
            .map_err(|e| Error::InvalidParameter(format!("control_frequency: {e}")))
    }

    pub fn create_chain(&self) -> Result<KinematicChain, Error> {
        match self.urdf_full_path() {
            Some(urdf_path) => {
                let end_joint_name = self
                    .end_joint_name
                    .as_deref()
                    .ok_or_else(|| Error::MissingParameter("end_joint_name".to_owned()))?;
                Ok(KinematicChain::from_urdf_file(urdf_path, end_joint_name)?)
            }
            None => Ok(sample::six_dof_arm()),
        }
    }

    /// Creates one simulated joint per joint of `chain`.
    pub fn create_joints(&self, chain: &KinematicChain) -> Result<Vec<Arc<SimulatedJoint>>, Error> {
        let positions = if self.initial_positions.is_empty() {
            vec![0.0; chain.dof()]
        } else if self.initial_positions.len() == chain.dof() {
            self.initial_positions.clone()
        } else {
            return Err(Error::InvalidParameter(format!(
                "initial_positions has {} values but the chain has {} joints",
                self.initial_positions.len(),
                chain.dof()
            )));
        };
        Ok(chain
            .joint_names()
            .iter()
            .zip(positions)
            .map(|(name, position)| {
                Arc::new(SimulatedJoint::new(
                    name.clone(),
                    self.command_interface,
                    position,
                ))
            })
            .collect())
    }
}

fn resolve_relative_path(base_path: &Path, path: &str) -> Result<PathBuf, Error> {
    Ok(base_path
        .parent()
        .ok_or_else(|| Error::NoParentDirectory(base_path.to_owned()))?
        .join(path))
}
