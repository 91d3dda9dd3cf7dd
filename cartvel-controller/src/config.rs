use std::path::Path;

use cartvel_kinematics::InverseVelocitySolverConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

/// What to command when the inverse velocity solver fails.
///
/// A damped solution is not a failure and is always used as it is.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SolverFailurePolicy {
    /// Command zero joint velocity.
    #[default]
    Zero,
    /// Repeat the joint velocities of the previous cycle.
    HoldLast,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Maximum rate of state reports in Hz. Reporting is disabled when `<= 0`.
    /// Required.
    pub publish_rate: Option<f64>,
    #[serde(default)]
    pub on_solver_failure: SolverFailurePolicy,
    #[serde(default)]
    pub solver: InverseVelocitySolverConfig,
}

impl ControllerConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_str(
            &std::fs::read_to_string(&path)
                .map_err(|e| Error::NoFile(path.as_ref().to_owned(), e))?,
            path,
        )
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str<P: AsRef<Path>>(s: &str, path: P) -> Result<Self, Error> {
        toml::from_str(s).map_err(|e| Error::TomlParseFailure(path.as_ref().to_owned(), e))
    }

    /// Returns the configured publish rate, failing if it was never set.
    pub fn publish_rate(&self) -> Result<f64, Error> {
        match self.publish_rate {
            Some(rate) if rate.is_nan() => Err(Error::InvalidParameter(
                "publish_rate is NaN".to_owned(),
            )),
            Some(rate) => Ok(rate),
            None => Err(Error::MissingParameter("publish_rate".to_owned())),
        }
    }
}
