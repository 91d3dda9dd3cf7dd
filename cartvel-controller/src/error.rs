use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("cartvel-controller: Parameter '{}' not set", .0)]
    MissingParameter(String),
    #[error("cartvel-controller: Invalid parameter: {}", .0)]
    InvalidParameter(String),
    #[error("cartvel-controller: Length mismatch (model = {}, input = {})", model, input)]
    LengthMismatch { model: usize, input: usize },
    #[error(
        "cartvel-controller: Joint names mismatch : chain = {:?}, handles = {:?}",
        chain,
        handles
    )]
    JointNamesMismatch {
        chain: Vec<String>,
        handles: Vec<String>,
    },
    #[error("cartvel-controller: Report sink disconnected")]
    Disconnected,
    #[error("cartvel-controller: Failed to spawn thread ({})", .0)]
    Spawn(#[source] std::io::Error),
    #[error("cartvel-controller: No File {:?} is found ({}).", .0, .1)]
    NoFile(PathBuf, #[source] std::io::Error),
    #[error("cartvel-controller: Failed to parse {:?} as toml ({}).", .0, .1)]
    TomlParseFailure(PathBuf, #[source] toml::de::Error),
    #[error("cartvel-controller: cartvel-hw: {:?}", .0)]
    Hardware(#[from] cartvel_hw::Error),
    #[error("cartvel-controller: cartvel-kinematics: {:?}", .0)]
    Kinematics(#[from] cartvel_kinematics::Error),
}
