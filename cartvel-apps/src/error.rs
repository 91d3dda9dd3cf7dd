use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("cartvel-apps: Failed to parse {:?} as toml ({}).", .0, .1)]
    TomlParseFailure(PathBuf, #[source] toml::de::Error),
    #[error("cartvel-apps: No File {:?} is found ({}).", .0, .1)]
    NoFile(PathBuf, #[source] std::io::Error),
    #[error("cartvel-apps: No ParentDirectory {:?} is found.", .0)]
    NoParentDirectory(PathBuf),
    #[error("cartvel-apps: Parameter '{}' not set", .0)]
    MissingParameter(String),
    #[error("cartvel-apps: Invalid parameter: {}", .0)]
    InvalidParameter(String),
    #[error("cartvel-apps: Invalid twist {:?}: {}", .0, .1)]
    InvalidTwist(String, String),
    #[error("cartvel-apps: cartvel-controller: {:?}", .0)]
    Controller(#[from] cartvel_controller::Error),
    #[error("cartvel-apps: cartvel-kinematics: {:?}", .0)]
    Kinematics(#[from] cartvel_kinematics::Error),
}
