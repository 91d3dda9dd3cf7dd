use thiserror::Error;

/// Error for `cartvel_kinematics`
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("cartvel-kinematics: DoF mismatch {} != {}", .0, .1)]
    DofMismatch(usize, usize),
    #[error("cartvel-kinematics: Joint {} not found", .0)]
    NotFound(String),
    #[error("cartvel-kinematics: Degenerate chain: {}", .0)]
    Degenerate(String),
    #[error("cartvel-kinematics: Invalid parameter: {}", .0)]
    InvalidParameter(String),
    #[error("cartvel-kinematics: URDF error: {:?}", source)]
    Urdf {
        #[from]
        source: urdf_rs::UrdfError,
    },
    #[error("cartvel-kinematics: Kinematics error: {:?}", source)]
    Kinematics {
        #[from]
        source: k::Error,
    },
}

/// Result for `cartvel_kinematics`
pub type Result<T> = ::std::result::Result<T, Error>;
