mod joint_handle;

pub use joint_handle::*;
