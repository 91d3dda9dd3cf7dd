#![doc = include_str!("../README.md")]

mod clients;
mod error;
mod joint_state;
mod traits;

pub use clients::*;
pub use error::*;
pub use joint_state::*;
pub use traits::*;
