#![doc = include_str!("../README.md")]

mod chain;
mod errors;
mod solver;
mod twist;

pub mod sample;

pub use crate::{chain::*, errors::*, solver::*, twist::*};

// re-export
pub use k::{nalgebra, Isometry3, Translation3, UnitQuaternion, Vector3};
