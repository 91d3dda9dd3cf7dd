#![doc = include_str!("../README.md")]

mod error;
mod report_line;
mod sim_config;
mod simulated_joint;
mod twist_input;
pub mod utils;

pub use crate::{error::*, report_line::*, sim_config::*, simulated_joint::*, twist_input::*};
