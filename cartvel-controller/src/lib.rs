#![doc = include_str!("../README.md")]

mod command_writer;
mod config;
mod control_loop;
mod controller;
mod desired_twist;
mod error;
mod realtime_publisher;
mod reporter;

pub use crate::{
    command_writer::*, config::*, control_loop::*, controller::*, desired_twist::*, error::*,
    realtime_publisher::*, reporter::*,
};
