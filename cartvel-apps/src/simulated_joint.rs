use std::time::Instant;

use cartvel_controller::CommandInterface;
use cartvel_hw::{Error, JointHandle};
use parking_lot::Mutex;

#[derive(Debug)]
struct PlantState {
    position: f64,
    velocity: f64,
    updated_at: Instant,
}

/// A joint that follows its commands in wall-clock time.
///
/// With the velocity interface the command is a velocity that the position
/// integrates until the next command. With the position interface the joint
/// reaches each commanded position at once and reports the mean velocity since
/// the previous command.
#[derive(Debug)]
pub struct SimulatedJoint {
    name: String,
    interface: CommandInterface,
    state: Mutex<PlantState>,
}

impl SimulatedJoint {
    pub fn new(name: impl Into<String>, interface: CommandInterface, position: f64) -> Self {
        Self::with_start_time(name, interface, position, Instant::now())
    }

    fn with_start_time(
        name: impl Into<String>,
        interface: CommandInterface,
        position: f64,
        now: Instant,
    ) -> Self {
        Self {
            name: name.into(),
            interface,
            state: Mutex::new(PlantState {
                position,
                velocity: 0.0,
                updated_at: now,
            }),
        }
    }

    pub fn interface(&self) -> CommandInterface {
        self.interface
    }

    fn position_at(&self, now: Instant) -> f64 {
        let mut state = self.state.lock();
        if self.interface == CommandInterface::Velocity {
            let dt = now.saturating_duration_since(state.updated_at).as_secs_f64();
            state.position += state.velocity * dt;
            state.updated_at = now;
        }
        state.position
    }

    fn command_at(&self, command: f64, now: Instant) {
        let mut state = self.state.lock();
        let dt = now.saturating_duration_since(state.updated_at).as_secs_f64();
        match self.interface {
            CommandInterface::Velocity => {
                state.position += state.velocity * dt;
                state.velocity = command;
            }
            CommandInterface::Position => {
                state.velocity = if dt > 0.0 {
                    (command - state.position) / dt
                } else {
                    0.0
                };
                state.position = command;
            }
        }
        state.updated_at = now;
    }
}

impl JointHandle for SimulatedJoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Result<f64, Error> {
        Ok(self.position_at(Instant::now()))
    }

    fn velocity(&self) -> Result<f64, Error> {
        Ok(self.state.lock().velocity)
    }

    fn set_command(&self, command: f64) -> Result<(), Error> {
        self.command_at(command, Instant::now());
        Ok(())
    }
}
