use std::{fmt, sync::Arc, time::Duration};

use cartvel_hw::{JointHandle, JointState};
use cartvel_kinematics::{InverseVelocitySolver, Isometry3, KinematicChain, Twist};
use tracing::{debug, info, warn};

use crate::{
    CommandWriter, ControllerConfig, DesiredTwist, Error, PublishOutcome, RateLimitedReporter,
    ReportSink, SolverFailurePolicy, StateReport, TwistCommander,
};

/// What happened during one [`CartesianVelocityController::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// The solver was near a singularity and damped its solution.
    pub solution_damped: bool,
    /// The solver failed and the failure policy picked the command.
    pub solver_failed: bool,
    pub publish: PublishOutcome,
}

/// Tracks a commanded end-effector twist by converting it into joint
/// commands once per control cycle.
pub struct CartesianVelocityController<J, W = Box<dyn CommandWriter<J>>> {
    chain: KinematicChain,
    solver: Box<dyn InverseVelocitySolver>,
    handles: Vec<J>,
    writer: W,
    desired_twist: Arc<DesiredTwist>,
    joint_state: JointState,
    joint_command: Vec<f64>,
    achieved_pose: Isometry3<f64>,
    achieved_twist: Twist,
    reporter: RateLimitedReporter,
    on_solver_failure: SolverFailurePolicy,
    solver_failing: bool,
}

impl<J, W> CartesianVelocityController<J, W>
where
    J: JointHandle,
    W: CommandWriter<J>,
{
    /// Creates a controller driving `handles`, one per movable joint of `chain`
    /// in chain order.
    pub fn new<S>(
        config: &ControllerConfig,
        chain: KinematicChain,
        handles: Vec<J>,
        writer: W,
        sink: S,
    ) -> Result<Self, Error>
    where
        S: ReportSink<StateReport>,
    {
        let publish_rate = config.publish_rate()?;
        if handles.len() != chain.dof() {
            return Err(Error::LengthMismatch {
                model: chain.dof(),
                input: handles.len(),
            });
        }
        if handles
            .iter()
            .zip(chain.joint_names())
            .any(|(handle, name)| handle.name() != name)
        {
            return Err(Error::JointNamesMismatch {
                chain: chain.joint_names().to_vec(),
                handles: handles.iter().map(|h| h.name().to_owned()).collect(),
            });
        }
        let solver = config.solver.create_solver()?;
        let reporter = RateLimitedReporter::new(publish_rate, sink)?;
        let dof = chain.dof();
        debug!(
            "controller for {:?} using {solver:?} and {writer:?}",
            chain.joint_names()
        );
        Ok(Self {
            chain,
            solver,
            handles,
            writer,
            desired_twist: Arc::new(DesiredTwist::new()),
            joint_state: JointState::new(dof),
            joint_command: vec![0.0; dof],
            achieved_pose: Isometry3::identity(),
            achieved_twist: Twist::zero(),
            reporter,
            on_solver_failure: config.on_solver_failure,
            solver_failing: false,
        })
    }

    /// Returns a handle that producers use to set the desired twist.
    pub fn twist_commander(&self) -> TwistCommander {
        TwistCommander::new(self.desired_twist.clone())
    }

    /// Resets the desired twist and the joint command to zero and restarts the
    /// publish cadence at `time`.
    pub fn starting(&mut self, time: Duration) {
        self.desired_twist.reset();
        self.joint_command.iter_mut().for_each(|v| *v = 0.0);
        self.reporter.reset(time);
        self.solver_failing = false;
        info!("controller started at {time:?}");
    }

    /// Runs one control cycle at controller time `time`. `period` is the time
    /// elapsed since the previous cycle.
    ///
    /// If the joint state cannot be read, zero joint velocity is commanded from
    /// the last readable state before the error is returned.
    pub fn update(&mut self, time: Duration, period: Duration) -> Result<CycleOutcome, Error> {
        if let Err(e) = self.joint_state.read_from(&self.handles) {
            self.command_stop(period);
            return Err(e.into());
        }
        let twist = self.desired_twist.load();

        let mut solution_damped = false;
        let mut solver_failed = false;
        match self
            .solver
            .solve(&self.chain, &self.joint_state.positions, &twist)
        {
            Ok(solution) => {
                if self.solver_failing {
                    info!("inverse velocity solver recovered");
                    self.solver_failing = false;
                }
                solution_damped = solution.damped;
                self.joint_command = solution.joint_velocities;
            }
            Err(e) => {
                if !self.solver_failing {
                    warn!(
                        "inverse velocity solver failed, commanding {:?}: {e}",
                        self.on_solver_failure
                    );
                    self.solver_failing = true;
                }
                solver_failed = true;
                if self.on_solver_failure == SolverFailurePolicy::Zero {
                    self.joint_command.iter_mut().for_each(|v| *v = 0.0);
                }
            }
        }

        self.writer
            .write(&self.handles, &self.joint_state, &self.joint_command, period)?;

        self.achieved_twist = self
            .chain
            .forward_velocity(&self.joint_state.positions, &self.joint_state.velocities)?;
        self.achieved_pose = self.chain.forward_position(&self.joint_state.positions)?;

        let publish = self
            .reporter
            .report(time, &self.achieved_pose, &self.achieved_twist);
        Ok(CycleOutcome {
            solution_damped,
            solver_failed,
            publish,
        })
    }

    fn command_stop(&mut self, period: Duration) {
        self.joint_command.iter_mut().for_each(|v| *v = 0.0);
        if let Err(e) = self
            .writer
            .write(&self.handles, &self.joint_state, &self.joint_command, period)
        {
            debug!("failed to command stop: {e}");
        }
    }

    pub fn chain(&self) -> &KinematicChain {
        &self.chain
    }

    pub fn handles(&self) -> &[J] {
        &self.handles
    }

    /// Joint state read in the last cycle.
    pub fn joint_state(&self) -> &JointState {
        &self.joint_state
    }

    /// Joint velocities commanded in the last cycle.
    pub fn last_joint_command(&self) -> &[f64] {
        &self.joint_command
    }

    pub fn achieved_pose(&self) -> &Isometry3<f64> {
        &self.achieved_pose
    }

    pub fn achieved_twist(&self) -> &Twist {
        &self.achieved_twist
    }

    pub fn reporter(&self) -> &RateLimitedReporter {
        &self.reporter
    }
}

impl<J, W> fmt::Debug for CartesianVelocityController<J, W>
where
    W: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartesianVelocityController")
            .field("chain", &self.chain)
            .field("solver", &self.solver)
            .field("writer", &self.writer)
            .field("on_solver_failure", &self.on_solver_failure)
            .finish_non_exhaustive()
    }
}
