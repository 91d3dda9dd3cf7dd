use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use cartvel_hw::JointHandle;
use tracing::{debug, error, info};

use crate::{CartesianVelocityController, CommandWriter, Error};

/// Sleeps until `target_time` when dropped.
struct ScopedSleep {
    target_time: Instant,
}

impl ScopedSleep {
    fn until(target_time: Instant) -> Self {
        Self { target_time }
    }
}

impl Drop for ScopedSleep {
    fn drop(&mut self) {
        let now = Instant::now();
        if now < self.target_time {
            thread::sleep(self.target_time - now);
        }
    }
}

/// Returns the first deadline on the `period` grid after `deadline` that is not
/// earlier than `now`, and how many grid points were skipped to get there.
fn next_deadline(deadline: Instant, period: Duration, now: Instant) -> (Instant, u32) {
    let next = deadline + period;
    if next >= now {
        return (next, 0);
    }
    let behind = (now - next).as_nanos() / period.as_nanos();
    let skipped = u32::try_from(behind + 1).unwrap_or(u32::MAX);
    match next.checked_add(period.saturating_mul(skipped)) {
        Some(next) => (next, skipped),
        None => (now, skipped),
    }
}

/// Runs a [`CartesianVelocityController`] on its own thread at a fixed period.
#[derive(Debug)]
pub struct ControlLoop;

impl ControlLoop {
    /// Calls [`starting`](CartesianVelocityController::starting) once and then
    /// [`update`](CartesianVelocityController::update) every `period` until the
    /// returned handle is stopped.
    ///
    /// Controller time is measured from the spawn. Cycles that miss their
    /// deadline are not made up; the loop continues at the next deadline on the
    /// grid. Errors from `update` are logged and the loop keeps running.
    pub fn spawn<J, W>(
        mut controller: CartesianVelocityController<J, W>,
        period: Duration,
    ) -> Result<ControlLoopHandle<J, W>, Error>
    where
        J: JointHandle + 'static,
        W: CommandWriter<J> + 'static,
    {
        if period.is_zero() {
            return Err(Error::InvalidParameter(
                "control period must be positive".to_owned(),
            ));
        }
        let is_running = Arc::new(AtomicBool::new(true));
        let cycles = Arc::new(AtomicU64::new(0));
        let is_running_cloned = is_running.clone();
        let cycles_cloned = cycles.clone();
        let thread = thread::Builder::new()
            .name("cartvel-control".into())
            .spawn(move || {
                let start = Instant::now();
                controller.starting(Duration::ZERO);
                let mut deadline = start;
                let mut last_update: Option<Instant> = None;
                let mut failing = false;
                while is_running_cloned.load(Ordering::Relaxed) {
                    let now = Instant::now();
                    let (next, skipped) = next_deadline(deadline, period, now);
                    if skipped > 0 {
                        debug!("control loop overran, skipped {skipped} cycles");
                    }
                    deadline = next;
                    let _sleep = ScopedSleep::until(deadline);

                    let elapsed = last_update.map_or(period, |last| now - last);
                    last_update = Some(now);
                    match controller.update(now - start, elapsed) {
                        Ok(_) => {
                            if failing {
                                info!("control cycle recovered");
                                failing = false;
                            }
                        }
                        Err(e) => {
                            if !failing {
                                error!("control cycle failed: {e}");
                                failing = true;
                            }
                        }
                    }
                    cycles_cloned.fetch_add(1, Ordering::Relaxed);
                }
                controller
            })
            .map_err(Error::Spawn)?;
        info!("control loop started with period {period:?}");
        Ok(ControlLoopHandle {
            thread: Some(thread),
            is_running,
            cycles,
        })
    }
}

/// Handle to a running [`ControlLoop`]. Dropping it stops the loop.
#[derive(Debug)]
pub struct ControlLoopHandle<J, W> {
    thread: Option<thread::JoinHandle<CartesianVelocityController<J, W>>>,
    is_running: Arc<AtomicBool>,
    cycles: Arc<AtomicU64>,
}

impl<J, W> ControlLoopHandle<J, W> {
    /// Number of cycles run so far.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Stops the loop after the current cycle and gives the controller back.
    ///
    /// # Panics
    ///
    /// Resumes the panic if the control thread panicked.
    pub fn stop(mut self) -> CartesianVelocityController<J, W> {
        self.is_running.store(false, Ordering::Relaxed);
        // `thread` is only taken here and in `drop`.
        let thread = self.thread.take().unwrap_or_else(|| unreachable!());
        match thread.join() {
            Ok(controller) => {
                info!("control loop stopped after {} cycles", self.cycles());
                controller
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

impl<J, W> Drop for ControlLoopHandle<J, W> {
    fn drop(&mut self) {
        self.is_running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("control thread panicked");
            }
        }
    }
}
