use std::time::Duration;

use cartvel_kinematics::{Isometry3, Twist};
use tracing::{debug, info};

use crate::{Error, RealtimePublisher, ReportSink};

/// Achieved state of the end-effector at one control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateReport {
    /// Controller time of the cycle that produced this report.
    pub stamp: Duration,
    pub pose: Isometry3<f64>,
    pub twist: Twist,
}

impl Default for StateReport {
    fn default() -> Self {
        Self {
            stamp: Duration::ZERO,
            pose: Isometry3::identity(),
            twist: Twist::zero(),
        }
    }
}

/// What [`RateLimitedReporter::report`] did with a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Reporting is turned off (`publish_rate <= 0`).
    Disabled,
    /// Less than one publish period has passed since the last publish.
    NotDue,
    /// The consumer has not taken the previous report. The sample is dropped.
    Busy,
    Published,
}

/// Publishes [`StateReport`]s at no more than a configured rate without ever
/// blocking the caller.
///
/// The publish time advances by exactly one period on every publish, so the
/// cadence stays on a fixed grid even when cycles jitter or a publish is skipped.
#[derive(Debug)]
pub struct RateLimitedReporter {
    publish_rate: f64,
    last_publish_time: Duration,
    publisher: Option<(Duration, RealtimePublisher<StateReport>)>,
}

impl RateLimitedReporter {
    /// Creates a reporter forwarding to `sink`.
    ///
    /// A `publish_rate` of zero or less disables reporting and no worker thread
    /// is started.
    pub fn new<S>(publish_rate: f64, sink: S) -> Result<Self, Error>
    where
        S: ReportSink<StateReport>,
    {
        if publish_rate.is_nan() {
            return Err(Error::InvalidParameter("publish_rate is NaN".to_owned()));
        }
        let publisher = if publish_rate > 0.0 {
            let period = publish_period(publish_rate)?;
            debug!("publishing state reports every {period:?}");
            Some((period, RealtimePublisher::new(StateReport::default(), sink)?))
        } else {
            info!("state reporting disabled (publish_rate = {publish_rate})");
            None
        };
        Ok(Self {
            publish_rate,
            last_publish_time: Duration::ZERO,
            publisher,
        })
    }

    pub fn publish_rate(&self) -> f64 {
        self.publish_rate
    }

    /// Returns the publish period, or `None` when reporting is disabled.
    pub fn publish_period(&self) -> Option<Duration> {
        self.publisher.as_ref().map(|(period, _)| *period)
    }

    pub fn last_publish_time(&self) -> Duration {
        self.last_publish_time
    }

    pub fn reset(&mut self, time: Duration) {
        self.last_publish_time = time;
    }

    pub fn report(&mut self, time: Duration, pose: &Isometry3<f64>, twist: &Twist) -> PublishOutcome {
        let Some((period, publisher)) = &self.publisher else {
            return PublishOutcome::Disabled;
        };
        let Some(due) = self.last_publish_time.checked_add(*period) else {
            return PublishOutcome::NotDue;
        };
        if time < due {
            return PublishOutcome::NotDue;
        }
        let Some(mut report) = publisher.try_lock() else {
            return PublishOutcome::Busy;
        };
        self.last_publish_time = due;
        report.stamp = time;
        report.pose = *pose;
        report.twist = *twist;
        report.unlock_and_publish();
        PublishOutcome::Published
    }
}

fn publish_period(publish_rate: f64) -> Result<Duration, Error> {
    let nanos = (1e9 / publish_rate).round();
    if !(1.0..=u64::MAX as f64).contains(&nanos) {
        return Err(Error::InvalidParameter(format!(
            "publish_rate {publish_rate} is out of range"
        )));
    }
    Ok(Duration::from_nanos(nanos as u64))
}
