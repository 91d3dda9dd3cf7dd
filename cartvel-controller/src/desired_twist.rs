use std::sync::Arc;

use arc_swap::ArcSwap;
use cartvel_kinematics::Twist;

/// Latest commanded end-effector twist.
///
/// Written by any number of producer threads and read by the control thread once
/// per cycle. A store replaces the whole twist at once, so a reader sees either
/// the old or the new six-vector and never a mix of both. Loads never block.
#[derive(Debug)]
pub struct DesiredTwist {
    twist: ArcSwap<Twist>,
}

impl DesiredTwist {
    pub fn new() -> Self {
        Self {
            twist: ArcSwap::from_pointee(Twist::zero()),
        }
    }

    pub fn load(&self) -> Twist {
        **self.twist.load()
    }

    pub fn store(&self, twist: Twist) {
        self.twist.store(Arc::new(twist));
    }

    pub fn reset(&self) {
        self.store(Twist::zero());
    }
}

impl Default for DesiredTwist {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer side of a [`DesiredTwist`].
///
/// Commands are neither queued nor validated: the last one sent wins.
#[derive(Debug, Clone)]
pub struct TwistCommander {
    desired: Arc<DesiredTwist>,
}

impl TwistCommander {
    pub fn new(desired: Arc<DesiredTwist>) -> Self {
        Self { desired }
    }

    pub fn send(&self, twist: Twist) {
        self.desired.store(twist);
    }

    /// Sends `[linear.x, linear.y, linear.z, angular.x, angular.y, angular.z]`.
    pub fn send_array(&self, twist: [f64; 6]) {
        self.send(Twist::from_array(twist));
    }

    pub fn stop(&self) {
        self.desired.reset();
    }

    /// Returns the twist the controller will see on its next cycle.
    pub fn current(&self) -> Twist {
        self.desired.load()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_last_writer_wins() {
        let desired = Arc::new(DesiredTwist::new());
        assert!(desired.load().is_zero());

        let commander = TwistCommander::new(desired.clone());
        commander.send_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        commander.send_array([-1.0, -2.0, -3.0, -4.0, -5.0, -6.0]);
        assert_eq!(
            desired.load().to_array(),
            [-1.0, -2.0, -3.0, -4.0, -5.0, -6.0]
        );

        commander.stop();
        assert!(commander.current().is_zero());
    }

    #[test]
    fn test_no_torn_reads() {
        // Every written twist has all six components equal. A torn read would
        // show components from two different writes.
        let desired = Arc::new(DesiredTwist::new());
        let writers: Vec<_> = (0..2)
            .map(|w| {
                let commander = TwistCommander::new(desired.clone());
                thread::spawn(move || {
                    for i in 0..20_000 {
                        let v = (w * 100_000 + i) as f64;
                        commander.send_array([v; 6]);
                    }
                })
            })
            .collect();

        for _ in 0..50_000 {
            let twist = desired.load().to_array();
            assert!(twist.iter().all(|v| *v == twist[0]), "torn read {twist:?}");
        }
        for writer in writers {
            writer.join().unwrap();
        }
    }
}
