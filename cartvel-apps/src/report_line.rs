use cartvel_controller::StateReport;
use serde::{Deserialize, Serialize};

/// JSON form of a [`StateReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    /// Seconds since the controller started.
    pub stamp: f64,
    pub position: [f64; 3],
    /// Unit quaternion as `[x, y, z, w]`.
    pub orientation: [f64; 4],
    pub linear: [f64; 3],
    pub angular: [f64; 3],
}

impl From<&StateReport> for ReportLine {
    fn from(report: &StateReport) -> Self {
        let t = &report.pose.translation.vector;
        let q = &report.pose.rotation;
        let l = &report.twist.linear;
        let a = &report.twist.angular;
        Self {
            stamp: report.stamp.as_secs_f64(),
            position: [t.x, t.y, t.z],
            orientation: [q.i, q.j, q.k, q.w],
            linear: [l.x, l.y, l.z],
            angular: [a.x, a.y, a.z],
        }
    }
}
