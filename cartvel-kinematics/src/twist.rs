use k::nalgebra as na;

/// Linear and angular velocity of a frame.
///
/// Both parts are expressed in the base frame of the chain. The linear part is the
/// velocity of the end-effector origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Twist {
    pub linear: na::Vector3<f64>,
    pub angular: na::Vector3<f64>,
}

impl Twist {
    pub fn new(linear: na::Vector3<f64>, angular: na::Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    pub fn zero() -> Self {
        Self::new(na::Vector3::zeros(), na::Vector3::zeros())
    }

    /// `[vx, vy, vz, wx, wy, wz]`
    pub fn from_array(v: [f64; 6]) -> Self {
        Self::new(
            na::Vector3::new(v[0], v[1], v[2]),
            na::Vector3::new(v[3], v[4], v[5]),
        )
    }

    /// `[vx, vy, vz, wx, wy, wz]`
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.linear.x,
            self.linear.y,
            self.linear.z,
            self.angular.x,
            self.angular.y,
            self.angular.z,
        ]
    }

    pub fn from_vector6(v: &na::Vector6<f64>) -> Self {
        Self::new(
            na::Vector3::new(v[0], v[1], v[2]),
            na::Vector3::new(v[3], v[4], v[5]),
        )
    }

    pub fn to_vector6(&self) -> na::Vector6<f64> {
        na::Vector6::from_column_slice(&self.to_array())
    }

    pub fn is_zero(&self) -> bool {
        self.linear.iter().chain(self.angular.iter()).all(|v| *v == 0.0)
    }
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<[f64; 6]> for Twist {
    fn from(v: [f64; 6]) -> Self {
        Self::from_array(v)
    }
}

impl From<Twist> for [f64; 6] {
    fn from(twist: Twist) -> Self {
        twist.to_array()
    }
}
