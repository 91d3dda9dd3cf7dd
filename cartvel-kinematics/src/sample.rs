//! Small chains built in code, for tests and demos.

use k::{joint::*, nalgebra as na, node::*};

use crate::chain::KinematicChain;

fn revolute(
    name: &str,
    translation: na::Translation3<f64>,
    axis: na::Unit<na::Vector3<f64>>,
) -> Node<f64> {
    NodeBuilder::new()
        .name(name)
        .translation(translation)
        .joint_type(JointType::Rotational { axis })
        .into_node()
}

fn fixed(name: &str, translation: na::Translation3<f64>) -> Node<f64> {
    NodeBuilder::new()
        .name(name)
        .translation(translation)
        .joint_type(JointType::Fixed)
        .into_node()
}

fn connect(nodes: &[Node<f64>]) {
    for pair in nodes.windows(2) {
        pair[1].set_parent(&pair[0]);
    }
}

/// Names of the joints of [`six_dof_arm`], base first.
pub const SIX_DOF_JOINT_NAMES: [&str; 6] = [
    "shoulder_yaw",
    "shoulder_pitch",
    "elbow_pitch",
    "wrist_roll",
    "wrist_pitch",
    "wrist_yaw",
];

/// Anthropomorphic 6-DOF arm with a spherical wrist, pointing straight up at zero.
///
/// Singular when the elbow is straight, when the wrist pitch is zero, or when the
/// wrist center lies on the shoulder yaw axis. All joints at zero hits all three.
pub fn six_dof_arm() -> KinematicChain {
    let t = na::Translation3::new;
    let nodes = [
        revolute(SIX_DOF_JOINT_NAMES[0], t(0.0, 0.0, 0.1), na::Vector3::z_axis()),
        revolute(SIX_DOF_JOINT_NAMES[1], t(0.0, 0.0, 0.1), na::Vector3::y_axis()),
        revolute(SIX_DOF_JOINT_NAMES[2], t(0.0, 0.0, 0.3), na::Vector3::y_axis()),
        revolute(SIX_DOF_JOINT_NAMES[3], t(0.0, 0.0, 0.15), na::Vector3::z_axis()),
        revolute(SIX_DOF_JOINT_NAMES[4], t(0.0, 0.0, 0.15), na::Vector3::y_axis()),
        revolute(SIX_DOF_JOINT_NAMES[5], t(0.0, 0.0, 0.05), na::Vector3::z_axis()),
        fixed("tool", t(0.0, 0.0, 0.05)),
    ];
    connect(&nodes);
    KinematicChain::new(k::SerialChain::from_end(&nodes[6]))
}

/// Planar arm in the xy plane with links of 0.6 and 0.4, stretched along x at zero.
pub fn planar_two_link_arm() -> KinematicChain {
    let t = na::Translation3::new;
    let nodes = [
        revolute("shoulder", t(0.0, 0.0, 0.0), na::Vector3::z_axis()),
        revolute("elbow", t(0.6, 0.0, 0.0), na::Vector3::z_axis()),
        fixed("hand", t(0.4, 0.0, 0.0)),
    ];
    connect(&nodes);
    KinematicChain::new(k::SerialChain::from_end(&nodes[2]))
}
