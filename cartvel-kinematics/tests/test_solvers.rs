use assert_approx_eq::assert_approx_eq;
use cartvel_kinematics::{
    sample, DampedLeastSquaresSolver, Error, InverseVelocitySolver, InverseVelocitySolverConfig,
    KinematicChain, TruncatedPseudoInverseSolver, Twist,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const TOLERANCE: f64 = 1e-6;

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Configurations with the elbow and the wrist bent and the wrist center away from
/// the shoulder yaw axis.
fn random_regular_configuration(rng: &mut StdRng) -> Vec<f64> {
    vec![
        rng.gen_range(-1.0..1.0),
        rng.gen_range(0.3..1.0),
        rng.gen_range(0.5..2.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(0.5..1.5),
        rng.gen_range(-1.0..1.0),
    ]
}

fn random_twist(rng: &mut StdRng) -> Twist {
    let mut v = [0.0; 6];
    for x in v.iter_mut() {
        *x = rng.gen_range(-0.2..0.2);
    }
    Twist::from_array(v)
}

fn assert_twist_eq(actual: &Twist, expected: &Twist) {
    for (a, e) in actual.to_array().iter().zip(expected.to_array().iter()) {
        assert_approx_eq!(*a, *e, TOLERANCE);
    }
}

#[test]
fn test_round_trip_away_from_singularities() {
    let chain = sample::six_dof_arm();
    let solvers: Vec<Box<dyn InverseVelocitySolver>> = vec![
        Box::new(DampedLeastSquaresSolver::default()),
        Box::new(TruncatedPseudoInverseSolver::default()),
    ];
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let q = random_regular_configuration(&mut rng);
        let twist = random_twist(&mut rng);
        for solver in &solvers {
            let solution = solver.solve(&chain, &q, &twist).unwrap();
            assert!(!solution.damped, "damped at {q:?}");
            assert_eq!(solution.joint_velocities.len(), chain.dof());
            let achieved = chain
                .forward_velocity(&q, &solution.joint_velocities)
                .unwrap();
            assert_twist_eq(&achieved, &twist);
        }
    }
}

#[test]
fn test_output_length_matches_dof() {
    let mut rng = StdRng::seed_from_u64(3);
    let solver = DampedLeastSquaresSolver::default();
    for chain in [sample::six_dof_arm(), sample::planar_two_link_arm()] {
        for _ in 0..20 {
            let q: Vec<f64> = (0..chain.dof()).map(|_| rng.gen_range(-3.0..3.0)).collect();
            let twist = random_twist(&mut rng);
            let solution = solver.solve(&chain, &q, &twist).unwrap();
            assert_eq!(solution.joint_velocities.len(), chain.dof());
        }
    }
}

#[test]
fn test_bounded_near_elbow_singularity() {
    let chain = sample::six_dof_arm();
    let solver = DampedLeastSquaresSolver::default();
    let twist = Twist::from_array([0.05, 0.0, 0.1, 0.0, 0.0, 0.0]);
    let bound = norm(&twist.to_array()) / solver.epsilon();

    let mut norms = vec![];
    for elbow in [0.5, 1e-1, 1e-2, 1e-3, 1e-4, 1e-5, 1e-6, 1e-8, 0.0] {
        let q = [0.3, 0.5, elbow, 0.2, 0.8, 0.1];
        let solution = solver.solve(&chain, &q, &twist).unwrap();
        let n = norm(&solution.joint_velocities);
        assert!(n.is_finite());
        assert!(n <= bound + TOLERANCE, "|qdot| = {n} at elbow = {elbow}");
        if elbow <= 1e-3 {
            assert!(solution.damped);
        }
        norms.push(n);
    }
    // Converges instead of diverging as the elbow straightens.
    let tail = &norms[norms.len() - 3..];
    assert_approx_eq!(tail[0], tail[2], 1e-4);
    assert_approx_eq!(tail[1], tail[2], 1e-4);
}

#[test]
fn test_zero_twist_gives_zero_velocities() {
    let chain = sample::six_dof_arm();
    let solver = DampedLeastSquaresSolver::default();
    for q in [
        [0.0; 6],
        [0.1, -0.4, 2.5, 3.0, -1.0, 0.7],
        [10.0, -10.0, 4.0, 0.0, 0.0, 0.0],
    ] {
        let solution = solver.solve(&chain, &q, &Twist::zero()).unwrap();
        assert_eq!(solution.joint_velocities, vec![0.0; 6]);
    }
}

#[test]
fn test_dof_mismatch_is_reported() {
    let chain = sample::six_dof_arm();
    let solver = DampedLeastSquaresSolver::default();
    assert!(matches!(
        solver.solve(&chain, &[0.0; 5], &Twist::zero()),
        Err(Error::DofMismatch(6, 5))
    ));
}

#[test]
fn test_non_finite_positions_are_degenerate() {
    let chain = sample::six_dof_arm();
    let solver = DampedLeastSquaresSolver::default();
    let q = [0.0, f64::NAN, 0.0, 0.0, 0.0, 0.0];
    assert!(matches!(
        solver.solve(&chain, &q, &Twist::from_array([0.1; 6])),
        Err(Error::Degenerate(_))
    ));
}

#[test]
fn test_truncated_drops_singular_direction() {
    let chain = sample::six_dof_arm();
    let solver = TruncatedPseudoInverseSolver::new(1e-3).unwrap();
    let twist = Twist::from_array([0.05, 0.0, 0.1, 0.0, 0.0, 0.0]);
    let solution = solver.solve(&chain, &[0.3, 0.5, 0.0, 0.2, 0.8, 0.1], &twist).unwrap();
    assert!(solution.damped);
    assert!(solution.min_singular_value < 1e-3);
    assert!(norm(&solution.joint_velocities).is_finite());
}

#[test]
fn test_solver_from_config() {
    let chain = sample::six_dof_arm();
    let q = [0.3, 0.5, 1.0, 0.2, 0.8, 0.1];
    let twist = Twist::from_array([0.01, 0.02, -0.03, 0.1, 0.0, -0.1]);
    let solver = InverseVelocitySolverConfig::default().create_solver().unwrap();
    let solution = solver.solve(&chain, &q, &twist).unwrap();
    let expected = DampedLeastSquaresSolver::default()
        .solve(&chain, &q, &twist)
        .unwrap();
    assert_eq!(solution, expected);
}

const TWO_LINK_URDF: &str = r#"<?xml version="1.0"?>
<robot name="two_link">
  <link name="base"/>
  <link name="upper"/>
  <link name="lower"/>
  <link name="hand"/>
  <joint name="shoulder" type="revolute">
    <parent link="base"/>
    <child link="upper"/>
    <origin xyz="0 0 0" rpy="0 0 0"/>
    <axis xyz="0 0 1"/>
    <limit lower="-1.0" upper="1.0" effort="10" velocity="1"/>
  </joint>
  <joint name="elbow" type="revolute">
    <parent link="upper"/>
    <child link="lower"/>
    <origin xyz="0.6 0 0" rpy="0 0 0"/>
    <axis xyz="0 0 1"/>
    <limit lower="-1.0" upper="1.0" effort="10" velocity="1"/>
  </joint>
  <joint name="hand_fixed" type="fixed">
    <parent link="lower"/>
    <child link="hand"/>
    <origin xyz="0.4 0 0" rpy="0 0 0"/>
  </joint>
</robot>
"#;

#[test]
fn test_from_urdf_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("two_link.urdf");
    std::fs::write(&path, TWO_LINK_URDF).unwrap();

    let chain = KinematicChain::from_urdf_file(&path, "hand_fixed").unwrap();
    assert_eq!(chain.dof(), 2);
    assert_eq!(chain.joint_names(), ["shoulder", "elbow"]);

    // Positions outside the URDF limits are used as they are.
    let q = [std::f64::consts::PI, 0.0];
    let pose = chain.forward_position(&q).unwrap();
    assert_approx_eq!(pose.translation.x, -1.0);
    assert_approx_eq!(pose.translation.y, 0.0);

    assert!(matches!(
        KinematicChain::from_urdf_file(&path, "wrist"),
        Err(Error::NotFound(name)) if name == "wrist"
    ));
}

#[test]
fn test_from_urdf_file_reports_urdf_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        KinematicChain::from_urdf_file(dir.path().join("missing.urdf"), "hand_fixed"),
        Err(Error::Urdf { .. })
    ));

    let path = dir.path().join("broken.urdf");
    std::fs::write(&path, "<robot name=\"broken\"><link name=").unwrap();
    let err = KinematicChain::from_urdf_file(&path, "hand_fixed").unwrap_err();
    assert!(matches!(err, Error::Urdf { .. }));
    assert!(err.to_string().starts_with("cartvel-kinematics: URDF error"));
}
