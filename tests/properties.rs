use approx::assert_relative_eq;
use physlab::models::{GRAVITY, ProjectileModel, Shape};
use physlab::{BoundaryEvent, Engine, IntegrationMode, SimConfig, Simulation, model_catalog};
use std::f64::consts::PI;

fn free_fall(mode: IntegrationMode, height: f64) -> Simulation<ProjectileModel> {
    let mut config = SimConfig {
        mode,
        ..SimConfig::default()
    };
    for (name, value) in [("initial_height", height), ("wind_x", 0.0), ("wind_z", 0.0)] {
        config.parameters.insert(name.to_string(), value);
    }
    Simulation::with_config(ProjectileModel::new(Shape::Sphere, false), &config).unwrap()
}

#[test]
fn euler_free_fall_velocity_is_minus_g_t() {
    let mut sim = free_fall(IntegrationMode::Euler, 20.0);
    for _ in 0..100 {
        let report = sim.step(0.01).unwrap();
        assert!(report.events.is_empty());
    }
    assert_relative_eq!(sim.time(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(sim.state().velocity.y, -GRAVITY, epsilon = 1e-9);
    assert_eq!(sim.state().velocity.x, 0.0);
}

#[test]
fn verlet_free_fall_velocity_is_minus_g_t() {
    let mut sim = free_fall(IntegrationMode::Verlet, 20.0);
    for _ in 0..100 {
        sim.step(0.01).unwrap();
    }
    assert_eq!(sim.mode(), IntegrationMode::Verlet);
    assert_relative_eq!(sim.state().velocity.y, -GRAVITY * sim.time(), epsilon = 1e-6);
    // x(t) = x0 - g t^2 / 2 up to O(dt)
    assert_relative_eq!(sim.state().position.y, 20.0 - 0.5 * GRAVITY, epsilon = 0.1);
}

#[test]
fn bounce_keeps_seventy_percent_of_impact_speed() {
    let mut sim = free_fall(IntegrationMode::Euler, 2.0);
    let radius = sim.parameter("size").unwrap();
    let mut impact = None;
    for _ in 0..2000 {
        let report = sim.step(0.001).unwrap();
        if let Some(BoundaryEvent::Bounced { impact_speed }) = report.events.first() {
            impact = Some(*impact_speed);
            break;
        }
    }
    let impact = impact.expect("body never reached the ground");
    assert!(impact > 5.0);
    assert_eq!(sim.state().position.y, radius);
    assert_relative_eq!(sim.state().velocity.y, 0.7 * impact, epsilon = 1e-12);
}

#[test]
fn slow_bounces_settle_once() {
    let mut sim = free_fall(IntegrationMode::Euler, 2.0);
    let radius = sim.parameter("size").unwrap();
    let mut impacts = Vec::new();
    let mut settled = 0;
    for _ in 0..6000 {
        let report = sim.step(0.001).unwrap();
        for event in &report.events {
            match event {
                BoundaryEvent::Bounced { impact_speed } => impacts.push(*impact_speed),
                BoundaryEvent::Settled => {
                    settled += 1;
                    assert_eq!(sim.state().velocity.y, 0.0);
                    assert_eq!(sim.state().position.y, radius);
                }
                _ => {}
            }
        }
    }
    assert_eq!(settled, 1);
    assert!(impacts.len() > 3);
    assert!(impacts.windows(2).all(|w| w[1] < w[0]));
    assert!(sim.state().grounded);
}

#[test]
fn small_angle_pendulum_period() {
    let mut engine = Engine::new_builtin("pendulum").unwrap();
    engine.set_parameter("initial_angle", 0.5).unwrap();
    let length = engine.parameter("length").unwrap();
    let expected = 2.0 * PI * (length / GRAVITY).sqrt();

    let mut turning = Vec::new();
    let dt = 1.0e-3;
    while engine.time() < 5.0 * expected {
        let report = engine.step(dt).unwrap();
        if report
            .events
            .iter()
            .any(|e| matches!(e, BoundaryEvent::TurningPoint { .. }))
        {
            turning.push(report.time);
        }
    }
    assert!(turning.len() >= 9);
    let measured = (turning[8] - turning[0]) / 4.0;
    assert_relative_eq!(measured, expected, max_relative = 1.0e-3);
}

fn decay_run(seed: u64, steps: usize) -> Engine {
    let config = SimConfig {
        seed,
        ..SimConfig::default()
    };
    let mut engine = Engine::from_config("decay", &config).unwrap();
    for _ in 0..steps {
        engine.step(0.016).unwrap();
    }
    engine
}

#[test]
fn decay_is_reproducible_for_a_seed() {
    let a = decay_run(42, 300);
    let b = decay_run(42, 300);
    assert_eq!(a.current_state(), b.current_state());
    assert_eq!(a.sample_series(), b.sample_series());

    let c = decay_run(43, 300);
    assert_ne!(a.current_state(), c.current_state());
}

#[test]
fn zero_decay_constant_never_decays() {
    let mut engine = Engine::new_builtin("decay").unwrap();
    engine.set_parameter("decay_constant", 0.0).unwrap();
    for _ in 0..500 {
        let report = engine.step(0.016).unwrap();
        assert!(report.events.is_empty());
    }
    assert_eq!(engine.current_state().scalar("remaining"), Some(100.0));
}

#[test]
fn standing_wave_at_time_zero_is_a_sine() {
    let engine = Engine::new_builtin("standing-wave").unwrap();
    let state = engine.current_state();
    let displacement = state.field("displacement").unwrap().as_series().unwrap();
    let length = engine.parameter("length").unwrap();
    let amplitude = engine.parameter("amplitude").unwrap();
    let harmonics = engine.parameter("harmonics").unwrap();
    let n = displacement.len();
    assert_eq!(n, 200);
    for (i, y) in displacement.iter().enumerate() {
        let x = i as f64 / (n - 1) as f64 * length;
        assert_relative_eq!(*y, amplitude * (harmonics * PI * x / length).sin(), epsilon = 1e-12);
    }
}

#[test]
fn standing_wave_is_flat_at_quarter_period() {
    let mut engine = Engine::new_builtin("standing-wave").unwrap();
    let frequency = engine.parameter("frequency").unwrap();
    engine.step(0.25 / frequency).unwrap();
    let state = engine.current_state();
    let displacement = state.field("displacement").unwrap().as_series().unwrap();
    assert!(displacement.iter().all(|y| *y == 0.0));
    assert_eq!(state.scalar("envelope"), Some(0.0));
}

#[test]
fn identity_curve_is_the_unit_circle() {
    let engine = Engine::new_builtin("complex-z").unwrap();
    let state = engine.current_state();
    let trace = state.field("trace").unwrap().as_points().unwrap();
    let last = (trace.len() - 1) as f64;
    for (i, [re, im]) in trace.iter().enumerate() {
        let t = 2.0 * PI * i as f64 / last;
        assert_relative_eq!(*re, t.cos(), epsilon = 1e-15);
        assert_relative_eq!(*im, t.sin(), epsilon = 1e-15);
    }
}

#[test]
fn cubic_curve_starts_at_four_thirds() {
    let engine = Engine::new_builtin("complex-z3").unwrap();
    let state = engine.current_state();
    let trace = state.field("trace").unwrap().as_points().unwrap();
    assert_relative_eq!(trace[0][0], 4.0 / 3.0, epsilon = 1e-15);
    assert_relative_eq!(trace[0][1], 0.0, epsilon = 1e-15);
}

#[test]
fn reset_restores_construction_state_for_every_model() {
    for info in model_catalog() {
        let mut engine = Engine::new_builtin(info.id).unwrap();
        let state0 = engine.current_state();
        let params0 = engine.parameters();
        let samples0 = engine.sample_series().to_vec();

        let spec = engine.parameter_specs()[0].clone();
        let target = spec.range.map(|(_, max)| max).unwrap_or(spec.default + 1.0);
        engine.set_parameter(spec.name, target).unwrap();
        if info.id == "projectile" {
            engine.set_integration_mode(IntegrationMode::Verlet).unwrap();
            engine.set_shape("cube").unwrap();
        }
        for _ in 0..20 {
            engine.step(0.016).unwrap();
        }

        engine.reset();
        assert_eq!(engine.time(), 0.0, "{}", info.id);
        assert_eq!(engine.mode(), IntegrationMode::Euler, "{}", info.id);
        assert_eq!(engine.current_state(), state0, "{}", info.id);
        assert_eq!(engine.parameters(), params0, "{}", info.id);
        assert_eq!(engine.sample_series(), samples0.as_slice(), "{}", info.id);
    }
}

#[test]
fn reset_replays_the_random_stream() {
    let fresh = decay_run(7, 100);
    let mut replayed = decay_run(7, 40);
    replayed.reset();
    for _ in 0..100 {
        replayed.step(0.016).unwrap();
    }
    assert_eq!(replayed.current_state(), fresh.current_state());
}

#[test]
fn long_frames_are_capped_by_the_clock() {
    let mut engine = Engine::new_builtin("pendulum").unwrap();
    assert!(engine.frame(0.0).unwrap().is_none());
    let report = engine.frame(3.0).unwrap().unwrap();
    assert_eq!(report.dt, 0.1);
}
