use approx::assert_relative_eq;
use orrery::{
    OrreryConfig, SolarSystem,
    renderer::MemoryBackend,
    simulation::BodyId,
};

fn seeded_config() -> OrreryConfig {
    let mut config = OrreryConfig::default();
    config.simulation.phase_seed = Some(2024);
    config.simulation.sphere_resolution = 12;
    config
}

fn attached(config: &OrreryConfig) -> (SolarSystem, MemoryBackend) {
    let mut system = SolarSystem::build(config).unwrap();
    let mut backend = MemoryBackend::new();
    system.attach(&mut backend).unwrap();
    (system, backend)
}

#[test]
fn full_scene_upload_and_frame() {
    let config = seeded_config();
    let (mut system, mut backend) = attached(&config);

    // Sun, nine planets and the moon
    assert_eq!(system.bodies().len(), 11);
    assert_eq!(backend.vertex_buffer_count(), 11 * 5);
    assert_eq!(backend.index_buffer_count(), 11);
    assert_eq!(backend.update_count(), 0);

    system.step(1.0 / 60.0, &mut backend).unwrap();
    // Two transforms per planet and two for the moon, three buffers each
    assert_eq!(backend.update_count(), (9 * 2 + 2) * 3);

    system.render(&mut backend).unwrap();
    assert_eq!(backend.draws().len(), 11);
    let sun_buffers = system.sun().mesh_buffers().unwrap();
    assert_eq!(
        backend.draws().last().unwrap().vertex_array,
        sun_buffers.vertex_array
    );
}

#[test]
fn uploaded_positions_track_the_bodies() {
    let config = seeded_config();
    let (mut system, mut backend) = attached(&config);

    for _ in 0..120 {
        system.step(1.0 / 60.0, &mut backend).unwrap();
    }

    for body in system.bodies() {
        let buffers = body.mesh_buffers().unwrap();
        let uploaded = backend.read_vec3(buffers.positions).unwrap();
        assert_eq!(uploaded.len(), body.vertex_count());

        for (gpu, cpu) in uploaded.iter().zip(body.positions()) {
            assert!((gpu.as_dvec3() - *cpu).length() < 1e-3);
        }
    }
}

#[test]
fn orbits_keep_their_radius() {
    let config = seeded_config();
    let (mut system, mut backend) = attached(&config);

    let sun = system.sun().self_center();
    let before: Vec<f64> = system
        .planets()
        .iter()
        .map(|p| (system.body(p.body).unwrap().self_center() - sun).length())
        .collect();

    for _ in 0..1000 {
        system.step(1.0 / 60.0, &mut backend).unwrap();
    }

    for (orbit, radius) in system.planets().iter().zip(&before) {
        let after = (system.body(orbit.body).unwrap().self_center() - sun).length();
        assert_relative_eq!(after, *radius, max_relative = 1e-9);
    }

    let moon = system.moon().unwrap();
    let earth = &system.planets()[moon.parent];
    let separation = system.body(moon.body).unwrap().self_center()
        - system.body(earth.body).unwrap().self_center();
    assert_relative_eq!(separation.length(), 4.0, max_relative = 1e-6);
}

#[test]
fn throttled_updates_over_one_second() {
    let config = seeded_config();
    let (mut system, mut backend) = attached(&config);

    // Frames at 240 Hz step roughly every fifth frame at 60 updates per second
    let mut stepped = 0;
    for _ in 0..240 {
        if system.update(1.0 / 240.0, &mut backend).unwrap() {
            stepped += 1;
        }
    }

    assert!((40..=60).contains(&stepped), "stepped {stepped} times");
    assert_eq!(system.steps(), stepped);
}

#[test]
fn scene_from_ron_config() {
    let text = r#"(
        simulation: (sphere_resolution: 8, visible_planets: 2, phase_seed: Some(1)),
        scenario: (
            sun: (size: 2.0, texture: "sun"),
            planets: [
                (name: "inner", size: 0.3, orbit_radius: 5.0, spin_period: 1.0,
                 revolution_period: 0.5, axial_tilt: 0.2, orbit_inclination: 0.1, texture: "inner"),
                (name: "outer", size: 0.6, orbit_radius: 12.0, spin_period: -2.0,
                 revolution_period: 3.0, axial_tilt: 0.0, orbit_inclination: 0.0, texture: "outer"),
            ],
            moon: None,
        ),
    )"#;
    let config = OrreryConfig::from_ron(text).unwrap();
    let (mut system, mut backend) = attached(&config);

    assert_eq!(system.bodies().len(), 3);
    assert!(system.moon().is_none());
    assert_eq!(system.textures().len(), 3);

    system.step(0.1, &mut backend).unwrap();
    assert_eq!(backend.update_count(), 2 * 2 * 3);

    system.render(&mut backend).unwrap();
    assert_eq!(backend.draws().len(), 3);

    assert!(system.body(BodyId(3)).is_err());
}

#[test]
fn same_seed_same_scene() {
    let config = seeded_config();
    let (first, _) = attached(&config);
    let (second, _) = attached(&config);

    for ((name_a, a), (name_b, b)) in first.centers().iter().zip(second.centers()) {
        assert_eq!(*name_a, name_b);
        assert_eq!(*a, b);
    }
}
