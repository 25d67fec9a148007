/// Scene and frame driver
/// Owns every body, builds the scene from the catalog and advances it at a bounded rate
use glam::DVec3;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    OrreryError, OrreryResult,
    config::OrreryConfig,
    graphics::generate_sphere,
    math::{Body, LightSource, MathUtils},
    renderer::backend::{DrawTarget, RenderBackend},
};

/// Stable index of a body in the scene arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(pub usize);

/// Per-planet motion parameters
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitParams {
    pub body: BodyId,
    pub name: String,
    pub texture: String,
    pub spin_period: f64,
    pub revolution_period: f64,
    pub orbit_normal: DVec3,
    pub start_phase: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoonOrbit {
    pub body: BodyId,
    pub name: String,
    pub texture: String,
    /// Index of the parent in the planet list
    pub parent: usize,
    pub revolution_ratio: f64,
}

pub struct SolarSystem {
    bodies: Vec<Body>,
    sun: BodyId,
    sun_texture: String,
    sun_position: DVec3,
    planets: Vec<OrbitParams>,
    moon: Option<MoonOrbit>,

    visible_planets: usize,
    updates_per_second: f64,
    angular_speed: f64,

    accumulated: f64,
    steps: u64,
}

impl SolarSystem {
    /// Generate the shared sphere and place, orient and light every body of the catalog
    pub fn build(config: &OrreryConfig) -> OrreryResult<Self> {
        config.validate()?;

        let simulation = &config.simulation;
        let scenario = &config.scenario;
        let sun_position = DVec3::from_array(config.lighting.sun_position);
        let light = LightSource::new(sun_position, config.lighting.attenuation_exponent);

        let mut rng = match simulation.phase_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mesh = generate_sphere(simulation.sphere_resolution)?;
        let template = Body::from_sphere(&mesh, light)?;
        let mut bodies = Vec::with_capacity(scenario.planets.len() + 2);

        let mut sun = template.clone();
        sun.move_by(MathUtils::placement(scenario.sun.size, sun_position))?;
        sun.setup_sun();
        bodies.push(sun);
        let sun_id = BodyId(0);

        let mut planets = Vec::with_capacity(scenario.planets.len());
        for spec in &scenario.planets {
            let start_phase = if simulation.max_start_phase > 0.0 {
                rng.gen_range(0.0..simulation.max_start_phase)
            } else {
                0.0
            };

            let mut body = template.clone();
            body.move_by(MathUtils::placement(
                spec.size,
                sun_position + DVec3::new(spec.orbit_radius, 0.0, 0.0),
            ))?;
            body.setup_planet(spec.axial_tilt, start_phase, spec.orbit_inclination)?;

            log::debug!(
                "Placed {} at ({:.2}, {:.2}, {:.2})",
                spec.name,
                body.self_center().x,
                body.self_center().y,
                body.self_center().z
            );

            planets.push(OrbitParams {
                body: BodyId(bodies.len()),
                name: spec.name.clone(),
                texture: spec.texture.clone(),
                spin_period: spec.spin_period,
                revolution_period: spec.revolution_period,
                orbit_normal: MathUtils::orbit_normal(spec.orbit_inclination),
                start_phase,
            });
            bodies.push(body);
        }

        let moon = match &scenario.moon {
            Some(spec) => {
                let parent_spec = &scenario.planets[spec.parent];
                let parent = &planets[spec.parent];

                // Shares the parent's orbital plane and phase so it starts beside it
                let mut body = template.clone();
                body.move_by(MathUtils::placement(
                    spec.size,
                    sun_position
                        + DVec3::new(parent_spec.orbit_radius + spec.distance, 0.0, 0.0),
                ))?;
                body.setup_planet(0.0, parent.start_phase, parent_spec.orbit_inclination)?;

                let orbit = MoonOrbit {
                    body: BodyId(bodies.len()),
                    name: spec.name.clone(),
                    texture: spec.texture.clone(),
                    parent: spec.parent,
                    revolution_ratio: spec.revolution_ratio,
                };
                bodies.push(body);
                Some(orbit)
            }
            None => None,
        };

        let visible_planets = simulation.visible_planets.clamp(1, planets.len());

        log::info!(
            "Solar system built: {} bodies, {} of {} planets visible, sphere resolution {}",
            bodies.len(),
            visible_planets,
            planets.len(),
            simulation.sphere_resolution
        );

        Ok(Self {
            bodies,
            sun: sun_id,
            sun_texture: scenario.sun.texture.clone(),
            sun_position,
            planets,
            moon,
            visible_planets,
            updates_per_second: simulation.updates_per_second,
            angular_speed: simulation.angular_speed,
            accumulated: 0.0,
            steps: 0,
        })
    }

    /// One-time upload of every body's mesh
    pub fn attach(&mut self, backend: &mut dyn RenderBackend) -> OrreryResult<()> {
        for body in &mut self.bodies {
            body.attach(backend)?;
        }
        log::debug!("Attached {} bodies", self.bodies.len());
        Ok(())
    }

    /// Accumulate `elapsed` seconds and step once the update interval has passed.
    /// Returns whether a step ran.
    pub fn update(&mut self, elapsed: f64, backend: &mut dyn RenderBackend) -> OrreryResult<bool> {
        self.accumulated += elapsed.max(0.0);
        if self.accumulated * self.updates_per_second <= 1.0 {
            return Ok(false);
        }

        let dt = self.accumulated;
        self.accumulated = 0.0;
        self.step(dt, backend)?;
        Ok(true)
    }

    /// Advance every visible body by `dt` seconds, pushing after each transform
    pub fn step(&mut self, dt: f64, backend: &mut dyn RenderBackend) -> OrreryResult<()> {
        let sun = self.sun_position;

        for orbit in &self.planets[..self.visible_planets] {
            let body = &mut self.bodies[orbit.body.0];

            let revolution = dt * self.angular_speed / orbit.revolution_period;
            body.rotate_around(sun, orbit.orbit_normal, revolution)?;
            body.submit(backend)?;

            let spin = dt * self.angular_speed / orbit.spin_period;
            let axis = body.spin_axis()?;
            body.spin(axis, spin)?;
            body.submit(backend)?;
        }

        if let Some(moon) = self.visible_moon().cloned() {
            let parent = &self.planets[moon.parent];
            let revolution = dt * self.angular_speed / parent.revolution_period;
            let normal = parent.orbit_normal;

            // The moon is pushed after every planet, so its parent sits in the head
            let (head, tail) = self.bodies.split_at_mut(moon.body.0);
            let parent_body = &head[parent.body.0];
            let body = &mut tail[0];

            // Track the parent's orbit, then circle the parent
            body.rotate_around(sun, normal, revolution)?;
            body.submit(backend)?;
            body.rotate_around_body(parent_body, normal, moon.revolution_ratio * revolution)?;
            body.submit(backend)?;
        }

        self.steps += 1;
        log::trace!("Step {} with dt {:.4}", self.steps, dt);
        Ok(())
    }

    /// Draw visible planets, the moon, then the sun
    pub fn render(&self, target: &mut dyn DrawTarget) -> OrreryResult<()> {
        for orbit in &self.planets[..self.visible_planets] {
            self.bodies[orbit.body.0].render_mesh(target)?;
        }
        if let Some(moon) = self.visible_moon() {
            self.bodies[moon.body.0].render_mesh(target)?;
        }
        self.bodies[self.sun.0].render_mesh(target)
    }

    fn visible_moon(&self) -> Option<&MoonOrbit> {
        self.moon
            .as_ref()
            .filter(|moon| moon.parent < self.visible_planets)
    }

    pub fn visible_planets(&self) -> usize {
        self.visible_planets
    }

    /// Clamped to at least one and at most every planet of the catalog
    pub fn set_visible_planets(&mut self, count: usize) {
        self.visible_planets = count.clamp(1, self.planets.len());
        log::info!("Showing {} planets", self.visible_planets);
    }

    pub fn show_more_planets(&mut self) {
        self.set_visible_planets(self.visible_planets + 1);
    }

    pub fn show_fewer_planets(&mut self) {
        self.set_visible_planets(self.visible_planets.saturating_sub(1));
    }

    pub fn body(&self, id: BodyId) -> OrreryResult<&Body> {
        self.bodies.get(id.0).ok_or(OrreryError::UnknownBody(id.0))
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn sun(&self) -> &Body {
        &self.bodies[self.sun.0]
    }

    pub fn sun_id(&self) -> BodyId {
        self.sun
    }

    pub fn planets(&self) -> &[OrbitParams] {
        &self.planets
    }

    pub fn moon(&self) -> Option<&MoonOrbit> {
        self.moon.as_ref()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Texture name of every body, keyed by id
    pub fn textures(&self) -> Vec<(BodyId, &str)> {
        let mut textures = vec![(self.sun, self.sun_texture.as_str())];
        textures.extend(self.planets.iter().map(|p| (p.body, p.texture.as_str())));
        if let Some(moon) = &self.moon {
            textures.push((moon.body, moon.texture.as_str()));
        }
        textures
    }

    /// Name of every body with its current center, sun first
    pub fn centers(&self) -> Vec<(&str, DVec3)> {
        let mut centers = vec![("sun", self.sun().self_center())];
        centers.extend(
            self.planets
                .iter()
                .map(|p| (p.name.as_str(), self.bodies[p.body.0].self_center())),
        );
        if let Some(moon) = &self.moon {
            centers.push((moon.name.as_str(), self.bodies[moon.body.0].self_center()));
        }
        centers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::memory::MemoryBackend;
    use approx::assert_abs_diff_eq;

    fn config(planets: usize) -> OrreryConfig {
        let mut config = OrreryConfig::default();
        config.simulation.sphere_resolution = 8;
        config.simulation.phase_seed = Some(3);
        config.simulation.visible_planets = planets;
        config
    }

    fn attached(planets: usize) -> (SolarSystem, MemoryBackend) {
        let mut system = SolarSystem::build(&config(planets)).unwrap();
        let mut backend = MemoryBackend::new();
        system.attach(&mut backend).unwrap();
        (system, backend)
    }

    #[test]
    fn test_build_places_catalog() {
        let system = SolarSystem::build(&config(9)).unwrap();

        assert_eq!(system.bodies().len(), 11);
        assert!(system.sun().is_luminous());
        assert_eq!(system.sun().self_center(), DVec3::ZERO);

        let scenario = crate::scenario::Scenario::default();
        for (orbit, spec) in system.planets().iter().zip(&scenario.planets) {
            let body = system.body(orbit.body).unwrap();
            assert_abs_diff_eq!(body.self_center().length(), spec.orbit_radius, epsilon = 1e-9);
            assert_abs_diff_eq!(body.self_center().dot(orbit.orbit_normal), 0.0, epsilon = 1e-9);
            assert!(orbit.start_phase >= 0.0 && orbit.start_phase < 3.0 * crate::math::PI / 4.0);
        }

        let moon = system.moon().unwrap();
        let earth = system.body(system.planets()[0].body).unwrap();
        let moon_body = system.body(moon.body).unwrap();
        assert_abs_diff_eq!(
            moon_body.self_center().distance(earth.self_center()),
            4.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_seeded_build_is_deterministic() {
        let a = SolarSystem::build(&config(9)).unwrap();
        let b = SolarSystem::build(&config(9)).unwrap();
        assert_eq!(a.centers(), b.centers());
    }

    #[test]
    fn test_unknown_body() {
        let system = SolarSystem::build(&config(9)).unwrap();
        assert!(matches!(
            system.body(BodyId(99)),
            Err(OrreryError::UnknownBody(99))
        ));
    }

    #[test]
    fn test_update_is_throttled() {
        let (mut system, mut backend) = attached(9);

        assert!(!system.update(0.005, &mut backend).unwrap());
        assert_eq!(backend.update_count(), 0);

        assert!(system.update(0.015, &mut backend).unwrap());
        assert_eq!(system.steps(), 1);
        // 9 planets and the moon, two transforms each, three buffers per push
        assert_eq!(backend.update_count(), 10 * 2 * 3);
    }

    #[test]
    fn test_step_revolves_by_scaled_angle() {
        let (mut system, mut backend) = attached(2);
        let earth = system.planets()[0].body;
        let mercury = system.planets()[1].clone();
        let before = system.body(earth).unwrap().self_center();
        let mercury_before = system.body(mercury.body).unwrap().self_center();

        system.step(0.5, &mut backend).unwrap();

        let after = system.body(earth).unwrap().self_center();
        assert_abs_diff_eq!(before.angle_between(after), 0.5 * 0.24, epsilon = 1e-9);

        let mercury_after = system.body(mercury.body).unwrap().self_center();
        assert_abs_diff_eq!(
            mercury_before.angle_between(mercury_after),
            0.5 * 0.24 / 0.24,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_moon_follows_earth() {
        let (mut system, mut backend) = attached(1);
        let earth = system.planets()[0].body;
        let moon = system.moon().unwrap().body;

        for _ in 0..500 {
            system.step(1.0 / 60.0, &mut backend).unwrap();
        }

        let earth_center = system.body(earth).unwrap().self_center();
        let moon_center = system.body(moon).unwrap().self_center();
        assert_abs_diff_eq!(moon_center.distance(earth_center), 4.0, epsilon = 1e-6);
        assert_abs_diff_eq!(earth_center.length(), 10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_tilts_hold_over_many_steps() {
        let (mut system, mut backend) = attached(9);
        let scenario = crate::scenario::Scenario::default();

        for _ in 0..200 {
            system.step(1.0 / 60.0, &mut backend).unwrap();
        }

        for (orbit, spec) in system.planets().iter().zip(&scenario.planets) {
            let body = system.body(orbit.body).unwrap();
            let tilt = body.tilt_relative_to(orbit.orbit_normal).unwrap();
            assert_abs_diff_eq!(tilt, spec.axial_tilt.abs(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_hidden_planets_stay_put() {
        let (mut system, mut backend) = attached(3);
        let jupiter = system.planets()[4].body;
        let before = system.body(jupiter).unwrap().self_center();

        system.step(1.0, &mut backend).unwrap();
        assert_eq!(system.body(jupiter).unwrap().self_center(), before);

        system.set_visible_planets(20);
        assert_eq!(system.visible_planets(), 9);
        system.set_visible_planets(0);
        assert_eq!(system.visible_planets(), 1);
        system.show_fewer_planets();
        assert_eq!(system.visible_planets(), 1);
        system.show_more_planets();
        assert_eq!(system.visible_planets(), 2);
    }

    #[test]
    fn test_render_order() {
        let (system, mut backend) = attached(2);

        system.render(&mut backend).unwrap();

        let expected: Vec<_> = [
            system.planets()[0].body,
            system.planets()[1].body,
            system.moon().unwrap().body,
            system.sun_id(),
        ]
        .iter()
        .map(|id| system.body(*id).unwrap().mesh_buffers().unwrap().vertex_array)
        .collect();
        let drawn: Vec<_> = backend.draws().iter().map(|d| d.vertex_array).collect();
        assert_eq!(drawn, expected);
    }

    #[test]
    fn test_backend_failure_stops_the_step() {
        let (mut system, mut backend) = attached(9);
        backend.set_failing(true);

        assert!(system.step(0.1, &mut backend).is_err());
        assert!(system.render(&mut backend).is_err());
    }
}
