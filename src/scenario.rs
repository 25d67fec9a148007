use serde::{Deserialize, Serialize};

use crate::{OrreryError, OrreryResult};

/// The luminous body at the center of the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunSpec {
    pub size: f64,
    pub texture: String,
}

/// A planet on a circular orbit around the sun.
/// Periods are ratios to the earth's; a negative spin period spins retrograde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetSpec {
    pub name: String,
    pub size: f64,
    pub orbit_radius: f64,
    pub spin_period: f64,
    pub revolution_period: f64,
    /// Radians between spin axis and orbital-plane normal
    pub axial_tilt: f64,
    /// Radians between the orbital plane and the reference plane
    pub orbit_inclination: f64,
    pub texture: String,
}

/// A moon circling one of the planets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoonSpec {
    pub name: String,
    pub size: f64,
    /// Distance from the parent's center
    pub distance: f64,
    /// Index into the planet list
    pub parent: usize,
    /// Revolutions around the parent per revolution of the parent around the sun
    pub revolution_ratio: f64,
    pub texture: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub sun: SunSpec,
    pub planets: Vec<PlanetSpec>,
    pub moon: Option<MoonSpec>,
}

impl PlanetSpec {
    #[allow(clippy::too_many_arguments)]
    fn reference(
        name: &str,
        size: f64,
        orbit_radius: f64,
        spin_period: f64,
        revolution_period: f64,
        axial_tilt: f64,
        orbit_inclination: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            size,
            orbit_radius,
            spin_period,
            revolution_period,
            axial_tilt,
            orbit_inclination,
            texture: name.to_string(),
        }
    }
}

impl Default for Scenario {
    /// The solar system, earth first. Sizes and distances are stylised, not to scale.
    fn default() -> Self {
        let planets = vec![
            PlanetSpec::reference("earth", 0.5, 10.0, 1.0, 1.0, 0.41, 0.0),
            PlanetSpec::reference("mercury", 0.19, 3.87, 1.47, 0.24, 0.0, 0.24),
            PlanetSpec::reference("venus", 0.47, 7.23, -1.0, 0.62, 3.1, 0.12),
            PlanetSpec::reference("mars", 0.27, 15.24, 1.22, 1.88, 0.44, 0.06),
            PlanetSpec::reference("jupiter", 5.6, 52.03, 1.0, 11.86, 0.05, 0.04),
            PlanetSpec::reference("saturn", 4.72, 95.72, 1.0, 29.43, 0.47, 0.08),
            PlanetSpec::reference("uranus", 2.0, 191.64, 1.0, 83.76, 1.71, 0.02),
            PlanetSpec::reference("neptune", 1.94, 301.80, 0.99, 163.75, 0.49, 0.06),
            PlanetSpec::reference("pluto", 0.09, 394.81, 1.0, 247.97, 2.09, 0.6),
        ];

        Self {
            sun: SunSpec {
                size: 1.0,
                texture: "sun".to_string(),
            },
            planets,
            moon: Some(MoonSpec {
                name: "moon".to_string(),
                size: 0.25,
                distance: 4.0,
                parent: 0,
                revolution_ratio: 2.0,
                texture: "moon".to_string(),
            }),
        }
    }
}

impl Scenario {
    pub fn validate(&self) -> OrreryResult<()> {
        if self.planets.is_empty() {
            return Err(OrreryError::Config("scenario has no planets".to_string()));
        }
        if !(self.sun.size > 0.0) {
            return Err(OrreryError::Config(format!(
                "sun size must be positive, got {}",
                self.sun.size
            )));
        }

        for planet in &self.planets {
            let values = [
                planet.size,
                planet.orbit_radius,
                planet.spin_period,
                planet.revolution_period,
                planet.axial_tilt,
                planet.orbit_inclination,
            ];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(OrreryError::Config(format!(
                    "planet {} has a non-finite parameter",
                    planet.name
                )));
            }
            if planet.size <= 0.0 {
                return Err(OrreryError::Config(format!(
                    "planet {} must have a positive size",
                    planet.name
                )));
            }
            if planet.spin_period == 0.0 || planet.revolution_period == 0.0 {
                return Err(OrreryError::Config(format!(
                    "planet {} has a zero period",
                    planet.name
                )));
            }
        }

        if let Some(moon) = &self.moon {
            if moon.parent >= self.planets.len() {
                return Err(OrreryError::Config(format!(
                    "moon {} orbits planet {}, but only {} planets exist",
                    moon.name,
                    moon.parent,
                    self.planets.len()
                )));
            }
            if !(moon.size > 0.0) || !moon.distance.is_finite() || !moon.revolution_ratio.is_finite()
            {
                return Err(OrreryError::Config(format!(
                    "moon {} has an invalid size, distance or ratio",
                    moon.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let scenario = Scenario::default();
        scenario.validate().unwrap();

        let names: Vec<&str> = scenario.planets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "earth", "mercury", "venus", "mars", "jupiter", "saturn", "uranus", "neptune",
                "pluto"
            ]
        );

        let earth = &scenario.planets[0];
        assert_eq!(earth.orbit_radius, 10.0);
        assert_eq!(earth.revolution_period, 1.0);

        let venus = &scenario.planets[2];
        assert_eq!(venus.name, "venus");
        assert!(venus.spin_period < 0.0);

        let moon = scenario.moon.as_ref().unwrap();
        assert_eq!(moon.parent, 0);
        assert_eq!(moon.distance, 4.0);
        assert_eq!(moon.revolution_ratio, 2.0);
    }

    #[test]
    fn test_rejects_zero_period() {
        let mut scenario = Scenario::default();
        scenario.planets[3].revolution_period = 0.0;
        assert!(matches!(scenario.validate(), Err(OrreryError::Config(_))));
    }

    #[test]
    fn test_rejects_orphan_moon() {
        let mut scenario = Scenario::default();
        scenario.planets.truncate(1);
        scenario.validate().unwrap();

        if let Some(moon) = scenario.moon.as_mut() {
            moon.parent = 1;
        }
        assert!(matches!(scenario.validate(), Err(OrreryError::Config(_))));
    }

    #[test]
    fn test_rejects_empty_catalog() {
        let scenario = Scenario {
            planets: Vec::new(),
            ..Scenario::default()
        };
        assert!(scenario.validate().is_err());
    }
}
