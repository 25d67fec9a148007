//! Configuration with defaults, RON persistence and command-line overrides.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::{OrreryError, OrreryResult, graphics::MIN_RESOLUTION, scenario::Scenario};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrreryConfig {
    pub window: WindowConfig,
    pub simulation: SimulationConfig,
    pub lighting: LightingConfig,
    pub camera: CameraConfig,
    pub assets: AssetConfig,
    pub scenario: Scenario,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in physical pixels.
    pub width: u32,
    /// Window height in physical pixels.
    pub height: u32,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Angular samples of the shared sphere mesh.
    pub sphere_resolution: u32,
    /// Upper bound on simulation steps per second.
    pub updates_per_second: f64,
    /// Radians per second for a period ratio of 1.
    pub angular_speed: f64,
    /// Planets advanced and drawn, counted from the start of the catalog.
    pub visible_planets: usize,
    /// Seed for the starting orbital phases; random when absent.
    pub phase_seed: Option<u64>,
    /// Starting phases are drawn from `[0, max_start_phase)`.
    pub max_start_phase: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingConfig {
    pub sun_position: [f64; 3],
    /// Exponent `k` of the `distance^-k` dimming of light vectors.
    pub attenuation_exponent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f64; 3],
    pub center: [f64; 3],
    pub fov_degrees: f64,
    pub near: f64,
    pub far: f64,
    /// Radians of yaw and pitch per dragged pixel.
    pub orbit_sensitivity: [f64; 2],
    /// Pixels of drag per unit of pan.
    pub pan_divisor: f64,
    /// Distance scale per wheel step.
    pub zoom_factor: f64,
    /// Far plane scale per Z key press (X applies the inverse).
    pub far_step: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    pub texture_dir: PathBuf,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1536,
            height: 864,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sphere_resolution: 32,
            updates_per_second: 60.0,
            angular_speed: 0.24,
            visible_planets: 9,
            phase_seed: None,
            max_start_phase: 3.0 * std::f64::consts::FRAC_PI_4,
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            sun_position: [0.0; 3],
            attenuation_exponent: crate::math::DEFAULT_ATTENUATION_EXPONENT,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 10.0, 30.0],
            center: [0.0; 3],
            fov_degrees: 45.0,
            near: 0.1,
            far: 400.0,
            orbit_sensitivity: [1.0 / 200.0, 1.0 / 400.0],
            pan_divisor: 30.0,
            zoom_factor: 1.1,
            far_step: 0.9,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            texture_dir: PathBuf::from("media"),
        }
    }
}

// --- Load / Save ---

impl OrreryConfig {
    /// Load a RON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> OrreryResult<Self> {
        if !path.exists() {
            log::warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            OrreryError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_ron(&contents)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_ron(contents: &str) -> OrreryResult<Self> {
        Ok(ron::from_str(contents)?)
    }

    pub fn to_ron(&self) -> OrreryResult<String> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        ron::ser::to_string_pretty(self, pretty)
            .map_err(|e| OrreryError::Config(format!("cannot serialize config: {}", e)))
    }

    pub fn save(&self, path: &Path) -> OrreryResult<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    pub fn validate(&self) -> OrreryResult<()> {
        let simulation = &self.simulation;
        if simulation.sphere_resolution < MIN_RESOLUTION {
            return Err(OrreryError::InvalidResolution(simulation.sphere_resolution));
        }
        if !(simulation.updates_per_second > 0.0) || !simulation.updates_per_second.is_finite() {
            return Err(OrreryError::Config(format!(
                "updates_per_second must be positive, got {}",
                simulation.updates_per_second
            )));
        }
        if !simulation.angular_speed.is_finite() {
            return Err(OrreryError::Config("angular_speed must be finite".to_string()));
        }
        if !(simulation.max_start_phase >= 0.0) || !simulation.max_start_phase.is_finite() {
            return Err(OrreryError::Config(format!(
                "max_start_phase must be a non-negative angle, got {}",
                simulation.max_start_phase
            )));
        }
        if !(self.lighting.attenuation_exponent >= 0.0) {
            return Err(OrreryError::Config(format!(
                "attenuation_exponent must be non-negative, got {}",
                self.lighting.attenuation_exponent
            )));
        }

        let camera = &self.camera;
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(OrreryError::Config(format!(
                "camera planes must satisfy 0 < near < far, got {} and {}",
                camera.near, camera.far
            )));
        }
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(OrreryError::Config(format!(
                "fov_degrees must be in (0, 180), got {}",
                camera.fov_degrees
            )));
        }
        if !(camera.zoom_factor > 0.0) || !(camera.far_step > 0.0) || camera.pan_divisor == 0.0 {
            return Err(OrreryError::Config(
                "camera zoom_factor, far_step and pan_divisor must be non-zero".to_string(),
            ));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(OrreryError::Config("window size must be non-zero".to_string()));
        }

        self.scenario.validate()
    }
}

/// Command-line arguments.
///
/// CLI values override settings loaded from the config file.
#[derive(Parser, Debug)]
#[command(name = "orrery", about = "Real-time solar system renderer")]
pub struct CliArgs {
    /// Path to a RON config file.
    #[arg(long, default_value = "orrery.ron")]
    pub config: PathBuf,

    /// Sphere resolution (angular samples, at least 4).
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Number of planets shown at startup.
    #[arg(long)]
    pub planets: Option<usize>,

    /// Seed for the starting orbital phases.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run the simulation without a window.
    #[arg(long)]
    pub headless: bool,

    /// Simulation steps to run in headless mode.
    #[arg(long, default_value_t = 600)]
    pub frames: u64,

    /// Log filter (error, warn, info, debug, trace or a full env_logger spec).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl OrreryConfig {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(resolution) = args.resolution {
            self.simulation.sphere_resolution = resolution;
        }
        if let Some(planets) = args.planets {
            self.simulation.visible_planets = planets;
        }
        if let Some(seed) = args.seed {
            self.simulation.phase_seed = Some(seed);
        }
    }
}
