/// Orbit camera: a position circling a look-at center
/// Matrices are built in 64-bit and narrowed when written to the uniform buffer
use glam::{DMat4, DQuat, DVec3};

use crate::config::CameraConfig;

/// Smallest angle kept between the view direction and the world up axis
const POLE_MARGIN: f64 = 1e-3;

#[derive(Debug, Clone)]
pub struct Camera {
    position: DVec3,
    center: DVec3,
    up: DVec3,

    fov_degrees: f64,
    aspect_ratio: f64,
    near_plane: f64,
    far_plane: f64,

    orbit_sensitivity: [f64; 2],
    pan_divisor: f64,
    zoom_factor: f64,

    home_position: DVec3,
    home_center: DVec3,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect_ratio: f64) -> Self {
        let position = DVec3::from_array(config.position);
        let center = DVec3::from_array(config.center);

        Self {
            position,
            center,
            up: DVec3::Y,
            fov_degrees: config.fov_degrees,
            aspect_ratio,
            near_plane: config.near,
            far_plane: config.far,
            orbit_sensitivity: config.orbit_sensitivity,
            pan_divisor: config.pan_divisor,
            zoom_factor: config.zoom_factor,
            home_position: position,
            home_center: center,
        }
    }

    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.center, self.up)
    }

    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect_ratio,
            self.near_plane,
            self.far_plane,
        )
    }

    pub fn view_projection_matrix(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Circle the center: horizontal drag yaws about world Y, vertical drag pitches about the
    /// camera's right vector. Deltas are in pixels.
    pub fn orbit(&mut self, dx: f64, dy: f64) {
        let yaw = -dx * self.orbit_sensitivity[0];
        let pitch = -dy * self.orbit_sensitivity[1];

        let mut offset = self.position - self.center;
        offset = DQuat::from_axis_angle(DVec3::Y, yaw) * offset;

        if let Some(right) = (-offset).cross(self.up).try_normalize() {
            let pitched = DQuat::from_axis_angle(right, pitch) * offset;
            let from_pole = pitched.angle_between(self.up);
            if from_pole > POLE_MARGIN && from_pole < std::f64::consts::PI - POLE_MARGIN {
                offset = pitched;
            }
        }

        self.position = self.center + offset;
    }

    /// Slide position and center together: horizontal drag moves sideways in the ground
    /// plane, vertical drag moves along world Y. Deltas are in pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let look = self.position - self.center;
        let ground = DVec3::new(look.x, 0.0, look.z);
        let ground_length = ground.length();

        let mut shift = DVec3::new(0.0, dy / self.pan_divisor, 0.0);
        if ground_length > f64::EPSILON {
            let scale = ground_length * self.pan_divisor;
            shift.x = -dx * look.z / scale;
            shift.z = dx * look.x / scale;
        }

        self.position += shift;
        self.center += shift;
    }

    /// Scale the center-to-position distance by `zoom_factor` per wheel step.
    /// Negative steps move away, positive steps move closer.
    pub fn zoom(&mut self, steps: f64) {
        if steps == 0.0 || !steps.is_finite() {
            return;
        }
        let scale = self.zoom_factor.powf(-steps);
        self.position = self.center + (self.position - self.center) * scale;
    }

    pub fn scale_far(&mut self, factor: f64) {
        let far = self.far_plane * factor;
        if far > self.near_plane {
            self.far_plane = far;
        } else {
            log::warn!("Far plane {:.3} would cross the near plane; ignored", far);
        }
    }

    /// Back to the configured starting pose
    pub fn reset(&mut self) {
        self.position = self.home_position;
        self.center = self.home_center;
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f64) {
        self.aspect_ratio = aspect_ratio;
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn far_plane(&self) -> f64 {
        self.far_plane
    }

    pub fn near_plane(&self) -> f64 {
        self.near_plane
    }

    pub fn distance(&self) -> f64 {
        self.position.distance(self.center)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraConfig::default(), 16.0 / 9.0)
    }
}
