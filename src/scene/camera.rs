//! Orbit camera with damped mouse controls
//!
//! Spherical coordinate camera that orbits the globe. Mouse input only
//! accumulates rotation and zoom deltas; `update` applies a fraction of them
//! each tick so motion eases out after the button is released.

use glam::{Mat4, Vec3};

/// Keeps the camera off the poles
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Projection and view matrices for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub view: Mat4,
    pub projection: Mat4,
    pub eye: Vec3,
}

impl CameraState {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Orbit camera for globe navigation
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Horizontal angle (yaw) in radians
    yaw: f32,
    /// Vertical angle (pitch) in radians, clamped to avoid gimbal lock
    pitch: f32,
    /// Distance from target point
    distance: f32,
    /// Point the camera orbits around
    target: Vec3,
    /// Aspect ratio (width/height) for projection
    aspect: f32,
    /// Vertical field of view in radians
    fov: f32,
    near: f32,
    far: f32,
    /// Fraction of the pending motion applied per update (1.0 = no easing)
    damping: f32,
    /// Pending rotation and zoom not yet applied
    yaw_delta: f32,
    pitch_delta: f32,
    zoom_scale: f32,
    min_distance: f32,
    max_distance: f32,
}

impl OrbitCamera {
    /// Camera at `distance` on +Z looking at the origin
    pub fn new(fov_degrees: f32, near: f32, far: f32, distance: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance,
            target: Vec3::ZERO,
            aspect: 16.0 / 9.0,
            fov: fov_degrees.to_radians(),
            near,
            far,
            damping: 0.1,
            yaw_delta: 0.0,
            pitch_delta: 0.0,
            zoom_scale: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }

    /// Damping factor in (0, 1]
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.clamp(0.001, 1.0);
        self
    }

    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min.max(0.0);
        self.max_distance = max.max(self.min_distance);
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
        self
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.target, Vec3::Y)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// Matrices and eye position for rendering
    pub fn state(&self) -> CameraState {
        CameraState {
            view: self.view_matrix(),
            projection: self.projection_matrix(),
            eye: self.eye_position(),
        }
    }

    /// Calculate camera position from spherical coordinates
    pub fn eye_position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Queue an orbit from a mouse drag, in pixels
    ///
    /// A drag across the full window height turns the camera once around.
    pub fn on_mouse_drag(&mut self, delta: (f32, f32), viewport_height: f32) {
        let per_pixel = std::f32::consts::TAU / viewport_height.max(1.0);
        self.yaw_delta -= delta.0 * per_pixel;
        self.pitch_delta += delta.1 * per_pixel;
    }

    /// Queue a zoom from scroll wheel lines (positive = towards the globe)
    pub fn on_scroll(&mut self, lines: f32) {
        self.zoom_scale *= 0.95_f32.powf(lines);
    }

    /// Apply damped motion; call once per tick
    pub fn update(&mut self) {
        self.yaw += self.yaw_delta * self.damping;
        self.pitch = (self.pitch + self.pitch_delta * self.damping).clamp(-MAX_PITCH, MAX_PITCH);
        self.distance = (self.distance * self.zoom_scale).clamp(self.min_distance, self.max_distance);

        self.yaw_delta *= 1.0 - self.damping;
        self.pitch_delta *= 1.0 - self.damping;
        self.zoom_scale = 1.0;
    }

    /// Update aspect ratio on resize
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Vertical field of view in radians
    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// True while queued motion is still being applied
    pub fn is_moving(&self) -> bool {
        self.yaw_delta.abs() > 1e-6 || self.pitch_delta.abs() > 1e-6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_on_positive_z() {
        let camera = OrbitCamera::new(75.0, 0.1, 100.0, 3.0);
        assert!(camera.eye_position().distance(Vec3::new(0.0, 0.0, 3.0)) < 1e-6);
        let origin = camera.state().view_projection().project_point3(Vec3::ZERO);
        assert!(origin.x.abs() < 1e-6 && origin.y.abs() < 1e-6);
    }

    #[test]
    fn test_damping_eases_out() {
        let mut camera = OrbitCamera::new(75.0, 0.1, 100.0, 3.0).with_damping(0.1);
        camera.on_mouse_drag((-100.0, 0.0), 800.0);
        camera.update();
        let first = camera.yaw();
        camera.update();
        let second = camera.yaw() - first;
        assert!(first > 0.0);
        assert!(second > 0.0 && second < first);
        for _ in 0..500 {
            camera.update();
        }
        assert!(!camera.is_moving());
        // Total rotation converges to the full drag amount
        let expected = 100.0 * std::f32::consts::TAU / 800.0;
        assert!((camera.yaw() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = OrbitCamera::new(75.0, 0.1, 100.0, 3.0).with_damping(1.0);
        camera.on_mouse_drag((0.0, 10_000.0), 100.0);
        camera.update();
        assert!(camera.pitch() <= MAX_PITCH);
    }

    #[test]
    fn test_zoom_respects_limits() {
        let mut camera = OrbitCamera::new(75.0, 0.1, 100.0, 3.0).with_distance_limits(2.0, 10.0);
        camera.on_scroll(100.0);
        camera.update();
        assert_eq!(camera.distance(), 2.0);
        camera.on_scroll(-1000.0);
        camera.update();
        assert_eq!(camera.distance(), 10.0);
    }

    #[test]
    fn test_set_aspect_ignores_degenerate() {
        let mut camera = OrbitCamera::new(75.0, 0.1, 100.0, 3.0);
        camera.set_aspect(2.0);
        camera.set_aspect(0.0);
        assert_eq!(camera.aspect(), 2.0);
    }
}
