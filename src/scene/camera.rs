use crate::geometry::{Matrix4x4, Vec3};

const DEFAULT_FOV: f32 = 70.0;
const DEFAULT_NEAR_CLIP: f32 = 0.1;
const DEFAULT_FAR_CLIP: f32 = 1000.0;

/// Degrees of rotation per unit of mouse motion, per axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sensitivity {
    pub x: f32,
    pub y: f32,
}

impl Sensitivity {
    pub fn new(x: f32, y: f32) -> Sensitivity {
        Sensitivity { x, y }
    }

    pub fn scaled(self, factor: f32) -> Sensitivity {
        Sensitivity { x: self.x * factor, y: self.y * factor }
    }
}

impl Default for Sensitivity {
    fn default() -> Self {
        Sensitivity { x: 0.1, y: 0.1 }
    }
}

/// First-person camera. Angles are stored in radians and exposed in degrees.
///
/// Yaw 0 looks down +z; positive pitch looks up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    yaw: f32,
    pitch: f32,
    fov: f32,
    near_clip: f32,
    far_clip: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Camera::new(Vec3::zero(), DEFAULT_FOV)
    }
}

impl Camera {
    pub fn new(position: Vec3, fov: f32) -> Camera {
        Camera {
            position,
            yaw: 0.0,
            pitch: 0.0,
            fov: fov.to_radians(),
            near_clip: DEFAULT_NEAR_CLIP,
            far_clip: DEFAULT_FAR_CLIP,
        }
    }

    pub fn fov(&self) -> f32 {
        self.fov.to_degrees()
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.to_radians();
    }

    pub fn near_clip(&self) -> f32 {
        self.near_clip
    }

    pub fn set_near_clip(&mut self, near_clip: f32) {
        self.near_clip = near_clip;
    }

    pub fn far_clip(&self) -> f32 {
        self.far_clip
    }

    pub fn set_far_clip(&mut self, far_clip: f32) {
        self.far_clip = far_clip;
    }

    /// (yaw, pitch) in degrees
    pub fn rotation(&self) -> (f32, f32) {
        (self.yaw.to_degrees(), self.pitch.to_degrees())
    }

    pub fn set_rotation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = wrap_degrees(yaw).to_radians();
        self.pitch = pitch.clamp(-90.0, 90.0).to_radians();
    }

    /// Rotate by a mouse delta, scaled per axis by `sensitivity`
    pub fn add_rotation(&mut self, yaw: f32, pitch: f32, sensitivity: Sensitivity) {
        let (current_yaw, current_pitch) = self.rotation();
        self.set_rotation(current_yaw + yaw * sensitivity.x, current_pitch + pitch * sensitivity.y);
    }

    pub fn forward(&self) -> Vec3 {
        let cos_pitch = self.pitch.cos();
        Vec3(-self.yaw.sin() * cos_pitch, self.pitch.sin(), self.yaw.cos() * cos_pitch)
    }

    pub fn right(&self) -> Vec3 {
        Vec3(-self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    pub fn up(&self) -> Vec3 {
        Vec3(
            self.pitch.sin() * self.yaw.sin(),
            self.pitch.cos(),
            -self.yaw.cos() * self.pitch.sin(),
        )
    }

    pub fn view_matrix(&self) -> Matrix4x4 {
        Matrix4x4::look_at(self.position, self.forward(), self.up())
    }

    pub fn projection_matrix(&self, aspect: f32) -> Matrix4x4 {
        Matrix4x4::perspective(self.fov, sanitize_aspect(aspect), self.near_clip, self.far_clip)
    }

    /// World to clip space
    pub fn view_projection(&self, aspect: f32) -> Matrix4x4 {
        Matrix4x4::matmul(self.projection_matrix(aspect), self.view_matrix())
    }

    /// Clip to world space; the kernel unprojects pixel corners with this
    pub fn inverse_view_projection(&self, aspect: f32) -> Matrix4x4 {
        let projection_inverse =
            Matrix4x4::perspective_inverse(self.fov, sanitize_aspect(aspect), self.near_clip, self.far_clip);
        Matrix4x4::matmul(self.view_matrix().rigid_inverse(), projection_inverse)
    }
}

fn wrap_degrees(angle: f32) -> f32 {
    angle.rem_euclid(360.0)
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_nan() { 1.0 } else { aspect }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn yaw_wraps_and_pitch_clamps() {
        let mut camera = Camera::default();
        camera.set_rotation(370.0, 120.0);
        let (yaw, pitch) = camera.rotation();
        assert!((yaw - 10.0).abs() < 1e-3);
        assert!((pitch - 90.0).abs() < 1e-3);

        camera.set_rotation(-30.0, -200.0);
        let (yaw, pitch) = camera.rotation();
        assert!((yaw - 330.0).abs() < 1e-3);
        assert!((pitch + 90.0).abs() < 1e-3);
    }

    #[test]
    fn add_rotation_scales_by_sensitivity() {
        let mut camera = Camera::default();
        camera.add_rotation(100.0, -50.0, Sensitivity::new(0.5, 0.2));
        let (yaw, pitch) = camera.rotation();
        assert!((yaw - 50.0).abs() < 1e-3);
        assert!((pitch + 10.0).abs() < 1e-3);
    }

    #[test]
    fn basis_is_orthonormal() {
        let mut camera = Camera::default();
        for (yaw, pitch) in [(0.0, 0.0), (45.0, 30.0), (200.0, -60.0), (315.0, 89.0)] {
            camera.set_rotation(yaw, pitch);
            let (f, r, u) = (camera.forward(), camera.right(), camera.up());
            for v in [f, r, u] {
                assert!((v.length() - 1.0).abs() < 1e-5);
            }
            assert!(Vec3::dot(f, r).abs() < 1e-5);
            assert!(Vec3::dot(f, u).abs() < 1e-5);
            assert!(Vec3::dot(r, u).abs() < 1e-5);
        }
    }

    #[test]
    fn default_orientation_looks_down_positive_z() {
        let camera = Camera::default();
        assert_close(camera.forward(), Vec3(0.0, 0.0, 1.0));
        assert_close(camera.up(), Vec3(0.0, 1.0, 0.0));
        assert_close(camera.right(), Vec3(-1.0, 0.0, 0.0));
    }

    #[test]
    fn inverse_view_projection_undoes_view_projection() {
        let mut camera = Camera::new(Vec3(1.0, 2.0, -3.0), 60.0);
        camera.set_rotation(35.0, -20.0);
        let forward = Matrix4x4::matmul(camera.inverse_view_projection(1.5), camera.view_projection(1.5));
        let point = Vec3(0.3, -0.7, 4.0);
        assert_close(forward.apply_point(point), point);
    }

    #[test]
    fn center_of_screen_unprojects_along_forward() {
        let mut camera = Camera::new(Vec3(0.0, 1.0, 0.0), 70.0);
        camera.set_rotation(120.0, 15.0);
        let inverse = camera.inverse_view_projection(16.0 / 9.0);
        let near = inverse.apply_point(Vec3(0.0, 0.0, -1.0));
        let far = inverse.apply_point(Vec3(0.0, 0.0, 1.0));
        assert_close(Vec3::normalized(far - near), camera.forward());
    }

    #[test]
    fn nan_aspect_is_treated_as_square() {
        let camera = Camera::default();
        assert_eq!(camera.view_projection(f32::NAN), camera.view_projection(1.0));
    }
}
