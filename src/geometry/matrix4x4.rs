use std::ops::{Index, IndexMut};

use bytemuck::{Pod, Zeroable};

use super::Vec3;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Matrix4x4 {
    // row-major
    pub data: [[f32; 4]; 4],
}

impl Index<usize> for Matrix4x4 {
    type Output = f32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index / 4][index % 4]
    }
}

impl IndexMut<usize> for Matrix4x4 {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index / 4][index % 4]
    }
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Matrix4x4::identity()
    }
}

impl Matrix4x4 {
    pub fn identity() -> Self {
        Matrix4x4 {
            data: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[allow(clippy::too_many_arguments)]
    #[rustfmt::skip]
    pub fn create(a11: f32, a12: f32, a13: f32, a14: f32,
                  a21: f32, a22: f32, a23: f32, a24: f32,
                  a31: f32, a32: f32, a33: f32, a34: f32,
                  a41: f32, a42: f32, a43: f32, a44: f32) -> Self {
        Matrix4x4 {
            data: [[a11, a12, a13, a14],
                   [a21, a22, a23, a24],
                   [a31, a32, a33, a34],
                   [a41, a42, a43, a44]]
        }
    }

    pub fn matmul(a: Matrix4x4, b: Matrix4x4) -> Self {
        let mut m = Matrix4x4::identity();
        for i in 0..4 {
            for j in 0..4 {
                let mut dot = 0.0;
                for k in 0..4 {
                    dot += a.data[i][k] * b.data[k][j]
                }
                m.data[i][j] = dot;
            }
        }
        m
    }

    pub fn transposed(&self) -> Matrix4x4 {
        let mut me = *self;
        for i in 0..4 {
            for j in 0..i {
                me.data[i][j] = self.data[j][i];
                me.data[j][i] = self.data[i][j];
            }
        }
        me
    }

    /// Right-handed perspective projection mapping depth to [-1, 1], fov in radians
    #[rustfmt::skip]
    pub fn perspective(yfov: f32, aspect: f32, near: f32, far: f32) -> Matrix4x4 {
        let f = 1.0 / f32::tan(yfov / 2.0);
        Matrix4x4::create(
            f / aspect, 0.0, 0.0,                         0.0,
            0.0,        f,   0.0,                         0.0,
            0.0,        0.0, (far + near) / (near - far), 2.0 * far * near / (near - far),
            0.0,        0.0, -1.0,                        0.0,
        )
    }

    /// Closed-form inverse of [`Matrix4x4::perspective`] with the same arguments
    #[rustfmt::skip]
    pub fn perspective_inverse(yfov: f32, aspect: f32, near: f32, far: f32) -> Matrix4x4 {
        let f = 1.0 / f32::tan(yfov / 2.0);
        let two_fn = 2.0 * far * near;
        Matrix4x4::create(
            aspect / f, 0.0,     0.0,                  0.0,
            0.0,        1.0 / f, 0.0,                  0.0,
            0.0,        0.0,     0.0,                  -1.0,
            0.0,        0.0,     (near - far) / two_fn, (far + near) / two_fn,
        )
    }

    /// World-to-camera matrix looking from `eye` along `forward`
    #[rustfmt::skip]
    pub fn look_at(eye: Vec3, forward: Vec3, up: Vec3) -> Matrix4x4 {
        let f = Vec3::normalized(forward);
        let s = Vec3::normalized(Vec3::cross(f, up));
        let u = Vec3::cross(s, f);
        Matrix4x4::create(
            s.0,  s.1,  s.2,  -Vec3::dot(s, eye),
            u.0,  u.1,  u.2,  -Vec3::dot(u, eye),
            -f.0, -f.1, -f.2, Vec3::dot(f, eye),
            0.0,  0.0,  0.0,  1.0,
        )
    }

    /// Inverse of a matrix made only of a rotation and a translation
    pub fn rigid_inverse(&self) -> Matrix4x4 {
        let mut inv = Matrix4x4::identity();
        for i in 0..3 {
            for j in 0..3 {
                inv.data[i][j] = self.data[j][i];
            }
        }
        let t = Vec3(self.data[0][3], self.data[1][3], self.data[2][3]);
        let t_inv = -inv.apply_vector(t);
        inv.data[0][3] = t_inv.0;
        inv.data[1][3] = t_inv.1;
        inv.data[2][3] = t_inv.2;
        inv
    }

    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        let a = self.data[0][0] * p.0
            + self.data[0][1] * p.1
            + self.data[0][2] * p.2
            + self.data[0][3];
        let b = self.data[1][0] * p.0
            + self.data[1][1] * p.1
            + self.data[1][2] * p.2
            + self.data[1][3];
        let c = self.data[2][0] * p.0
            + self.data[2][1] * p.1
            + self.data[2][2] * p.2
            + self.data[2][3];
        let d = self.data[3][0] * p.0
            + self.data[3][1] * p.1
            + self.data[3][2] * p.2
            + self.data[3][3];
        Vec3(a / d, b / d, c / d)
    }

    pub fn apply_vector(&self, v: Vec3) -> Vec3 {
        let a = self.data[0][0] * v.0 + self.data[0][1] * v.1 + self.data[0][2] * v.2;
        let b = self.data[1][0] * v.0 + self.data[1][1] * v.1 + self.data[1][2] * v.2;
        let c = self.data[2][0] * v.0 + self.data[2][1] * v.1 + self.data[2][2] * v.2;
        Vec3(a, b, c)
    }

    /// Row-major flat copy, the layout the kernel reads as `float16`
    pub fn to_row_major(&self) -> [f32; 16] {
        bytemuck::cast(self.data)
    }
}

impl From<[[f32; 4]; 4]> for Matrix4x4 {
    fn from(value: [[f32; 4]; 4]) -> Self {
        Self { data: value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near_identity(m: Matrix4x4) {
        let identity = Matrix4x4::identity();
        for i in 0..16 {
            assert!((m[i] - identity[i]).abs() < 1e-4, "element {i} was {}", m[i]);
        }
    }

    #[test]
    fn perspective_inverse_undoes_perspective() {
        let fov = 70f32.to_radians();
        let p = Matrix4x4::perspective(fov, 1.5, 0.01, 1000.0);
        let p_inv = Matrix4x4::perspective_inverse(fov, 1.5, 0.01, 1000.0);
        assert_near_identity(Matrix4x4::matmul(p, p_inv));
        assert_near_identity(Matrix4x4::matmul(p_inv, p));
    }

    #[test]
    fn rigid_inverse_undoes_look_at() {
        let view = Matrix4x4::look_at(Vec3(1.0, 2.0, 3.0), Vec3(0.3, -0.2, 1.0), Vec3(0.0, 1.0, 0.0));
        assert_near_identity(Matrix4x4::matmul(view, view.rigid_inverse()));
    }

    #[test]
    fn look_at_maps_eye_to_origin() {
        let eye = Vec3(4.0, -1.0, 2.5);
        let view = Matrix4x4::look_at(eye, Vec3(0.0, 0.0, 1.0), Vec3(0.0, 1.0, 0.0));
        assert!(view.apply_point(eye).length() < 1e-5);
    }

    #[test]
    fn transposed_swaps_rows_and_columns() {
        let m = Matrix4x4::from([[0.0, 1.0, 2.0, 3.0], [4.0, 5.0, 6.0, 7.0], [8.0, 9.0, 10.0, 11.0], [12.0, 13.0, 14.0, 15.0]]);
        let t = m.transposed();
        assert_eq!(t.data[0], [0.0, 4.0, 8.0, 12.0]);
        assert_eq!(t.transposed(), m);
    }
}
