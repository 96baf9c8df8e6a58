mod aabb;
mod matrix4x4;
mod vec3;

pub use aabb::AABB;
pub use matrix4x4::Matrix4x4;
pub use vec3::ClFloat3;
pub use vec3::Vec3;
