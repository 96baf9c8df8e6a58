use bytemuck::{Pod, Zeroable};

use crate::geometry::{ClFloat3, Vec3, AABB};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Sphere { center: Vec3, radius: f32 },
    Box { min: Vec3, max: Vec3 },
}

impl Primitive {
    pub fn bounds(&self) -> AABB {
        match *self {
            Primitive::Sphere { center, radius } => {
                AABB::new(center - Vec3::splat(radius), center + Vec3::splat(radius))
            }
            Primitive::Box { min, max } => AABB::from_corners(min, max),
        }
    }
}

/// Surface description; only the kernel interprets it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub albedo: Vec3,
    pub emission: Vec3,
    pub ior: f32,

    pub specular_chance: f32,
    pub specular_roughness: f32,
    pub specular_color: Vec3,

    pub refraction_chance: f32,
    pub refraction_roughness: f32,
    pub refraction_absorption: Vec3,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Vec3::splat(1.0),
            emission: Vec3::zero(),
            ior: 1.0,

            specular_chance: 0.0,
            specular_roughness: 0.0,
            specular_color: Vec3::splat(1.0),

            refraction_chance: 0.0,
            refraction_roughness: 0.0,
            refraction_absorption: Vec3::zero(),
        }
    }
}

impl Material {
    pub fn diffuse(albedo: Vec3) -> Self {
        Material { albedo, ..Default::default() }
    }

    pub fn light(emission: Vec3) -> Self {
        Material { albedo: Vec3::zero(), emission, ..Default::default() }
    }

    pub fn with_specular(self, chance: f32, roughness: f32, color: Vec3) -> Self {
        Material {
            specular_chance: chance,
            specular_roughness: roughness,
            specular_color: color,
            ..self
        }
    }

    pub fn with_refraction(self, chance: f32, roughness: f32, ior: f32, absorption: Vec3) -> Self {
        Material {
            refraction_chance: chance,
            refraction_roughness: roughness,
            ior,
            refraction_absorption: absorption,
            ..self
        }
    }

    pub fn is_emissive(&self) -> bool {
        self.emission.0 > 0.0 || self.emission.1 > 0.0 || self.emission.2 > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Object {
    pub primitive: Primitive,
    pub material: Material,
}

impl Object {
    pub fn sphere(center: Vec3, radius: f32, material: Material) -> Object {
        Object { primitive: Primitive::Sphere { center, radius }, material }
    }

    pub fn cuboid(min: Vec3, max: Vec3, material: Material) -> Object {
        Object { primitive: Primitive::Box { min, max }, material }
    }

    pub fn bounds(&self) -> AABB {
        self.primitive.bounds()
    }
}

pub const CL_SPHERE: u32 = 0;
pub const CL_BOX: u32 = 1;

/// Device layout of [`Object`]; mirrors the packed `Object` struct in `cl/render.cl`.
///
/// `shape` is the kernel's sphere/box union: a box stores min then max, a
/// sphere stores its center then its radius in the first lane of the second slot.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ClObject {
    pub kind: u32,
    pub shape: [ClFloat3; 2],
    pub albedo: ClFloat3,
    pub emission: ClFloat3,

    pub ior: f32,

    pub specular_chance: f32,
    pub specular_roughness: f32,
    pub specular_color: ClFloat3,

    pub refraction_chance: f32,
    pub refraction_roughness: f32,
    pub refraction_absorption: ClFloat3,
}

impl From<&Object> for ClObject {
    fn from(object: &Object) -> Self {
        let (kind, shape) = match object.primitive {
            Primitive::Sphere { center, radius } => {
                (CL_SPHERE, [center.into(), ClFloat3::new(radius, 0.0, 0.0)])
            }
            Primitive::Box { min, max } => {
                let bounds = AABB::from_corners(min, max);
                (CL_BOX, [bounds.minimum.into(), bounds.maximum.into()])
            }
        };
        let material = &object.material;

        ClObject {
            kind,
            shape,
            albedo: material.albedo.into(),
            emission: material.emission.into(),
            ior: material.ior,
            specular_chance: material.specular_chance,
            specular_roughness: material.specular_roughness,
            specular_color: material.specular_color.into(),
            refraction_chance: material.refraction_chance,
            refraction_roughness: material.refraction_roughness,
            refraction_absorption: material.refraction_absorption.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_matches_kernel_layout() {
        assert_eq!(std::mem::size_of::<ClObject>(), 120);
        assert_eq!(std::mem::align_of::<ClObject>(), 1);
    }

    #[test]
    fn sphere_bounds_extend_radius_on_every_axis() {
        let sphere = Primitive::Sphere { center: Vec3(1.0, 2.0, 3.0), radius: 0.5 };
        assert_eq!(sphere.bounds(), AABB::new(Vec3(0.5, 1.5, 2.5), Vec3(1.5, 2.5, 3.5)));
    }

    #[test]
    fn box_bounds_accept_swapped_corners() {
        let cuboid = Primitive::Box { min: Vec3(1.0, -1.0, 1.0), max: Vec3(-1.0, 1.0, -1.0) };
        assert_eq!(cuboid.bounds(), AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0)));
    }

    #[test]
    fn sphere_radius_sits_after_center() {
        let object = Object::sphere(Vec3(1.0, 2.0, 3.0), 4.0, Material::default());
        let device = ClObject::from(&object);
        let words: [u32; 30] = bytemuck::cast(device);
        assert_eq!(words[0], CL_SPHERE);
        assert_eq!(words[1..4], [1.0f32.to_bits(), 2.0f32.to_bits(), 3.0f32.to_bits()]);
        assert_eq!(words[5], 4.0f32.to_bits());
    }

    #[test]
    fn default_material_matches_kernel_defaults() {
        let device = ClObject::from(&Object::cuboid(Vec3::zero(), Vec3::splat(1.0), Material::default()));
        let ior = device.ior;
        let albedo = device.albedo;
        assert_eq!(ior, 1.0);
        assert_eq!(albedo, ClFloat3::new(1.0, 1.0, 1.0));
        assert!(!Material::default().is_emissive());
        assert!(Material::light(Vec3(4.0, 4.0, 4.0)).is_emissive());
    }
}
