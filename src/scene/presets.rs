use clap::ValueEnum;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::camera::Camera;
use super::object::{Material, Object};
use super::scene::{Scene, SceneError};
use crate::geometry::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScenePreset {
    /// Closed room with colored side walls and a ceiling light
    Cornell,
    /// Field of randomly placed spheres on a floor slab
    Spheres,
}

impl ScenePreset {
    pub fn build(self, seed: u64, fov: f32) -> Result<Scene, SceneError> {
        match self {
            ScenePreset::Cornell => cornell_box(fov),
            ScenePreset::Spheres => random_spheres(seed, 64, fov),
        }
    }
}

const WALL: f32 = 0.1;
const ROOM: f32 = 5.0;

pub fn cornell_box(fov: f32) -> Result<Scene, SceneError> {
    let white = Material::diffuse(Vec3(0.73, 0.73, 0.73));
    let red = Material::diffuse(Vec3(0.65, 0.05, 0.05));
    let green = Material::diffuse(Vec3(0.12, 0.45, 0.15));

    let objects = vec![
        // floor, ceiling, back wall
        Object::cuboid(Vec3(-ROOM, -WALL, -ROOM), Vec3(ROOM, 0.0, ROOM), white),
        Object::cuboid(Vec3(-ROOM, 2.0 * ROOM, -ROOM), Vec3(ROOM, 2.0 * ROOM + WALL, ROOM), white),
        Object::cuboid(Vec3(-ROOM, 0.0, ROOM), Vec3(ROOM, 2.0 * ROOM, ROOM + WALL), white),
        // +x is on the left when looking down +z
        Object::cuboid(Vec3(ROOM, 0.0, -ROOM), Vec3(ROOM + WALL, 2.0 * ROOM, ROOM), red),
        Object::cuboid(Vec3(-ROOM - WALL, 0.0, -ROOM), Vec3(-ROOM, 2.0 * ROOM, ROOM), green),
        Object::cuboid(
            Vec3(-1.5, 2.0 * ROOM - WALL, -1.5),
            Vec3(1.5, 2.0 * ROOM, 1.5),
            Material::light(Vec3(12.0, 11.0, 9.0)),
        ),
        Object::cuboid(Vec3(-3.5, 0.0, 0.5), Vec3(-0.5, 6.0, 3.5), white),
        Object::sphere(
            Vec3(2.0, 1.5, -1.0),
            1.5,
            Material::diffuse(Vec3(0.9, 0.9, 0.9)).with_specular(1.0, 0.05, Vec3(0.9, 0.9, 0.9)),
        ),
        Object::sphere(
            Vec3(-1.0, 1.0, -2.5),
            1.0,
            Material::diffuse(Vec3(0.9, 0.9, 0.9))
                .with_specular(0.02, 0.0, Vec3(1.0, 1.0, 1.0))
                .with_refraction(1.0, 0.0, 1.5, Vec3(0.1, 0.5, 0.8)),
        ),
    ];

    let mut camera = Camera::new(Vec3(0.0, ROOM, -4.0 * ROOM), fov);
    camera.set_rotation(0.0, 0.0);
    Scene::new(objects, camera)
}

pub fn random_spheres(seed: u64, count: usize, fov: f32) -> Result<Scene, SceneError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut objects = vec![
        Object::cuboid(Vec3(-30.0, -1.0, -30.0), Vec3(30.0, 0.0, 30.0), Material::diffuse(Vec3(0.5, 0.5, 0.5))),
        Object::sphere(Vec3(0.0, 60.0, 0.0), 15.0, Material::light(Vec3(6.0, 6.0, 5.5))),
    ];

    for _ in 0..count {
        let radius = rng.gen_range(0.3..1.5);
        let center = Vec3(rng.gen_range(-25.0..25.0), radius, rng.gen_range(-25.0..25.0));
        let albedo = Vec3(rng.gen(), rng.gen(), rng.gen());
        let material = match rng.gen_range(0..10) {
            0 => Material::light(albedo * 4.0),
            1..=3 => Material::diffuse(albedo).with_specular(1.0, rng.gen_range(0.0..0.3), albedo),
            4 => Material::diffuse(Vec3::splat(1.0))
                .with_specular(0.05, 0.0, Vec3::splat(1.0))
                .with_refraction(1.0, rng.gen_range(0.0..0.1), 1.5, albedo * 0.5),
            _ => Material::diffuse(albedo),
        };
        objects.push(Object::sphere(center, radius, material));
    }

    let mut camera = Camera::new(Vec3(0.0, 4.0, -35.0), fov);
    camera.set_rotation(0.0, -5.0);
    Scene::new(objects, camera)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cornell_box_has_a_light() {
        let scene = cornell_box(70.0).unwrap();
        assert_eq!(scene.lights(), vec![5]);
        assert!(scene.bounds().is_some());
    }

    #[test]
    fn random_spheres_are_reproducible() {
        let a = random_spheres(42, 32, 70.0).unwrap();
        let b = random_spheres(42, 32, 70.0).unwrap();
        let c = random_spheres(43, 32, 70.0).unwrap();
        assert_eq!(a.objects, b.objects);
        assert_ne!(a.objects, c.objects);
        assert_eq!(a.objects.len(), 34);
        assert!(a.lights().contains(&1));
    }

    #[test]
    fn presets_build_valid_trees() {
        for preset in [ScenePreset::Cornell, ScenePreset::Spheres] {
            let scene = preset.build(1, 70.0).unwrap();
            let tree = scene.build_tree();
            assert!(!tree.nodes.is_empty());
        }
    }
}
