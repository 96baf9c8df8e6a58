use log::debug;
use thiserror::Error;

use super::camera::Camera;
use super::object::{ClObject, Object, Primitive};
use crate::accel::{node::MAX_NODE_PAYLOAD, KdTree};
use crate::geometry::{Vec3, AABB};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("object {index} has non-finite bounds")]
    NonFiniteBounds { index: usize },
    #[error("sphere {index} has negative radius {radius}")]
    NegativeRadius { index: usize, radius: f32 },
    #[error("scene holds {count} objects, more than a tree node can address")]
    TooManyObjects { count: usize },
}

/// Flat list of objects plus where the camera starts.
/// An object's position in `objects` is the index the tree and the kernel refer to it by.
#[derive(Debug, Clone)]
pub struct Scene {
    pub objects: Vec<Object>,
    pub camera: Camera,
}

impl Scene {
    pub fn new(objects: Vec<Object>, camera: Camera) -> Result<Scene, SceneError> {
        let scene = Scene { objects, camera };
        scene.validate()?;
        Ok(scene)
    }

    fn validate(&self) -> Result<(), SceneError> {
        if self.objects.len() > MAX_NODE_PAYLOAD as usize {
            return Err(SceneError::TooManyObjects { count: self.objects.len() });
        }
        for (index, object) in self.objects.iter().enumerate() {
            if let Primitive::Sphere { radius, .. } = object.primitive {
                if radius < 0.0 {
                    return Err(SceneError::NegativeRadius { index, radius });
                }
            }
            let bounds = object.bounds();
            let finite = |v: Vec3| v.0.is_finite() && v.1.is_finite() && v.2.is_finite();
            if !finite(bounds.minimum) || !finite(bounds.maximum) {
                return Err(SceneError::NonFiniteBounds { index });
            }
        }
        Ok(())
    }

    pub fn object_bounds(&self) -> Vec<AABB> {
        self.objects.iter().map(Object::bounds).collect()
    }

    /// Union of every object's bounds, `None` for an empty scene
    pub fn bounds(&self) -> Option<AABB> {
        AABB::enclosing(self.objects.iter().map(Object::bounds))
    }

    /// Indices of emissive objects, in object order
    pub fn lights(&self) -> Vec<u32> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, object)| object.material.is_emissive())
            .map(|(index, _)| index as u32)
            .collect()
    }

    pub fn device_objects(&self) -> Vec<ClObject> {
        self.objects.iter().map(ClObject::from).collect()
    }

    pub fn build_tree(&self) -> KdTree {
        let object_bounds = self.object_bounds();
        let scene_bounds = self.bounds().unwrap_or_default();
        debug!("building kd-tree over scene bounds {scene_bounds:?}");
        KdTree::build(scene_bounds, &object_bounds)
    }
}
