use super::vec3::Vec3;
use crate::macros::{variadic_max_comparator, variadic_min_comparator};

/// Axis-aligned bounding box
/// Defined by 2 points
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct AABB {
    pub minimum: Vec3,
    pub maximum: Vec3
}

impl AABB {
    pub fn new(minimum: Vec3, maximum: Vec3) -> AABB {
        AABB { minimum, maximum }
    }

    /// Smallest box containing both corners, in whatever order they are given
    pub fn from_corners(a: Vec3, b: Vec3) -> AABB {
        AABB {
            minimum: variadic_min_comparator!(Vec3::elementwise_min, a, b),
            maximum: variadic_max_comparator!(Vec3::elementwise_max, a, b)
        }
    }

    /// Returns a box which surrounds both a and b
    pub fn surrounding_box(a: AABB, b: AABB) -> AABB {
        AABB {
            minimum: Vec3::elementwise_min(a.minimum, b.minimum),
            maximum: Vec3::elementwise_max(a.maximum, b.maximum)
        }
    }

    /// Box surrounding every box in `boxes`, `None` if there are none
    pub fn enclosing<I: IntoIterator<Item = AABB>>(boxes: I) -> Option<AABB> {
        boxes.into_iter().reduce(AABB::surrounding_box)
    }

    pub fn is_valid(&self) -> bool {
        self.minimum.0 <= self.maximum.0
            && self.minimum.1 <= self.maximum.1
            && self.minimum.2 <= self.maximum.2
    }

    pub fn contains(&self, other: &AABB) -> bool {
        (0..3).all(|axis| self.minimum[axis] <= other.minimum[axis] && other.maximum[axis] <= self.maximum[axis])
    }

    /// Cut the box with the plane `axis = position`, returning the (below, above) halves
    pub fn split(&self, axis: usize, position: f32) -> (AABB, AABB) {
        let below = AABB::new(self.minimum, self.maximum.with_axis(axis, position));
        let above = AABB::new(self.minimum.with_axis(axis, position), self.maximum);
        (below, above)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_orders_components() {
        let aabb = AABB::from_corners(Vec3(1.0, -2.0, 3.0), Vec3(-1.0, 2.0, -3.0));
        assert_eq!(aabb.minimum, Vec3(-1.0, -2.0, -3.0));
        assert_eq!(aabb.maximum, Vec3(1.0, 2.0, 3.0));
        assert!(aabb.is_valid());
    }

    #[test]
    fn split_halves_surround_back_to_original() {
        let aabb = AABB::new(Vec3(-1.0, 0.0, 0.0), Vec3(4.0, 1.0, 2.0));
        let (below, above) = aabb.split(0, 0.5);
        assert_eq!(below.maximum.0, 0.5);
        assert_eq!(above.minimum.0, 0.5);
        assert_eq!(AABB::surrounding_box(below, above), aabb);
    }

    #[test]
    fn enclosing_nothing_is_none() {
        assert_eq!(AABB::enclosing(Vec::new()), None);
        let one = AABB::new(Vec3::zero(), Vec3::splat(1.0));
        assert_eq!(AABB::enclosing([one]), Some(one));
    }
}
