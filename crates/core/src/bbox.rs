/// Axis-aligned bounding box with inclusive bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
    empty: bool,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
            empty: true,
        }
    }

    /// Box spanning `min..=max`, or `None` unless every bound is finite and
    /// `min` is component-wise `<=` `max`.
    pub fn from_bounds(min: [f32; 3], max: [f32; 3]) -> Option<Self> {
        let finite = min.iter().chain(max.iter()).all(|v| v.is_finite());
        if !finite || (0..3).any(|axis| min[axis] > max[axis]) {
            return None;
        }

        Some(Self {
            min,
            max,
            empty: false,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn center(&self) -> Option<[f32; 3]> {
        if self.empty {
            return None;
        }
        Some([
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
            0.5 * (self.min[2] + self.max[2]),
        ])
    }

    pub fn expand_with_point(&mut self, point: [f32; 3]) {
        if !point.iter().all(|v| v.is_finite()) {
            return;
        }

        if self.empty {
            self.min = point;
            self.max = point;
            self.empty = false;
            return;
        }

        for (axis, &val) in point.iter().enumerate() {
            self.min[axis] = self.min[axis].min(val);
            self.max[axis] = self.max[axis].max(val);
        }
    }

    pub fn contains(&self, point: &[f32; 3]) -> bool {
        if self.empty || !point.iter().all(|v| v.is_finite()) {
            return false;
        }

        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    pub fn from_xyz(x: &[f32], y: &[f32], z: &[f32]) -> Self {
        let n = x.len().min(y.len()).min(z.len());
        let mut aabb = Self::empty();
        for i in 0..n {
            aabb.expand_with_point([x[i], y[i], z[i]]);
        }
        aabb
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb;

    #[test]
    fn from_bounds_accepts_degenerate_box() {
        let aabb = Aabb::from_bounds([1.0; 3], [1.0; 3]).unwrap();
        assert!(aabb.contains(&[1.0, 1.0, 1.0]));
        assert!(!aabb.contains(&[1.0, 1.0, 1.1]));
    }

    #[test]
    fn from_bounds_rejects_inverted_axis() {
        assert!(Aabb::from_bounds([0.0, 1.0, 0.0], [1.0, 0.0, 1.0]).is_none());
    }

    #[test]
    fn from_bounds_rejects_non_finite() {
        assert!(Aabb::from_bounds([f32::NAN, 0.0, 0.0], [1.0; 3]).is_none());
        assert!(Aabb::from_bounds([0.0; 3], [f32::INFINITY, 1.0, 1.0]).is_none());
    }

    #[test]
    fn center_of_box() {
        let aabb = Aabb::from_bounds([-1.0, 0.0, 2.0], [1.0, 4.0, 4.0]).unwrap();
        assert_eq!(aabb.center(), Some([0.0, 2.0, 3.0]));
        assert_eq!(Aabb::empty().center(), None);
    }

    #[test]
    fn aabb_ignores_nan() {
        let aabb = Aabb::from_xyz(&[0.0, f32::NAN, 2.0], &[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert!(aabb.contains(&[0.0, 1.0, 4.0]));
        assert!(aabb.contains(&[2.0, 3.0, 6.0]));
        assert!(!aabb.contains(&[f32::NAN, 2.0, 5.0]));
    }
}
