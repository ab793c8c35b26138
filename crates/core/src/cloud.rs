use crate::Aabb;

/// Structure-of-arrays point cloud with optional per-point normals and colours.
///
/// Every operation that changes the point set returns a new cloud; the
/// pipeline never mutates a point in place except to paint colours.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    pub normals: Option<Normals>,
    pub colors: Option<Colors>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normals {
    pub nx: Vec<f32>,
    pub ny: Vec<f32>,
    pub nz: Vec<f32>,
}

impl Normals {
    pub fn len(&self) -> usize {
        self.nx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nx.is_empty()
    }

    pub fn normal(&self, i: usize) -> [f32; 3] {
        [self.nx[i], self.ny[i], self.nz[i]]
    }

    pub fn from_vectors(vectors: &[[f32; 3]]) -> Self {
        Self {
            nx: vectors.iter().map(|n| n[0]).collect(),
            ny: vectors.iter().map(|n| n[1]).collect(),
            nz: vectors.iter().map(|n| n[2]).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Colors {
    pub r: Vec<u8>,
    pub g: Vec<u8>,
    pub b: Vec<u8>,
}

impl Colors {
    pub fn uniform(color: [u8; 3], n: usize) -> Self {
        Self {
            r: vec![color[0]; n],
            g: vec![color[1]; n],
            b: vec![color[2]; n],
        }
    }

    pub fn color(&self, i: usize) -> [u8; 3] {
        [self.r[i], self.g[i], self.b[i]]
    }
}

impl PointCloud {
    pub fn new() -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            normals: None,
            colors: None,
        }
    }

    pub fn from_xyz(x: Vec<f32>, y: Vec<f32>, z: Vec<f32>) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have same length");
        assert_eq!(x.len(), z.len(), "x and z must have same length");

        Self {
            x,
            y,
            z,
            normals: None,
            colors: None,
        }
    }

    pub fn from_points(points: &[[f32; 3]]) -> Self {
        Self::from_xyz(
            points.iter().map(|p| p[0]).collect(),
            points.iter().map(|p| p[1]).collect(),
            points.iter().map(|p| p[2]).collect(),
        )
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.x.len(), self.y.len());
        debug_assert_eq!(self.x.len(), self.z.len());
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_xyz(&self.x, &self.y, &self.z)
    }

    pub fn point(&self, i: usize) -> [f32; 3] {
        [self.x[i], self.y[i], self.z[i]]
    }

    pub fn iter_points(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((x, y), z)| [*x, *y, *z])
    }

    pub fn points(&self) -> Vec<[f32; 3]> {
        self.iter_points().collect()
    }

    /// Mean of all finite points, or `None` when there are none.
    ///
    /// Accumulates in `f64` so large clouds far from the origin keep their
    /// precision.
    pub fn centroid(&self) -> Option<[f32; 3]> {
        let mut sum = [0.0f64; 3];
        let mut n = 0usize;
        for p in self.iter_points() {
            if !p.iter().all(|v| v.is_finite()) {
                continue;
            }
            sum[0] += p[0] as f64;
            sum[1] += p[1] as f64;
            sum[2] += p[2] as f64;
            n += 1;
        }

        if n == 0 {
            return None;
        }

        let n = n as f64;
        Some([
            (sum[0] / n) as f32,
            (sum[1] / n) as f32,
            (sum[2] / n) as f32,
        ])
    }

    /// Overwrite every point's colour with `color`.
    pub fn paint_uniform(&mut self, color: [u8; 3]) {
        self.colors = Some(Colors::uniform(color, self.len()));
    }

    pub fn select(&self, indices: &[usize]) -> Self {
        let mut x = Vec::with_capacity(indices.len());
        let mut y = Vec::with_capacity(indices.len());
        let mut z = Vec::with_capacity(indices.len());

        for &idx in indices {
            assert!(idx < self.len(), "index out of bounds in select");
            x.push(self.x[idx]);
            y.push(self.y[idx]);
            z.push(self.z[idx]);
        }

        let normals = self.normals.as_ref().map(|n| Normals {
            nx: indices.iter().map(|&idx| n.nx[idx]).collect(),
            ny: indices.iter().map(|&idx| n.ny[idx]).collect(),
            nz: indices.iter().map(|&idx| n.nz[idx]).collect(),
        });

        let colors = self.colors.as_ref().map(|c| Colors {
            r: indices.iter().map(|&idx| c.r[idx]).collect(),
            g: indices.iter().map(|&idx| c.g[idx]).collect(),
            b: indices.iter().map(|&idx| c.b[idx]).collect(),
        });

        Self {
            x,
            y,
            z,
            normals,
            colors,
        }
    }

    /// Select all points NOT in the given index set.
    ///
    /// The returned cloud preserves the relative order of the retained points.
    ///
    /// # Panics
    ///
    /// Panics if any index in `indices` is out of bounds.
    pub fn select_inverse(&self, indices: &[usize]) -> Self {
        let n = self.len();
        let mut exclude = vec![false; n];
        for &idx in indices {
            assert!(idx < n, "index out of bounds in select_inverse");
            exclude[idx] = true;
        }

        let kept: Vec<usize> = (0..n).filter(|&i| !exclude[i]).collect();
        self.select(&kept)
    }

    /// Concatenate `other` onto this cloud.
    ///
    /// Normals and colours survive only when both clouds carry them.
    pub fn merge(&mut self, other: &PointCloud) {
        let was_empty = self.is_empty();

        self.normals = match (self.normals.take(), other.normals.as_ref()) {
            (Some(mut a), Some(b)) => {
                a.nx.extend_from_slice(&b.nx);
                a.ny.extend_from_slice(&b.ny);
                a.nz.extend_from_slice(&b.nz);
                Some(a)
            }
            (None, Some(b)) if was_empty => Some(b.clone()),
            (Some(a), None) if other.is_empty() => Some(a),
            _ => None,
        };

        self.colors = match (self.colors.take(), other.colors.as_ref()) {
            (Some(mut a), Some(b)) => {
                a.r.extend_from_slice(&b.r);
                a.g.extend_from_slice(&b.g);
                a.b.extend_from_slice(&b.b);
                Some(a)
            }
            (None, Some(b)) if was_empty => Some(b.clone()),
            (Some(a), None) if other.is_empty() => Some(a),
            _ => None,
        };

        self.x.extend_from_slice(&other.x);
        self.y.extend_from_slice(&other.y);
        self.z.extend_from_slice(&other.z);
    }
}

impl Default for PointCloud {
    fn default() -> Self {
        Self::new()
    }
}
