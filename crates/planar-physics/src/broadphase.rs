//! Uniform-grid spatial hash broadphase.

use ahash::{AHashSet, RandomState};
use indexmap::IndexMap;
use planar_core::math::Aabb;
use smallvec::SmallVec;

use crate::collider::{layers_compatible, LayerMask};
use crate::error::{PhysicsError, PhysicsResult};

type Cell = (i64, i64);

/// A collider's footprint as seen by the broadphase
#[derive(Debug, Clone, Copy)]
pub struct Proxy {
    /// Stable key used to deduplicate pairs
    pub key: u64,
    pub aabb: Aabb,
    pub layer: LayerMask,
    pub mask: LayerMask,
}

/// Spatial hash over fixed-size square cells
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: f64,
    cells: IndexMap<Cell, SmallVec<[usize; 8]>, RandomState>,
    seen: AHashSet<(u64, u64)>,
}

impl SpatialHash {
    pub fn new(cell_size: f64) -> PhysicsResult<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(PhysicsError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            cells: IndexMap::default(),
            seen: AHashSet::default(),
        })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    fn cell_range(&self, aabb: &Aabb) -> (Cell, Cell) {
        let min = (
            (aabb.x / self.cell_size).floor() as i64,
            (aabb.y / self.cell_size).floor() as i64,
        );
        let max = (
            (aabb.right() / self.cell_size).floor() as i64,
            (aabb.bottom() / self.cell_size).floor() as i64,
        );
        (min, max)
    }

    /// Candidate pairs as `(i, j)` indices into `proxies` with `i < j`.
    ///
    /// Each unordered pair appears at most once. Pairs whose layers and masks
    /// do not accept each other, or whose boxes only touch, are dropped.
    pub fn query_pairs(&mut self, proxies: &[Proxy]) -> Vec<(usize, usize)> {
        self.cells.clear();
        self.seen.clear();

        for (index, proxy) in proxies.iter().enumerate() {
            let (min, max) = self.cell_range(&proxy.aabb);
            for cx in min.0..=max.0 {
                for cy in min.1..=max.1 {
                    self.cells.entry((cx, cy)).or_default().push(index);
                }
            }
        }

        let mut pairs = Vec::new();
        for bucket in self.cells.values() {
            for (n, &i) in bucket.iter().enumerate() {
                for &j in &bucket[n + 1..] {
                    let (a, b) = (&proxies[i], &proxies[j]);
                    if !layers_compatible(a.layer, a.mask, b.layer, b.mask) {
                        continue;
                    }
                    let key = if a.key < b.key {
                        (a.key, b.key)
                    } else {
                        (b.key, a.key)
                    };
                    if !self.seen.insert(key) {
                        continue;
                    }
                    if a.aabb.overlaps(&b.aabb) {
                        pairs.push((i.min(j), i.max(j)));
                    }
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(key: u64, x: f64, y: f64, size: f64) -> Proxy {
        Proxy {
            key,
            aabb: Aabb::new(x, y, size, size),
            layer: 1,
            mask: LayerMask::MAX,
        }
    }

    #[test]
    fn test_invalid_cell_size() {
        assert_eq!(
            SpatialHash::new(0.0).unwrap_err(),
            PhysicsError::InvalidCellSize(0.0)
        );
        assert!(SpatialHash::new(f64::NAN).is_err());
        assert!(SpatialHash::new(-4.0).is_err());
        assert_eq!(SpatialHash::new(32.0).unwrap().cell_size(), 32.0);
    }

    #[test]
    fn test_pairs_spanning_many_cells_reported_once() {
        let mut hash = SpatialHash::new(10.0).unwrap();
        // Both boxes cover a 4x4 block of shared cells
        let proxies = [proxy(1, 0.0, 0.0, 35.0), proxy(2, 5.0, 5.0, 35.0)];
        assert_eq!(hash.query_pairs(&proxies), vec![(0, 1)]);
    }

    #[test]
    fn test_distant_and_touching_boxes_excluded() {
        let mut hash = SpatialHash::new(10.0).unwrap();
        let proxies = [
            proxy(1, 0.0, 0.0, 10.0),
            proxy(2, 10.0, 0.0, 10.0),
            proxy(3, 500.0, 500.0, 10.0),
        ];
        assert!(hash.query_pairs(&proxies).is_empty());
    }

    #[test]
    fn test_mask_filtering_is_symmetric() {
        let mut hash = SpatialHash::new(16.0).unwrap();
        let mut a = proxy(1, 0.0, 0.0, 10.0);
        let mut b = proxy(2, 2.0, 2.0, 10.0);
        a.layer = 0b01;
        a.mask = 0b10;
        b.layer = 0b10;
        b.mask = 0b10;
        assert!(hash.query_pairs(&[a, b]).is_empty());
        assert!(hash.query_pairs(&[b, a]).is_empty());

        b.mask = 0b01;
        assert_eq!(hash.query_pairs(&[b, a]), vec![(0, 1)]);
    }

    #[test]
    fn test_negative_coordinates() {
        let mut hash = SpatialHash::new(8.0).unwrap();
        let proxies = [proxy(1, -12.0, -12.0, 6.0), proxy(2, -9.0, -9.0, 6.0)];
        assert_eq!(hash.query_pairs(&proxies), vec![(0, 1)]);
    }
}
