use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use foundation::math::precision::stable_total_cmp_f64;

/// A static, deterministic 2D k-d tree over `(id, point)` pairs.
///
/// Built once in O(n log n) by recursive median selection; never mutated
/// afterwards. For a fixed input, every query visits nodes in the same order
/// and so returns ids in the same order.
#[derive(Debug, Clone)]
pub struct KdTree {
    entries: Vec<Entry>,
    leaf_size: usize,
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Entry {
    id: u32,
    point: Vec2,
}

impl KdTree {
    pub fn build(points: impl IntoIterator<Item = (u32, Vec2)>, leaf_size: usize) -> Self {
        let mut tree = Self {
            entries: points
                .into_iter()
                .map(|(id, point)| Entry { id, point })
                .collect(),
            leaf_size: leaf_size.max(1),
        };
        let len = tree.entries.len();
        tree.sort_range(0, len, 0);
        tree
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sort_range(&mut self, left: usize, right: usize, axis: usize) {
        if right - left <= self.leaf_size {
            return;
        }
        let mid = left + (right - left) / 2;
        self.entries[left..right].select_nth_unstable_by(mid - left, |a, b| {
            stable_total_cmp_f64(coord(a.point, axis), coord(b.point, axis))
                .then_with(|| a.id.cmp(&b.id))
        });
        self.sort_range(left, mid, 1 - axis);
        self.sort_range(mid + 1, right, 1 - axis);
    }

    /// Ids of all points inside `query` (edges inclusive).
    pub fn range(&self, query: &Aabb2) -> Vec<u32> {
        let mut hits = Vec::new();
        let mut stack: Vec<(usize, usize, usize)> = vec![(0, self.entries.len(), 0)];

        while let Some((left, right, axis)) = stack.pop() {
            if right - left <= self.leaf_size {
                for e in &self.entries[left..right] {
                    if query.contains([e.point.x, e.point.y]) {
                        hits.push(e.id);
                    }
                }
                continue;
            }

            let mid = left + (right - left) / 2;
            let e = self.entries[mid];
            if query.contains([e.point.x, e.point.y]) {
                hits.push(e.id);
            }

            let c = coord(e.point, axis);
            // Right pushed first so the left half is visited first.
            if query.max[axis] >= c {
                stack.push((mid + 1, right, 1 - axis));
            }
            if query.min[axis] <= c {
                stack.push((left, mid, 1 - axis));
            }
        }

        hits
    }

    /// Ids of all points within `radius` of `center` (boundary inclusive).
    pub fn within(&self, center: Vec2, radius: f64) -> Vec<u32> {
        let mut hits = Vec::new();
        let r2 = radius * radius;
        let mut stack: Vec<(usize, usize, usize)> = vec![(0, self.entries.len(), 0)];

        while let Some((left, right, axis)) = stack.pop() {
            if right - left <= self.leaf_size {
                for e in &self.entries[left..right] {
                    if e.point.distance_squared(center) <= r2 {
                        hits.push(e.id);
                    }
                }
                continue;
            }

            let mid = left + (right - left) / 2;
            let e = self.entries[mid];
            if e.point.distance_squared(center) <= r2 {
                hits.push(e.id);
            }

            let c = coord(e.point, axis);
            let q = coord(center, axis);
            if q + radius >= c {
                stack.push((mid + 1, right, 1 - axis));
            }
            if q - radius <= c {
                stack.push((left, mid, 1 - axis));
            }
        }

        hits
    }
}

fn coord(p: Vec2, axis: usize) -> f64 {
    if axis == 0 { p.x } else { p.y }
}
