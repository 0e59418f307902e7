//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! The tree is stored flat: nodes live in one vector and refer to their
//! children by index, leaves refer to a contiguous range of the primitive
//! array, which the builder reorders in place.

use lux_math::{Aabb, Interval, Ray, Vec3};

use crate::error::BvhError;
use crate::raycaster::RayHit;

/// Maximum primitives per leaf node before splitting.
pub const LEAF_MAX_SIZE: usize = 4;

/// Nodes deeper than this become leaves regardless of their size.
pub const MAX_DEPTH: usize = 48;

/// Traversal stack size. A stack entry is pushed per child, so it needs
/// at least `MAX_DEPTH + 1` slots.
const STACK_CAPACITY: usize = 64;

/// A triangle of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveRef {
    pub object: u32,
    pub triangle: u32,
}

/// A primitive with its precomputed world-space bounds.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveInfo {
    pub prim: PrimitiveRef,
    pub bounds: Aabb,
    pub centroid: Vec3,
}

impl PrimitiveInfo {
    pub fn new(prim: PrimitiveRef, bounds: Aabb) -> Self {
        Self {
            prim,
            bounds,
            centroid: bounds.centroid(),
        }
    }
}

/// BVH node - either a branch with two children or a leaf with primitives.
#[derive(Debug, Clone, Copy)]
pub enum BvhNode {
    /// Internal node; children are indices into the node array.
    Branch { bounds: Aabb, left: u32, right: u32 },
    /// Leaf node covering `primitives[start..start + count]`.
    Leaf { bounds: Aabb, start: u32, count: u32 },
}

impl BvhNode {
    pub fn bounds(&self) -> Aabb {
        match self {
            BvhNode::Branch { bounds, .. } | BvhNode::Leaf { bounds, .. } => *bounds,
        }
    }
}

/// Static BVH over scene triangles. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    primitives: Vec<PrimitiveInfo>,
    depth: usize,
}

impl Bvh {
    /// Build a BVH over the given primitives. The root is node 0.
    ///
    /// Simple mean split: partition by centroid against the midpoint of the
    /// centroid bounds on their longest axis, falling back to an even split
    /// when that leaves one side empty.
    pub fn build(mut primitives: Vec<PrimitiveInfo>) -> Self {
        if primitives.is_empty() {
            return Self::default();
        }

        let mut nodes = Vec::with_capacity(2 * primitives.len() / LEAF_MAX_SIZE + 1);
        let mut depth = 0;
        let len = primitives.len();
        build_range(&mut nodes, &mut primitives, 0, len, 1, &mut depth);

        let bvh = Self {
            nodes,
            primitives,
            depth,
        };
        debug_assert!(bvh.validate().is_ok(), "{:?}", bvh.validate());

        log::debug!(
            "BVH: {} primitives, {} nodes, {} leaves, depth {}",
            bvh.primitives.len(),
            bvh.nodes.len(),
            bvh.leaf_count(),
            bvh.depth
        );

        bvh
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of levels; 0 for an empty tree, 1 for a single leaf.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, BvhNode::Leaf { .. }))
            .count()
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Primitives in leaf order.
    pub fn primitives(&self) -> &[PrimitiveInfo] {
        &self.primitives
    }

    /// Bounds of the whole tree, empty when there is nothing in it.
    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, BvhNode::bounds)
    }

    /// Check the containment invariant on every node.
    pub fn validate(&self) -> Result<(), BvhError> {
        for (index, node) in self.nodes.iter().enumerate() {
            match *node {
                BvhNode::Branch {
                    bounds,
                    left,
                    right,
                } => {
                    for child in [left as usize, right as usize] {
                        let inside = self
                            .nodes
                            .get(child)
                            .is_some_and(|c| bounds.contains(&c.bounds()));
                        if !inside {
                            return Err(BvhError::ChildOutside { node: index, child });
                        }
                    }
                }
                BvhNode::Leaf {
                    bounds,
                    start,
                    count,
                } => {
                    let (start, end) = (start as usize, (start + count) as usize);
                    let range =
                        self.primitives
                            .get(start..end)
                            .ok_or(BvhError::RangeOutOfBounds {
                                node: index,
                                start,
                                end,
                                len: self.primitives.len(),
                            })?;
                    if let Some(info) = range.iter().find(|info| !bounds.contains(&info.bounds)) {
                        return Err(BvhError::PrimitiveOutside {
                            node: index,
                            primitive: info.prim,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Nearest hit along `ray`.
    ///
    /// `test` intersects one primitive within the given distance range. The
    /// range shrinks to the closest hit found so far, and only strictly
    /// closer hits replace it, so ties go to the first primitive visited.
    pub fn intersect<F>(&self, ray: &Ray, mut test: F) -> Option<RayHit>
    where
        F: FnMut(PrimitiveRef, Interval) -> Option<RayHit>,
    {
        let mut closest = ray.t.max;
        let mut best = None;

        self.traverse(ray, |range, prims| {
            for info in prims {
                let range = Interval::new(range.min, closest);
                if let Some(hit) = test(info.prim, range) {
                    if hit.t < closest {
                        closest = hit.t;
                        best = Some(hit);
                    }
                }
            }
            (closest, false)
        });

        best
    }

    /// True if `test` accepts any primitive along `ray`. Stops at the first one.
    pub fn any_hit<F>(&self, ray: &Ray, mut test: F) -> bool
    where
        F: FnMut(PrimitiveRef, Interval) -> bool,
    {
        let mut found = false;
        self.traverse(ray, |range, prims| {
            found = prims.iter().any(|info| test(info.prim, range));
            (range.max, found)
        });
        found
    }

    /// Explicit-stack traversal, nearer child first.
    ///
    /// `visit` gets the current `[t_min, closest]` range and a leaf's
    /// primitives, and returns the new closest distance and whether to stop.
    fn traverse<F>(&self, ray: &Ray, mut visit: F)
    where
        F: FnMut(Interval, &[PrimitiveInfo]) -> (f32, bool),
    {
        let Some(root) = self.nodes.first() else {
            return;
        };
        let Some(root_t) = root.bounds().intersect(ray, ray.t) else {
            return;
        };

        let mut closest = ray.t.max;
        let mut stack = [(0u32, 0.0f32); STACK_CAPACITY];
        stack[0] = (0, root_t.min);
        let mut top = 1;

        while top > 0 {
            top -= 1;
            let (index, t_enter) = stack[top];
            if t_enter > closest {
                continue;
            }

            let range = Interval::new(ray.t.min, closest);
            match self.nodes[index as usize] {
                BvhNode::Leaf { start, count, .. } => {
                    let prims = &self.primitives[start as usize..(start + count) as usize];
                    let (new_closest, stop) = visit(range, prims);
                    if stop {
                        return;
                    }
                    closest = new_closest;
                }
                BvhNode::Branch { left, right, .. } => {
                    let entry = |child: u32| {
                        self.nodes[child as usize]
                            .bounds()
                            .intersect(ray, range)
                            .map(|t| t.min)
                    };
                    let mut children = [(left, entry(left)), (right, entry(right))];
                    // Push the farther child first so the nearer one is popped next
                    if let (Some(l), Some(r)) = (children[0].1, children[1].1) {
                        if l < r {
                            children.swap(0, 1);
                        }
                    }
                    for (child, t) in children {
                        if let Some(t) = t {
                            debug_assert!(top < STACK_CAPACITY);
                            stack[top] = (child, t);
                            top += 1;
                        }
                    }
                }
            }
        }
    }
}

fn longest_axis(extent: Vec3) -> usize {
    if extent.x > extent.y && extent.x > extent.z {
        0
    } else if extent.y > extent.z {
        1
    } else {
        2
    }
}

/// Move every element matching `pred` to the front; returns how many matched.
fn partition_in_place<T>(items: &mut [T], pred: impl Fn(&T) -> bool) -> usize {
    let mut split = 0;
    for i in 0..items.len() {
        if pred(&items[i]) {
            items.swap(split, i);
            split += 1;
        }
    }
    split
}

/// Recursive construction over `prims[start..end]`. Returns the node index.
fn build_range(
    nodes: &mut Vec<BvhNode>,
    prims: &mut [PrimitiveInfo],
    start: usize,
    end: usize,
    depth: usize,
    max_depth: &mut usize,
) -> u32 {
    *max_depth = (*max_depth).max(depth);

    let range = &mut prims[start..end];
    let bounds = range
        .iter()
        .fold(Aabb::EMPTY, |acc, info| Aabb::surrounding(&acc, &info.bounds));

    let index = nodes.len() as u32;
    if range.len() <= LEAF_MAX_SIZE || depth >= MAX_DEPTH {
        nodes.push(BvhNode::Leaf {
            bounds,
            start: start as u32,
            count: range.len() as u32,
        });
        return index;
    }

    let (cmin, cmax) = range.iter().fold(
        (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
        |(lo, hi), info| (lo.min(info.centroid), hi.max(info.centroid)),
    );
    let axis = longest_axis(cmax - cmin);
    let midpoint = 0.5 * (cmin[axis] + cmax[axis]);

    let mut split = partition_in_place(range, |info| info.centroid[axis] < midpoint);
    if split == 0 || split == range.len() {
        // All centroids coincide on this axis
        split = range.len() / 2;
        range.select_nth_unstable_by(split, |a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));
    }

    // Reserve the slot; children are patched in after recursion
    nodes.push(BvhNode::Leaf {
        bounds,
        start: start as u32,
        count: 0,
    });
    let left = build_range(nodes, prims, start, start + split, depth + 1, max_depth);
    let right = build_range(nodes, prims, start + split, end, depth + 1, max_depth);
    nodes[index as usize] = BvhNode::Branch {
        bounds,
        left,
        right,
    };

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn info(i: u32, center: Vec3, half: f32) -> PrimitiveInfo {
        PrimitiveInfo::new(
            PrimitiveRef {
                object: 0,
                triangle: i,
            },
            Aabb::from_points(center - Vec3::splat(half), center + Vec3::splat(half)),
        )
    }

    fn leaf_ranges(bvh: &Bvh) -> Vec<(u32, u32)> {
        let mut ranges: Vec<_> = bvh
            .nodes()
            .iter()
            .filter_map(|node| match *node {
                BvhNode::Leaf { start, count, .. } => Some((start, count)),
                _ => None,
            })
            .collect();
        ranges.sort_unstable();
        ranges
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = Bvh::build(vec![]);
        assert!(bvh.is_empty());
        assert_eq!(bvh.depth(), 0);
        assert_eq!(bvh.node_count(), 0);
        assert!(bvh.bounds().is_empty());
        assert!(bvh.validate().is_ok());

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(bvh.intersect(&ray, |_, _| unreachable!()).is_none());
        assert!(!bvh.any_hit(&ray, |_, _| unreachable!()));
    }

    #[test]
    fn test_bvh_single_leaf() {
        let prims = (0..3).map(|i| info(i, Vec3::new(i as f32, 0.0, 0.0), 0.5)).collect();
        let bvh = Bvh::build(prims);

        assert_eq!(bvh.node_count(), 1);
        assert_eq!(bvh.leaf_count(), 1);
        assert_eq!(bvh.depth(), 1);
        assert!(matches!(bvh.nodes()[0], BvhNode::Leaf { start: 0, count: 3, .. }));
    }

    #[test]
    fn test_bvh_leaves_partition_primitives() {
        let mut rng = StdRng::seed_from_u64(7);
        let prims: Vec<_> = (0..200)
            .map(|i| {
                let center = Vec3::new(rng.gen(), rng.gen(), rng.gen()) * 10.0;
                info(i, center, rng.gen_range(0.01..0.5))
            })
            .collect();
        let bvh = Bvh::build(prims);

        assert!(bvh.validate().is_ok());
        assert_eq!(bvh.primitives().len(), 200);

        // Leaves tile the primitive array exactly once
        let mut next = 0;
        for (start, count) in leaf_ranges(&bvh) {
            assert_eq!(start, next);
            assert!(count >= 1 && count as usize <= LEAF_MAX_SIZE);
            next = start + count;
        }
        assert_eq!(next, 200);

        let mut seen: Vec<u32> = bvh.primitives().iter().map(|p| p.prim.triangle).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_bvh_coincident_centroids_terminate() {
        // Every centroid identical: the mean split always degenerates
        let prims = (0..100).map(|i| info(i, Vec3::ONE, 0.1 + i as f32 * 0.01)).collect();
        let bvh = Bvh::build(prims);

        assert!(bvh.validate().is_ok());
        assert!(bvh.depth() <= MAX_DEPTH);
        assert_eq!(bvh.primitives().len(), 100);
        for (_, count) in leaf_ranges(&bvh) {
            assert!(count >= 1);
        }
    }

    #[test]
    fn test_longest_axis_prefers_later_axis_on_ties() {
        assert_eq!(longest_axis(Vec3::new(10.0, 1.0, 1.0)), 0);
        assert_eq!(longest_axis(Vec3::new(1.0, 10.0, 1.0)), 1);
        assert_eq!(longest_axis(Vec3::new(1.0, 1.0, 10.0)), 2);
        assert_eq!(longest_axis(Vec3::new(3.0, 3.0, 1.0)), 1);
        assert_eq!(longest_axis(Vec3::ZERO), 2);
    }

    #[test]
    fn test_bvh_validate_detects_violation() {
        let prims = (0..16).map(|i| info(i, Vec3::new(i as f32, 0.0, 0.0), 0.25)).collect();
        let mut bvh = Bvh::build(prims);
        bvh.primitives[3].bounds = Aabb::from_points(Vec3::splat(100.0), Vec3::splat(101.0));
        assert!(matches!(
            bvh.validate(),
            Err(BvhError::PrimitiveOutside { .. })
        ));
    }

    #[test]
    fn test_traversal_visits_nearer_first() {
        // Boxes along -Z; any-hit with an always-true test stops at the first leaf
        let prims: Vec<_> = (0..32)
            .map(|i| info(i, Vec3::new(0.0, 0.0, -(i as f32) * 2.0 - 2.0), 0.5))
            .collect();
        let bvh = Bvh::build(prims);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        let mut first = None;
        bvh.any_hit(&ray, |prim, _| {
            first.get_or_insert(prim.triangle);
            true
        });
        assert!(first.unwrap() < LEAF_MAX_SIZE as u32);
    }

    fn arb_info() -> impl Strategy<Value = (f32, f32, f32, f32)> {
        (-50.0f32..50.0, -50.0f32..50.0, -50.0f32..50.0, 0.0f32..5.0)
    }

    proptest! {
        #[test]
        fn prop_containment_holds(boxes in prop::collection::vec(arb_info(), 1..300)) {
            let prims: Vec<_> = boxes
                .iter()
                .enumerate()
                .map(|(i, &(x, y, z, h))| info(i as u32, Vec3::new(x, y, z), h))
                .collect();
            let bvh = Bvh::build(prims);

            prop_assert!(bvh.validate().is_ok());
            prop_assert!(bvh.depth() <= MAX_DEPTH);
            for info in bvh.primitives() {
                prop_assert!(bvh.bounds().contains(&info.bounds));
            }
        }

        #[test]
        fn prop_containment_is_order_independent(
            boxes in prop::collection::vec(arb_info(), 1..100),
            seed in any::<u64>(),
        ) {
            let mut prims: Vec<_> = boxes
                .iter()
                .enumerate()
                .map(|(i, &(x, y, z, h))| info(i as u32, Vec3::new(x, y, z), h))
                .collect();
            let forward = Bvh::build(prims.clone());

            let mut rng = StdRng::seed_from_u64(seed);
            for i in (1..prims.len()).rev() {
                prims.swap(i, rng.gen_range(0..=i));
            }
            let shuffled = Bvh::build(prims);

            prop_assert!(forward.validate().is_ok());
            prop_assert!(shuffled.validate().is_ok());
            prop_assert_eq!(forward.bounds(), shuffled.bounds());
        }
    }
}
