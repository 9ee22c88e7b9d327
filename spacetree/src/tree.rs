//! Adaptive space trees
//!
//! A [`SpaceTreeNode`] refines a cell around the boundary of a target oracle.
//! Each node moves through a small state machine:
//!
//! - **Unevaluated**: freshly built, or reset by [`clear`].
//! - **Evaluated, non-boundary**: every sample lies on the same side of the
//!   shape; the node is never split.
//! - **Evaluated, boundary**: samples disagree, so [`divide`] splits the cell
//!   and recurses into the children.
//!
//! [`clear`]: SpaceTreeNode::clear
//! [`divide`]: SpaceTreeNode::divide
use crate::{
    Error,
    cell::Cell,
    map::{TargetMap, point_key},
    oracle::{Oracle, Value},
    pool::{Spawner, ThreadCount, ThreadPool},
    sampler::{CartesianGridSampler, Sampler},
    split::{MidPoint, SplitPolicy},
    types::Point,
};
use log::{debug, trace};
use std::sync::{Arc, RwLock};

/// Settings when building a tree with [`SpaceTreeNode::build`]
#[derive(Copy, Clone, Debug)]
pub struct Settings {
    /// Nodes at this level (the root is level 0) are never divided
    pub max_level: usize,

    /// Threads used for subdivision
    ///
    /// With [`ThreadCount::Many`], a pool is built for the duration of the
    /// call and oracle results are always memoized.
    pub threads: ThreadCount,

    /// Memoize oracle results when subdividing in a single thread
    pub memoize: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_level: 6,
            threads: ThreadCount::default(),
            memoize: true,
        }
    }
}

/// Boundary classification of a node
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Boundary {
    Unevaluated,
    No,
    Yes,
}

impl Boundary {
    /// Classifies a set of sample values
    ///
    /// Every value is compared against the sign of the first one.  Zero is not
    /// positive, so it matches a non-positive first sample but mismatches a
    /// positive one.
    fn classify<V: Value>(values: &[V]) -> Self {
        let Some(first) = values.first() else {
            return Boundary::No;
        };
        let first = first.is_above_zero();
        let mut boundary = false;
        for v in &values[1..] {
            boundary |= v.is_above_zero() != first;
        }
        if boundary { Boundary::Yes } else { Boundary::No }
    }
}

/// Mutable state of a node
struct NodeData<T, V> {
    values: Vec<V>,
    boundary: Boundary,
    children: Vec<Arc<T>>,
}

/// A node in an adaptive space tree
///
/// The node owns a cell of type `C`, sampled by a shared `S` and split
/// according to a shared `P`.  Oracle values are of type `V`.
///
/// Every method takes `&self`; the mutable state lives behind a lock, so that
/// subtrees can be divided by concurrent jobs.  Children are only written by
/// the job that divides their parent.
pub struct SpaceTreeNode<
    const D: usize,
    C,
    V,
    S = CartesianGridSampler,
    P = MidPoint,
> {
    cell: C,
    level: usize,
    sampler: Arc<S>,
    policy: Arc<P>,
    data: RwLock<NodeData<Self, V>>,
}

impl<const D: usize, C, V, S, P> SpaceTreeNode<D, C, V, S, P>
where
    C: Cell<D>,
    V: Value,
    S: Sampler + 'static,
    P: SplitPolicy + 'static,
{
    /// Builds a new, unevaluated root node (at level 0)
    pub fn new(cell: C, sampler: Arc<S>, policy: Arc<P>) -> Self {
        Self::with_level(cell, sampler, policy, 0)
    }

    fn with_level(
        cell: C,
        sampler: Arc<S>,
        policy: Arc<P>,
        level: usize,
    ) -> Self {
        Self {
            cell,
            level,
            sampler,
            policy,
            data: RwLock::new(NodeData {
                values: vec![],
                boundary: Boundary::Unevaluated,
                children: vec![],
            }),
        }
    }

    /// Returns this node's cell
    pub fn cell(&self) -> &C {
        &self.cell
    }

    /// Returns this node's depth in the tree (the root is level 0)
    pub fn level(&self) -> usize {
        self.level
    }

    /// Returns the sampler shared by this tree
    pub fn sampler(&self) -> &Arc<S> {
        &self.sampler
    }

    /// Returns the split policy shared by this tree
    pub fn policy(&self) -> &Arc<P> {
        &self.policy
    }

    /// Returns a copy of the sample values
    ///
    /// This is empty if the node has not been evaluated.
    pub fn values(&self) -> Vec<V> {
        self.data.read().unwrap().values.clone()
    }

    /// Returns this node's children
    pub fn children(&self) -> Vec<Arc<Self>> {
        self.data.read().unwrap().children.clone()
    }

    /// Checks whether this node has been evaluated
    pub fn is_evaluated(&self) -> bool {
        self.data.read().unwrap().boundary != Boundary::Unevaluated
    }

    /// Checks whether the shape's boundary passes through this node
    ///
    /// Returns [`Error::Unevaluated`] if the node has not been evaluated.
    pub fn is_boundary(&self) -> Result<bool, Error> {
        match self.data.read().unwrap().boundary {
            Boundary::Unevaluated => Err(Error::Unevaluated),
            Boundary::No => Ok(false),
            Boundary::Yes => Ok(true),
        }
    }

    /// Samples the oracle within this node's cell
    ///
    /// Returns `true` if the node lies on the shape's boundary.  Children are
    /// left untouched.
    pub fn evaluate<O>(&self, target: &O) -> bool
    where
        O: Oracle<D, Output = V>,
    {
        self.evaluate_with(|p| target.eval(p)).0
    }

    /// Samples the oracle, reusing (and filling) a map of known values
    ///
    /// The oracle is only called for positions missing from `map`.  Returns
    /// `true` if the node lies on the shape's boundary.
    pub fn evaluate_map<O>(&self, target: &O, map: &TargetMap<D, V>) -> bool
    where
        O: Oracle<D, Output = V>,
    {
        self.evaluate_with(memoized(target, map)).0
    }

    /// Fills in sample values and the boundary flag
    ///
    /// Returns the boundary flag and the sample positions.
    fn evaluate_with<F>(&self, mut f: F) -> (bool, Vec<Point<D>>)
    where
        F: FnMut(&Point<D>) -> V,
    {
        let points = self.sampler.samples(&self.cell);
        let values: Vec<V> = points.iter().map(&mut f).collect();
        let boundary = Boundary::classify(&values);

        let mut data = self.data.write().unwrap();
        data.values = values;
        data.boundary = boundary;
        (boundary == Boundary::Yes, points)
    }

    /// Drops any children left over from an earlier division
    fn prune(&self) {
        self.data.write().unwrap().children.clear();
    }

    /// Splits an evaluated boundary node, replacing its children
    ///
    /// Degenerate children are discarded.  Returns the new children.
    fn refine(&self, points: &[Point<D>]) -> Vec<Arc<Self>> {
        let mut data = self.data.write().unwrap();
        let split = self.policy.split_point(&data.values, points);
        let children: Vec<_> = self
            .cell
            .split_at(&split)
            .into_iter()
            .filter(|c| !c.is_degenerate())
            .map(|c| {
                Arc::new(Self::with_level(
                    c,
                    self.sampler.clone(),
                    self.policy.clone(),
                    self.level + 1,
                ))
            })
            .collect();
        trace!(
            "refined node at level {} into {} children",
            self.level,
            children.len()
        );
        data.children.clone_from(&children);
        children
    }

    /// Recursively subdivides the node around the oracle's boundary
    ///
    /// Nodes at `max_level` or deeper are left alone.  Otherwise, the node is
    /// evaluated; if it is a boundary node, it is split and each
    /// (non-degenerate) child is divided in turn.  Returns `true` if this node
    /// was split.
    ///
    /// Dividing a node which already has children replaces them; if the node
    /// is not split, its old children are dropped.
    pub fn divide<O>(&self, target: &O, max_level: usize) -> bool
    where
        O: Oracle<D, Output = V>,
    {
        self.divide_with(&mut |p: &Point<D>| target.eval(p), max_level)
    }

    /// Equivalent to [`divide`](Self::divide), but memoizes oracle values
    ///
    /// Sample positions shared between neighbouring cells are only evaluated
    /// once.
    pub fn divide_memoized<O>(
        &self,
        target: &O,
        max_level: usize,
        map: &TargetMap<D, V>,
    ) -> bool
    where
        O: Oracle<D, Output = V>,
    {
        self.divide_with(&mut memoized(target, map), max_level)
    }

    fn divide_with<F>(&self, f: &mut F, max_level: usize) -> bool
    where
        F: FnMut(&Point<D>) -> V,
    {
        if self.level >= max_level {
            self.prune();
            return false;
        }
        let (boundary, points) = self.evaluate_with(&mut *f);
        if !boundary {
            self.prune();
            return false;
        }
        for child in self.refine(&points) {
            child.divide_with(f, max_level);
        }
        true
    }

    /// Clears sample values and boundary flags across the whole subtree
    ///
    /// The tree's shape is unchanged.
    pub fn clear(&self) {
        let children = {
            let mut data = self.data.write().unwrap();
            data.values.clear();
            data.boundary = Boundary::Unevaluated;
            data.children.clone()
        };
        for c in children {
            c.clear();
        }
    }

    /// Calls `f` on every node in the subtree, parents before children
    pub fn visit<F: FnMut(&Self)>(&self, mut f: F) {
        self.visit_inner(&mut f)
    }

    fn visit_inner<F: FnMut(&Self)>(&self, f: &mut F) {
        f(self);
        for c in self.children() {
            c.visit_inner(f);
        }
    }

    /// Returns the number of nodes in the subtree, including this one
    pub fn node_count(&self) -> usize {
        let mut n = 0;
        self.visit(|_| n += 1);
        n
    }

    /// Returns the number of levels below this node (0 for a leaf)
    pub fn depth(&self) -> usize {
        self.children()
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Returns every leaf in the subtree
    pub fn leaves(self: &Arc<Self>) -> Vec<Arc<Self>> {
        let children = self.children();
        if children.is_empty() {
            vec![self.clone()]
        } else {
            children.iter().flat_map(|c| c.leaves()).collect()
        }
    }

    /// Returns the cells of leaves which may contain the shape's boundary
    ///
    /// This includes evaluated boundary leaves plus unevaluated leaves, which
    /// are created by splitting a boundary node at the depth limit.  The
    /// result is suitable for unstructured surface extraction.
    pub fn boundary_leaves(&self) -> Vec<C> {
        let mut out = vec![];
        self.visit(|n| {
            let data = n.data.read().unwrap();
            if data.children.is_empty() && data.boundary != Boundary::No {
                out.push(n.cell);
            }
        });
        out
    }

    /// Subdivides the tree across a thread pool
    ///
    /// The root is evaluated in the calling thread; every child division is
    /// then queued as a separate job, which queues its own children once it
    /// has evaluated itself as a boundary node.  Oracle values are memoized in
    /// `map`, which is shared by all jobs.  This call blocks on
    /// [`ThreadPool::barrier`] until the whole tree has been divided.
    ///
    /// Returns `true` if the root was split, or [`Error::JobPanicked`] if the
    /// oracle panicked while dividing a descendant; in that case, the tree is
    /// incomplete.
    pub fn divide_parallel<O>(
        self: &Arc<Self>,
        target: &Arc<O>,
        max_level: usize,
        map: &Arc<TargetMap<D, V>>,
        pool: &ThreadPool,
    ) -> Result<bool, Error>
    where
        O: Oracle<D, Output = V> + Send + 'static,
    {
        if self.level >= max_level {
            self.prune();
            return Ok(false);
        }
        let (boundary, points) =
            self.evaluate_with(memoized(target.as_ref(), map.as_ref()));
        if !boundary {
            self.prune();
            return Ok(false);
        }
        let spawner = pool.spawner();
        for child in self.refine(&points) {
            Self::queue_divide(
                child,
                target.clone(),
                max_level,
                map.clone(),
                spawner.clone(),
            );
        }
        pool.barrier()?;
        Ok(true)
    }

    fn queue_divide<O>(
        node: Arc<Self>,
        target: Arc<O>,
        max_level: usize,
        map: Arc<TargetMap<D, V>>,
        spawner: Spawner,
    ) where
        O: Oracle<D, Output = V> + Send + 'static,
    {
        let s = spawner.clone();
        spawner.spawn(move || {
            if node.level >= max_level {
                node.prune();
                return;
            }
            let (boundary, points) =
                node.evaluate_with(memoized(target.as_ref(), map.as_ref()));
            if !boundary {
                node.prune();
                return;
            }
            for child in node.refine(&points) {
                Self::queue_divide(
                    child,
                    target.clone(),
                    max_level,
                    map.clone(),
                    s.clone(),
                );
            }
        });
    }

    /// Divides the tree according to the given settings
    ///
    /// Depending on `settings`, this calls [`divide`](Self::divide),
    /// [`divide_memoized`](Self::divide_memoized), or
    /// [`divide_parallel`](Self::divide_parallel) on a freshly built pool.
    pub fn build<O>(
        self: &Arc<Self>,
        target: &Arc<O>,
        settings: &Settings,
    ) -> Result<bool, Error>
    where
        O: Oracle<D, Output = V> + Send + 'static,
    {
        debug!(
            "dividing to level {} with {} threads",
            settings.max_level, settings.threads
        );
        let split = match settings.threads.get() {
            None if !settings.memoize => {
                self.divide(target.as_ref(), settings.max_level)
            }
            None => {
                let map = TargetMap::new();
                let out = self.divide_memoized(
                    target.as_ref(),
                    settings.max_level,
                    &map,
                );
                debug!("memoized {} oracle values", map.len());
                out
            }
            Some(n) => {
                let pool = ThreadPool::new(n)?;
                let map = Arc::new(TargetMap::new());
                let out = self.divide_parallel(
                    target,
                    settings.max_level,
                    &map,
                    &pool,
                )?;
                debug!("memoized {} oracle values", map.len());
                out
            }
        };
        debug!(
            "tree has {} nodes, depth {}",
            self.node_count(),
            self.depth()
        );
        Ok(split)
    }
}

/// Wraps an oracle so that its results are cached in `map`
fn memoized<'a, const D: usize, V: Value, O: Oracle<D, Output = V>>(
    target: &'a O,
    map: &'a TargetMap<D, V>,
) -> impl FnMut(&Point<D>) -> V + 'a {
    move |p| map.get_or_insert_with(point_key(p), || target.eval(p))
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        primitive::{Cube, Cuboid, Primitive},
        sampler::CornerSampler,
        split::{Linear, Weighted},
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unit_square() -> Cube<2> {
        Cube::new(Point::<2>::new(-1.0, -1.0), 2.0).unwrap()
    }

    fn grid3() -> Arc<CartesianGridSampler> {
        Arc::new(CartesianGridSampler::new(3).unwrap())
    }

    fn square_tree<V: Value>() -> SpaceTreeNode<2, Cube<2>, V> {
        SpaceTreeNode::new(unit_square(), grid3(), Arc::new(MidPoint))
    }

    fn circle(p: &Point<2>) -> f64 {
        p.norm() - 0.6
    }

    #[test]
    fn unevaluated() {
        let root = SpaceTreeNode::<2, _, f64>::new(
            unit_square(),
            grid3(),
            Arc::new(MidPoint),
        );
        assert!(matches!(root.is_boundary(), Err(Error::Unevaluated)));
        assert!(!root.is_evaluated());
        assert!(root.values().is_empty());
    }

    #[test]
    fn boundary_detection() {
        let root = square_tree();
        assert!(root.evaluate(&circle));
        assert!(root.is_boundary().unwrap());
        assert_eq!(root.values().len(), 9);

        // Only the center sample is inside the circle
        let signs: Vec<bool> =
            root.values().iter().map(|v| v.is_above_zero()).collect();
        assert_eq!(signs.iter().filter(|s| !**s).count(), 1);
        assert!(!signs[4]);

        // Everything is outside a tiny circle placed off the sample grid
        let far = |p: &Point<2>| (p - Point::<2>::new(0.5, 0.5)).norm() - 0.1;
        assert!(!root.evaluate(&far));
        assert!(!root.is_boundary().unwrap());
    }

    #[test]
    fn zero_is_asymmetric() {
        let cube = unit_square();
        let s = Arc::new(CornerSampler);

        // First corner is positive, another corner is exactly zero: mismatch
        let root = SpaceTreeNode::new(cube, s.clone(), Arc::new(MidPoint));
        let f = |p: &Point<2>| if p.x < 0.0 && p.y < 0.0 { 1.0 } else { 0.0 };
        assert!(root.evaluate(&f));

        // First corner is negative, others are zero: no mismatch
        let g = |p: &Point<2>| if p.x < 0.0 && p.y < 0.0 { -1.0 } else { 0.0 };
        assert!(!root.evaluate(&g));
    }

    #[test]
    fn boolean_oracle() {
        let root = square_tree();
        let disk = |p: &Point<2>| p.norm() < 0.5;
        assert!(root.divide(&disk, 3));
        assert_eq!(root.children().len(), 4);
        assert!(root.depth() <= 3);
    }

    #[test]
    fn divide_respects_max_level() {
        let root = square_tree();
        assert!(!root.divide(&circle, 0));
        assert!(!root.is_evaluated());
        assert!(root.children().is_empty());

        assert!(root.divide(&circle, 4));
        assert_eq!(root.depth(), 4);
        root.visit(|n| {
            assert!(n.level() <= 4);
            for c in n.children() {
                assert_eq!(c.level(), n.level() + 1);
            }
            if !n.children().is_empty() {
                assert!(n.is_boundary().unwrap());
                assert_eq!(n.children().len(), 4);
            }
        });
    }

    #[test]
    fn divide_replaces_children() {
        let root = square_tree();
        root.divide(&circle, 3);
        let first = root.node_count();
        root.divide(&circle, 3);
        assert_eq!(root.node_count(), first);
        root.divide(&circle, 1);
        assert_eq!(root.node_count(), 5);
    }

    #[test]
    fn evaluate_keeps_children() {
        let root = square_tree();
        root.divide(&circle, 3);
        let shape = root.node_count();

        // Re-evaluating against a shape which misses the cell only updates
        // the node's own samples
        let far = |p: &Point<2>| (p - Point::<2>::new(0.5, 0.5)).norm() - 0.1;
        assert!(!root.evaluate(&far));
        assert_eq!(root.node_count(), shape);

        // Dividing is what drops them
        assert!(!root.divide(&far, 3));
        assert_eq!(root.node_count(), 1);
    }

    #[test]
    fn parallel_divide_drops_stale_children() {
        let root = Arc::new(square_tree());
        root.divide(&circle, 3);
        assert!(root.node_count() > 1);

        let pool = ThreadPool::new(2).unwrap();
        let map = Arc::new(TargetMap::new());
        let far = |p: &Point<2>| (p - Point::<2>::new(0.5, 0.5)).norm() - 0.1;
        let target = Arc::new(far);
        assert!(!root.divide_parallel(&target, 3, &map, &pool).unwrap());
        assert_eq!(root.node_count(), 1);
    }

    #[test]
    fn evaluate_map_shares_samples() {
        let calls = AtomicUsize::new(0);
        let counted = |p: &Point<2>| {
            calls.fetch_add(1, Ordering::Relaxed);
            circle(p)
        };
        let node = |x: f64| {
            let cube = Cube::new(Point::<2>::new(x, 0.0), 1.0).unwrap();
            SpaceTreeNode::new(cube, grid3(), Arc::new(MidPoint))
        };

        // Neighbours share the three samples along x = 1
        let map = TargetMap::new();
        let left = node(0.0);
        let right = node(1.0);
        let a = left.evaluate_map(&counted, &map);
        assert_eq!(calls.load(Ordering::Relaxed), 9);
        let b = right.evaluate_map(&counted, &map);
        assert_eq!(calls.load(Ordering::Relaxed), 15);
        assert_eq!(map.len(), 15);

        // Same results as sampling without the map
        let plain_left = node(0.0);
        let plain_right = node(1.0);
        assert_eq!(a, plain_left.evaluate(&circle));
        assert_eq!(b, plain_right.evaluate(&circle));
        assert_eq!(left.values(), plain_left.values());
        assert_eq!(right.values(), plain_right.values());
        assert_eq!(
            right.is_boundary().unwrap(),
            plain_right.is_boundary().unwrap()
        );
    }

    #[test]
    fn children_share_sampler_and_policy() {
        let root = square_tree();
        root.divide(&circle, 2);
        root.visit(|n| {
            assert!(Arc::ptr_eq(n.sampler(), root.sampler()));
            assert!(Arc::ptr_eq(n.policy(), root.policy()));
        });
    }

    #[test]
    fn degenerate_children_are_discarded() {
        // The weighted policy pulls the split point onto the box's face,
        // because all of the weight sits on one side
        let size = Point::<2>::new(1.0, 1.0);
        let cell = Cuboid::new(Point::<2>::zeros(), size).unwrap();
        let root = SpaceTreeNode::new(
            cell,
            Arc::new(CornerSampler),
            Arc::new(Weighted),
        );
        let f = |p: &Point<2>| if p.x > 0.5 { 1.0 } else { -1.0 };
        assert!(root.divide(&f, 1));
        let children = root.children();
        assert!(children.len() < 4);
        root.visit(|n| assert!(!n.cell().is_degenerate()));
    }

    #[test]
    fn box_tree_stays_in_bounds() {
        let cell =
            Cuboid::new(Point::<2>::repeat(-1.0), Point::<2>::repeat(2.0))
                .unwrap();
        let root = SpaceTreeNode::new(cell, grid3(), Arc::new(Linear));
        root.divide(&circle, 5);
        let area: f64 = root
            .children()
            .iter()
            .map(|c| c.cell().volume())
            .sum();
        approx::assert_relative_eq!(area, 4.0, epsilon = 1e-9);
        root.visit(|n| assert!(cell.contains(&n.cell().centroid())));
    }

    #[test]
    fn clear_is_idempotent() {
        let root = square_tree();
        root.divide(&circle, 3);
        let mut before = vec![];
        root.visit(|n| before.push((n.values(), n.is_boundary().ok())));
        let shape = root.node_count();

        root.clear();
        assert_eq!(root.node_count(), shape);
        root.visit(|n| assert!(!n.is_evaluated()));

        let mut after = vec![];
        root.visit(|n| {
            if n.level() < 3 {
                n.evaluate(&circle);
            }
            after.push((n.values(), n.is_boundary().ok()));
        });
        assert_eq!(before, after);
    }

    #[test]
    fn memoization_skips_shared_samples() {
        let calls = AtomicUsize::new(0);
        let counted = |p: &Point<2>| {
            calls.fetch_add(1, Ordering::Relaxed);
            circle(p)
        };

        let plain = square_tree();
        plain.divide(&counted, 4);
        let unmemoized = calls.swap(0, Ordering::Relaxed);

        let memo = square_tree();
        let map = TargetMap::new();
        memo.divide_memoized(&counted, 4, &map);
        let memoized = calls.load(Ordering::Relaxed);

        assert_eq!(plain.node_count(), memo.node_count());
        assert!(memoized < unmemoized);
        assert_eq!(memoized, map.len());
    }

    #[test]
    fn parallel_matches_serial() {
        let serial = square_tree();
        serial.divide(&circle, 6);

        let parallel = Arc::new(SpaceTreeNode::new(
            unit_square(),
            grid3(),
            Arc::new(MidPoint),
        ));
        let pool = ThreadPool::new(4).unwrap();
        let map = Arc::new(TargetMap::new());
        let target = Arc::new(circle);
        assert!(parallel.divide_parallel(&target, 6, &map, &pool).unwrap());

        assert_eq!(serial.node_count(), parallel.node_count());
        assert_eq!(serial.depth(), parallel.depth());
        let mut a = serial.boundary_leaves();
        let mut b = parallel.boundary_leaves();
        let key = |c: &Cube<2>| (c.base().x, c.base().y);
        a.sort_by(|x, y| key(x).partial_cmp(&key(y)).unwrap());
        b.sort_by(|x, y| key(x).partial_cmp(&key(y)).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn build_with_settings() {
        let target = Arc::new(circle);
        let mut counts = vec![];
        for (threads, memoize) in [
            (ThreadCount::One, false),
            (ThreadCount::One, true),
            (ThreadCount::Many(2.try_into().unwrap()), true),
        ] {
            let root = Arc::new(SpaceTreeNode::new(
                unit_square(),
                grid3(),
                Arc::new(MidPoint),
            ));
            let settings = Settings {
                max_level: 5,
                threads,
                memoize,
            };
            assert!(root.build(&target, &settings).unwrap());
            counts.push(root.node_count());
            assert_eq!((root.leaves().len() - 1) % 3, 0);
        }
        assert!(counts.iter().all(|c| *c == counts[0]));
    }

    #[test]
    fn parallel_build_reports_oracle_panic() {
        let target = Arc::new(|p: &Point<2>| {
            if p.x > 0.0 && p.x < 0.5 && p.y > 0.0 && p.y < 0.5 {
                panic!("bad sample");
            }
            circle(p)
        });
        let root = Arc::new(square_tree());
        let settings = Settings {
            max_level: 4,
            threads: ThreadCount::Many(2.try_into().unwrap()),
            memoize: true,
        };
        match root.build(&target, &settings) {
            Err(Error::JobPanicked(msg)) => assert_eq!(msg, "bad sample"),
            r => panic!("unexpected result: {r:?}"),
        }
    }
}
