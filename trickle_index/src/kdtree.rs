// Copyright 2025 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Balanced k-d tree over 2D items with breadth-first linearization.
//!
//! The tree is built by median splits that alternate between the x and y axis
//! with depth. Because both halves of every split differ in size by at most one,
//! the tree is complete down to its last level, so the breadth-first order has a
//! useful property: the first `2^L - 1` items are exactly the nodes at depths
//! `0..L`, an evenly spread coarse sample of the whole set. Rendering a prefix of
//! [`KdTree::linearize`] gives level-of-detail for free.
//!
//! Nodes live in an arena and every traversal (build, linearize, search) uses an
//! explicit stack or queue, so deep trees never recurse.

use alloc::collections::{BinaryHeap, VecDeque};
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use crate::metric::{Metric, SquaredEuclidean};
use crate::paged::{DEFAULT_PAGE_CAPACITY, PagedSequence};
use crate::types::{Aabb2D, Axis, Coords, cmp_f64};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(usize);

impl NodeIdx {
    const fn get(self) -> usize {
        self.0
    }
}

struct Node<T> {
    item: T,
    coords: Coords,
    axis: Axis,
    /// Bounds of every point in this node's subtree, itself included.
    bbox: Aabb2D<f64>,
    left: Option<NodeIdx>,
    right: Option<NodeIdx>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Range of the work permutation still to be split.
struct Span {
    start: usize,
    end: usize,
    depth: usize,
    parent: Option<(usize, Side)>,
}

struct Planned {
    source: usize,
    axis: Axis,
    left: Option<NodeIdx>,
    right: Option<NodeIdx>,
}

/// A balanced 2D k-d tree owning its items.
pub struct KdTree<T, M = SquaredEuclidean> {
    nodes: Vec<Node<T>>,
    root: Option<NodeIdx>,
    metric: M,
    depth: usize,
}

impl<T> KdTree<T, SquaredEuclidean> {
    /// Build a tree using squared Euclidean distance.
    ///
    /// `select` maps each item to its `[x, y]` coordinates; it is called once
    /// per item.
    pub fn from_items(items: Vec<T>, select: impl Fn(&T) -> Coords) -> Self {
        Self::build(items, SquaredEuclidean, select)
    }
}

impl<T, M: Metric> KdTree<T, M> {
    /// Build a tree over `items` for the given metric and dimension selector.
    ///
    /// Runs in `O(n log n)`. The median at each level is chosen with a total
    /// order on (coordinate, input position), so a fixed input always yields the
    /// same tree.
    pub fn build(items: Vec<T>, metric: M, select: impl Fn(&T) -> Coords) -> Self {
        let n = items.len();
        let coords: Vec<Coords> = items.iter().map(&select).collect();
        let mut order: Vec<usize> = (0..n).collect();
        let mut plan: Vec<Planned> = Vec::with_capacity(n);
        let mut depth = 0;

        let mut stack = vec![Span {
            start: 0,
            end: n,
            depth: 0,
            parent: None,
        }];
        while let Some(span) = stack.pop() {
            if span.start >= span.end {
                continue;
            }
            let axis = Axis::at_depth(span.depth);
            let a = axis.index();
            let slice = &mut order[span.start..span.end];
            let median = slice.len() / 2;
            slice.select_nth_unstable_by(median, |&l, &r| {
                cmp_f64(coords[l][a], coords[r][a]).then(l.cmp(&r))
            });

            let slot = plan.len();
            plan.push(Planned {
                source: slice[median],
                axis,
                left: None,
                right: None,
            });
            if let Some((parent, side)) = span.parent {
                match side {
                    Side::Left => plan[parent].left = Some(NodeIdx(slot)),
                    Side::Right => plan[parent].right = Some(NodeIdx(slot)),
                }
            }
            depth = depth.max(span.depth + 1);

            let mid = span.start + median;
            // Right is pushed first so the left subtree is planned first.
            stack.push(Span {
                start: mid + 1,
                end: span.end,
                depth: span.depth + 1,
                parent: Some((slot, Side::Right)),
            });
            stack.push(Span {
                start: span.start,
                end: mid,
                depth: span.depth + 1,
                parent: Some((slot, Side::Left)),
            });
        }

        // Move items into plan order without cloning.
        let mut rank = vec![0_usize; n];
        for (slot, p) in plan.iter().enumerate() {
            rank[p.source] = slot;
        }
        let mut ranked: Vec<(usize, T)> = items
            .into_iter()
            .enumerate()
            .map(|(source, item)| (rank[source], item))
            .collect();
        ranked.sort_unstable_by_key(|(slot, _)| *slot);

        let mut nodes: Vec<Node<T>> = ranked
            .into_iter()
            .zip(&plan)
            .map(|((_, item), p)| {
                let c = coords[p.source];
                Node {
                    item,
                    coords: c,
                    axis: p.axis,
                    bbox: Aabb2D::from_point(c[0], c[1]),
                    left: p.left,
                    right: p.right,
                }
            })
            .collect();

        // Children always come after their parent in plan order.
        for i in (0..nodes.len()).rev() {
            let mut bbox = nodes[i].bbox;
            for child in [nodes[i].left, nodes[i].right].into_iter().flatten() {
                bbox = bbox.union(&nodes[child.get()].bbox);
            }
            nodes[i].bbox = bbox;
        }

        log::debug!("built k-d tree over {n} items with depth {depth}");

        Self {
            root: (!nodes.is_empty()).then_some(NodeIdx(0)),
            nodes,
            metric,
            depth,
        }
    }

    /// Number of items in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no items.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of levels; zero for an empty tree.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The metric this tree was built with.
    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Bounds of all items, or `None` when empty.
    pub fn bounds(&self) -> Option<Aabb2D<f64>> {
        self.root.map(|r| self.nodes[r.get()].bbox)
    }

    /// Iterate items breadth-first: root, then each level left to right.
    pub fn iter(&self) -> BreadthFirst<'_, T, M> {
        BreadthFirst {
            tree: self,
            queue: self.root.into_iter().collect(),
        }
    }

    /// Copy the breadth-first order into a [`PagedSequence`] with the default page capacity.
    pub fn linearize(&self) -> PagedSequence<T>
    where
        T: Clone,
    {
        self.linearize_with_capacity(DEFAULT_PAGE_CAPACITY)
    }

    /// Copy the breadth-first order into a [`PagedSequence`] with the given page capacity.
    ///
    /// # Panics
    ///
    /// Panics if `page_capacity` is zero.
    pub fn linearize_with_capacity(&self, page_capacity: usize) -> PagedSequence<T>
    where
        T: Clone,
    {
        let mut out = PagedSequence::with_page_capacity(page_capacity);
        out.extend(self.iter().cloned());
        out
    }

    /// Consume the tree, moving its items into breadth-first order.
    pub fn into_linearized(self) -> PagedSequence<T> {
        let order: Vec<usize> = self.iter_slots().collect();
        let mut rank = vec![0_usize; order.len()];
        for (pos, slot) in order.iter().enumerate() {
            rank[*slot] = pos;
        }
        let mut ranked: Vec<(usize, T)> = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(slot, node)| (rank[slot], node.item))
            .collect();
        ranked.sort_unstable_by_key(|(pos, _)| *pos);
        ranked.into_iter().map(|(_, item)| item).collect()
    }

    /// Up to `max_count` items within `max_distance` of `center`, nearest first.
    ///
    /// Each result is paired with its distance under the tree's metric. A
    /// distance equal to `max_distance` still qualifies. Subtrees whose bounds
    /// cannot beat the current worst kept candidate are skipped. An empty tree or
    /// a zero `max_count` yields an empty result.
    pub fn nearest(&self, center: Coords, max_count: usize, max_distance: f64) -> Vec<(&T, f64)> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        if max_count == 0 {
            log::warn!("nearest query with a zero result count");
            return Vec::new();
        }

        let mut best: BinaryHeap<Candidate> = BinaryHeap::with_capacity(max_count + 1);
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx.get()];
            let bound = self.lower_bound(&node.bbox, center);
            if bound > max_distance {
                continue;
            }
            if best.len() == max_count && best.peek().is_some_and(|w| bound >= w.distance) {
                continue;
            }

            let distance = self.metric.distance(center, node.coords);
            if distance <= max_distance {
                let candidate = Candidate {
                    distance,
                    slot: idx.get(),
                };
                if best.len() < max_count {
                    best.push(candidate);
                } else if best.peek().is_some_and(|w| candidate < *w) {
                    best.pop();
                    best.push(candidate);
                }
            }

            let a = node.axis.index();
            let (near, far) = if center[a] < node.coords[a] {
                (node.left, node.right)
            } else {
                (node.right, node.left)
            };
            stack.extend(far);
            stack.extend(near);
        }

        best.into_sorted_vec()
            .into_iter()
            .map(|c| (&self.nodes[c.slot].item, c.distance))
            .collect()
    }

    /// Smallest possible distance from `center` to any point inside `bbox`.
    fn lower_bound(&self, bbox: &Aabb2D<f64>, center: Coords) -> f64 {
        let (x, y) = bbox.clamp_point(center[0], center[1]);
        self.metric.distance(center, [x, y])
    }

    fn iter_slots(&self) -> impl Iterator<Item = usize> + '_ {
        let mut queue: VecDeque<NodeIdx> = self.root.into_iter().collect();
        core::iter::from_fn(move || {
            let idx = queue.pop_front()?;
            let node = &self.nodes[idx.get()];
            queue.extend(node.left);
            queue.extend(node.right);
            Some(idx.get())
        })
    }
}

impl<T, M> Debug for KdTree<T, M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KdTree")
            .field("len", &self.nodes.len())
            .field("depth", &self.depth)
            .field("has_root", &self.root.is_some())
            .finish_non_exhaustive()
    }
}

/// Breadth-first iterator over the items of a [`KdTree`].
pub struct BreadthFirst<'a, T, M> {
    tree: &'a KdTree<T, M>,
    queue: VecDeque<NodeIdx>,
}

impl<'a, T, M> Iterator for BreadthFirst<'a, T, M> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.queue.pop_front()?;
        let node = &self.tree.nodes[idx.get()];
        self.queue.extend(node.left);
        self.queue.extend(node.right);
        Some(&node.item)
    }
}

impl<T, M> Debug for BreadthFirst<'_, T, M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BreadthFirst")
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

/// Kept candidate; ordered by distance, then by arena slot for determinism.
#[derive(Copy, Clone, Debug)]
struct Candidate {
    distance: f64,
    slot: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_f64(self.distance, other.distance).then(self.slot.cmp(&other.slot))
    }
}
