use ndarray::{Array2, ArrayView1, Zip};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One k-nearest-neighbor query result
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Row of the matching point in the matrix the tree was built from
    pub index: usize,
    /// Euclidean distance to the query point
    pub distance: f64,
}

/// Median-split k-d tree over the rows of a point matrix
///
/// Dimensionality is the number of matrix columns. The tree is built once and
/// queried many times, it never changes after construction.
#[derive(Clone, Debug)]
pub struct KdTree {
    points: Array2<f64>,
    nodes: Vec<Node>,
}

#[derive(Clone, Copy, Debug)]
struct Node {
    /// Row in the point matrix
    point: usize,
    /// Split dimension, column in the point matrix
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

impl KdTree {
    /// Build a balanced tree, `None` when `points` has no rows
    pub fn build(points: Array2<f64>) -> Option<Self> {
        if points.nrows() == 0 {
            return None;
        }
        let mut indices: Vec<usize> = (0..points.nrows()).collect();
        let mut nodes = Vec::with_capacity(points.nrows());
        build_recursive(&points, &mut indices, 0, &mut nodes);
        Some(Self { points, nodes })
    }

    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    pub fn n_dims(&self) -> usize {
        self.points.ncols()
    }

    /// The `min(k, len)` nearest points, closest first
    pub fn nearest(&self, query: ArrayView1<'_, f64>, k: usize) -> Vec<Neighbor> {
        assert_eq!(
            query.len(),
            self.n_dims(),
            "query dimensionality does not match the tree"
        );
        let k = k.min(self.len());
        if k == 0 {
            return Vec::new();
        }
        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.search(0, query, k, &mut heap);
        let mut neighbors: Vec<Neighbor> = heap
            .into_iter()
            .map(|entry| Neighbor {
                index: entry.index,
                distance: entry.dist_sq.sqrt(),
            })
            .collect();
        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.index.cmp(&b.index))
        });
        neighbors
    }

    fn search(
        &self,
        node: usize,
        query: ArrayView1<'_, f64>,
        k: usize,
        heap: &mut BinaryHeap<HeapEntry>,
    ) {
        let Node {
            point,
            axis,
            left,
            right,
        } = self.nodes[node];

        let dist_sq = distance_squared(self.points.row(point), query);
        push_bounded(
            heap,
            k,
            HeapEntry {
                dist_sq,
                index: point,
            },
        );

        let delta = query[axis] - self.points[[point, axis]];
        let (near, far) = if delta < 0.0 {
            (left, right)
        } else {
            (right, left)
        };

        if let Some(near) = near {
            self.search(near, query, k, heap);
        }
        // The far side can hold closer points only when the splitting plane
        // is closer than the current k-th best
        if let Some(far) = far {
            let prune = heap.len() == k
                && heap
                    .peek()
                    .is_some_and(|worst| delta.powi(2) >= worst.dist_sq);
            if !prune {
                self.search(far, query, k, heap);
            }
        }
    }
}

fn build_recursive(
    points: &Array2<f64>,
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    if indices.is_empty() {
        return None;
    }

    let axis = depth % points.ncols();
    let median = indices.len() / 2;
    indices.select_nth_unstable_by(median, |&a, &b| {
        points[[a, axis]].total_cmp(&points[[b, axis]])
    });

    let node = nodes.len();
    nodes.push(Node {
        point: indices[median],
        axis,
        left: None,
        right: None,
    });

    let (left_indices, rest) = indices.split_at_mut(median);
    let left = build_recursive(points, left_indices, depth + 1, nodes);
    let right = build_recursive(points, &mut rest[1..], depth + 1, nodes);
    nodes[node].left = left;
    nodes[node].right = right;

    Some(node)
}

fn distance_squared(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    Zip::from(&a)
        .and(&b)
        .fold(0.0, |acc, &x, &y| acc + (x - y).powi(2))
}

#[derive(Clone, Copy, Debug)]
struct HeapEntry {
    dist_sq: f64,
    index: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then(self.index.cmp(&other.index))
    }
}

/// Keep the k smallest entries, the heap root is the current worst
fn push_bounded(heap: &mut BinaryHeap<HeapEntry>, k: usize, entry: HeapEntry) {
    if heap.len() < k {
        heap.push(entry);
    } else if heap.peek().is_some_and(|worst| entry < *worst) {
        heap.pop();
        heap.push(entry);
    }
}
