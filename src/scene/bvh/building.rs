use assert2::assert;

use super::{Bvh, Node, NodeIdx, NodeKind};
use crate::geometry::{Aabb, FloatType, WorldPoint};

/// Centroid extents below this are treated as coincident and terminate the
/// split, folding degenerate geometry into a leaf.
const SPLIT_EPSILON: FloatType = 1e-7;

/// Segments smaller than this always become leaves.
const MIN_SPLIT_COUNT: usize = 3;

/// Per-segment state of the iterative build.
struct BuildFrame {
    segment_start: usize,
    segment_end: usize,
    node: NodeIdx,
    centroid_bbox: Aabb,
}

/// Centroid of one input box, tagged with its position in the input slice.
/// Only this auxiliary array is reordered during the build.
#[derive(Clone)]
struct Centroid {
    position: WorldPoint,
    orig_index: u32,
}

impl Bvh {
    /// Builds the hierarchy over a set of bounding boxes using an iterative
    /// split-in-the-middle scheme: the split axis is the widest axis of the
    /// segment's centroid bounding box and the pivot is its midpoint. This
    /// is a heuristic with good expected behavior, not a balanced-tree
    /// guarantee.
    pub fn build(boxes: &[Aabb]) -> Bvh {
        let mut bvh = Bvh::default();

        if boxes.is_empty() {
            return bvh;
        }

        let mut root_centroid_bbox = Aabb::empty();
        let mut centroids: Vec<Centroid> = boxes
            .iter()
            .enumerate()
            .map(|(i, bbox)| {
                let position = bbox.centroid();
                root_centroid_bbox.extend_point(&position);
                Centroid {
                    position,
                    orig_index: i as u32,
                }
            })
            .collect();

        bvh.nodes.push(Node::placeholder());

        let mut cur = BuildFrame {
            segment_start: 0,
            segment_end: boxes.len(),
            node: NodeIdx::from_raw(0),
            centroid_bbox: root_centroid_bbox,
        };
        let mut build_stack: Vec<BuildFrame> = Vec::new();

        loop {
            let count = cur.segment_end - cur.segment_start;
            let diagonal = cur.centroid_bbox.diagonal();
            let split_axis = diagonal.imax();

            if diagonal[split_axis].abs() < SPLIT_EPSILON || count < MIN_SPLIT_COUNT {
                bvh.make_leaf(&cur, &centroids, boxes);

                let Some(next) = build_stack.pop() else {
                    break;
                };
                cur = next;
                continue;
            }

            let split_value =
                (cur.centroid_bbox.min[split_axis] + cur.centroid_bbox.max[split_axis]) / 2.0;

            let mid = partition_segment(
                &mut centroids[cur.segment_start..cur.segment_end],
                split_axis,
                split_value,
            ) + cur.segment_start;

            // The split axis has nonzero extent, so the extreme centroids
            // fall on opposite sides of the midpoint pivot.
            assert!(mid > cur.segment_start && mid < cur.segment_end);

            let mut node_bbox = Aabb::empty();
            for centroid in &centroids[cur.segment_start..cur.segment_end] {
                node_bbox.extend_box(&boxes[centroid.orig_index as usize]);
            }

            let left = NodeIdx::from_usize(bvh.nodes.len());
            bvh.nodes[cur.node] = Node {
                bbox: node_bbox,
                kind: NodeKind::Inner { left },
            };
            bvh.nodes.push(Node::placeholder());
            bvh.nodes.push(Node::placeholder());

            build_stack.push(BuildFrame {
                segment_start: mid,
                segment_end: cur.segment_end,
                node: left + 1,
                centroid_bbox: centroid_bounds(&centroids[mid..cur.segment_end]),
            });

            cur = BuildFrame {
                segment_start: cur.segment_start,
                segment_end: mid,
                node: left,
                centroid_bbox: centroid_bounds(&centroids[cur.segment_start..mid]),
            };
        }

        bvh
    }

    fn make_leaf(&mut self, frame: &BuildFrame, centroids: &[Centroid], boxes: &[Aabb]) {
        let start = self.leaf_data.len() as u32;
        let mut bbox = Aabb::empty();

        for centroid in &centroids[frame.segment_start..frame.segment_end] {
            bbox.extend_box(&boxes[centroid.orig_index as usize]);
            self.leaf_data.push(centroid.orig_index);
        }

        self.nodes[frame.node] = Node {
            bbox,
            kind: NodeKind::Leaf {
                start,
                count: (frame.segment_end - frame.segment_start) as u32,
            },
        };
    }
}

/// Two-pointer in-place partition around `split_value` on `axis`.
/// Returns the index of the first element of the right half.
fn partition_segment(segment: &mut [Centroid], axis: usize, split_value: FloatType) -> usize {
    let mut left = 0;
    let mut right = segment.len();

    while left < right {
        if segment[left].position[axis] <= split_value {
            left += 1;
        } else {
            right -= 1;
            segment.swap(left, right);
        }
    }

    left
}

fn centroid_bounds(segment: &[Centroid]) -> Aabb {
    let mut bbox = Aabb::empty();
    for centroid in segment {
        bbox.extend_point(&centroid.position);
    }
    bbox
}
