mod building;
mod ray_bvh_intersection;
mod statistics;

use index_vec::IndexVec;

use crate::geometry::Aabb;

index_vec::define_index_type! {
    pub struct NodeIdx = u32;
    IMPL_RAW_CONVERSIONS = true;
}

/// A binary bounding volume hierarchy over a set of boxed items.
///
/// The tree stores only local indices (positions in the box slice it was
/// built from); mapping them back to actual primitives is the owner's job.
/// Both build and traversal are iterative with explicit stacks, so tree
/// depth is independent of the host call-stack limit.
#[derive(Clone, Debug, Default)]
pub struct Bvh {
    /// Node arena; node 0 is the root, an inner node's right child
    /// immediately follows its left child.
    nodes: IndexVec<NodeIdx, Node>,

    /// Shared storage for leaf contents: each leaf owns a contiguous run.
    leaf_data: Vec<u32>,
}

#[derive(Clone, Debug)]
struct Node {
    bbox: Aabb,
    kind: NodeKind,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum NodeKind {
    Inner { left: NodeIdx },
    Leaf { start: u32, count: u32 },
}

impl Node {
    /// Placeholder written into the arena before the node's real content is
    /// known during the build.
    fn placeholder() -> Node {
        Node {
            bbox: Aabb::empty(),
            kind: NodeKind::Leaf { start: 0, count: 0 },
        }
    }
}

impl Bvh {
    /// Bounding box of everything in the tree. Empty for an empty tree.
    pub fn scene_bounding_box(&self) -> Aabb {
        self.nodes
            .first()
            .map(|root| root.bbox.clone())
            .unwrap_or_else(Aabb::empty)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
