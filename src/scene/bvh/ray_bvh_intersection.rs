use super::{Bvh, NodeIdx, NodeKind};
use crate::geometry::{FloatType, INTERSECTION_EPSILON, Ray};
use crate::scene::Intersection;

impl Bvh {
    /// Finds the closest valid intersection along the ray, front to back.
    ///
    /// `test` intersects the item with the given local index against the
    /// ray, with the current best distance for early-out. Hits at or beyond
    /// the best distance, or closer than the self-intersection epsilon, are
    /// discarded here even if `test` reports them.
    pub fn intersect(
        &self,
        ray: &Ray,
        best_distance: FloatType,
        mut test: impl FnMut(u32, FloatType) -> Option<Intersection>,
    ) -> Option<(u32, Intersection)> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut best_distance = best_distance;
        let mut best: Option<(u32, Intersection)> = None;

        // (node, entry distance of its bbox along the ray)
        let mut traverse_stack: Vec<(NodeIdx, FloatType)> = Vec::new();
        let mut cur = NodeIdx::from_raw(0);

        loop {
            match self.nodes[cur].kind {
                NodeKind::Leaf { start, count } => {
                    for &index in &self.leaf_data[start as usize..(start + count) as usize] {
                        if let Some(hit) = test(index, best_distance)
                            && hit.distance > INTERSECTION_EPSILON
                            && hit.distance < best_distance
                        {
                            best_distance = hit.distance;
                            best = Some((index, hit));
                        }
                    }

                    let Some(next) = self.pop_live(&mut traverse_stack, best_distance) else {
                        break;
                    };
                    cur = next;
                }
                NodeKind::Inner { left } => {
                    let right = left + 1;
                    let (left_t0, left_t1) = clip(self.nodes[left].bbox.intersect(ray), best_distance);
                    let (right_t0, right_t1) =
                        clip(self.nodes[right].bbox.intersect(ray), best_distance);

                    let descend_left = left_t0 < left_t1 + INTERSECTION_EPSILON;
                    let descend_right = right_t0 < right_t1 + INTERSECTION_EPSILON;

                    match (descend_left, descend_right) {
                        (true, false) => cur = left,
                        (false, true) => cur = right,
                        (true, true) => {
                            // Descend the nearer child first; a close hit
                            // there lets the far child be pruned entirely.
                            let (near, far, far_t0) = if left_t0 <= right_t0 {
                                (left, right, right_t0)
                            } else {
                                (right, left, left_t0)
                            };
                            traverse_stack.push((far, far_t0));
                            cur = near;
                        }
                        (false, false) => {
                            let Some(next) = self.pop_live(&mut traverse_stack, best_distance)
                            else {
                                break;
                            };
                            cur = next;
                        }
                    }
                }
            }
        }

        best
    }

    /// Pops stack entries until one's recorded entry distance still beats
    /// the current best hit. Entries behind the best hit cannot improve it.
    fn pop_live(
        &self,
        stack: &mut Vec<(NodeIdx, FloatType)>,
        best_distance: FloatType,
    ) -> Option<NodeIdx> {
        while let Some((node, entry)) = stack.pop() {
            if entry <= best_distance {
                return Some(node);
            }
        }
        None
    }
}

fn clip((t0, t1): (FloatType, FloatType), best_distance: FloatType) -> (FloatType, FloatType) {
    (t0.max(INTERSECTION_EPSILON), t1.min(best_distance))
}
