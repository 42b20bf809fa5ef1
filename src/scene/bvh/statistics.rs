use super::{Bvh, NodeIdx, NodeKind};
use crate::util::Stats;

impl Bvh {
    /// Logs tree shape statistics at debug level. Cheap enough to run after
    /// every rebuild.
    pub fn log_statistics(&self) {
        if self.is_empty() || !log::log_enabled!(log::Level::Debug) {
            return;
        }

        log::debug!("BVH nodes: {}, leaf entries: {}", self.nodes.len(), self.leaf_data.len());
        log::debug!("BVH leaf depth: {}", self.depth_statistics(NodeIdx::from_raw(0)));
        log::debug!("BVH leaf occupancy: {}", self.leaf_fill_statistics());
    }

    fn depth_statistics(&self, node: NodeIdx) -> Stats {
        match self.nodes[node].kind {
            NodeKind::Leaf { .. } => Stats::new_single(1),
            NodeKind::Inner { left } => {
                let mut ret = self
                    .depth_statistics(left)
                    .merge(&self.depth_statistics(left + 1));
                ret.offset(1);
                ret
            }
        }
    }

    fn leaf_fill_statistics(&self) -> Stats {
        let mut stats = Stats::default();
        stats.add_samples(self.nodes.iter().filter_map(|node| match node.kind {
            NodeKind::Leaf { count, .. } => Some(count as usize),
            NodeKind::Inner { .. } => None,
        }));
        stats
    }
}
