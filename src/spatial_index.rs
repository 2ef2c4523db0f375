/*!

Radius queries over agent positions, backed by an R-tree.

Positions change every step, so the tree is bulk-loaded from scratch after each activation pass
instead of being updated as agents move. Between rebuilds the tree holds the positions agents had
at the last rebuild. Removal is immediate: a removed agent never shows up in a later query.

*/

use crate::{district::Point, AgentId, HashMap};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

#[derive(Copy, Clone, PartialEq, Debug)]
struct IndexedAgent {
    id: AgentId,
    position: [f64; 2],
}

impl RTreeObject for IndexedAgent {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedAgent {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

#[derive(Default)]
pub struct SpatialIndex {
    tree: RTree<IndexedAgent>,
    // The position each agent was indexed at, needed to find its entry again for removal.
    indexed_positions: HashMap<AgentId, [f64; 2]>,
}

impl SpatialIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indexed_positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indexed_positions.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: AgentId) -> bool {
        self.indexed_positions.contains_key(&id)
    }

    /// Adds `id` at `position`, replacing any entry it already has.
    pub fn insert(&mut self, id: AgentId, position: Point) {
        self.remove(id);
        let position = [position.x, position.y];
        self.indexed_positions.insert(id, position);
        self.tree.insert(IndexedAgent { id, position });
    }

    /// Returns whether `id` was indexed.
    pub fn remove(&mut self, id: AgentId) -> bool {
        match self.indexed_positions.remove(&id) {
            Some(position) => {
                self.tree.remove(&IndexedAgent { id, position });
                true
            }
            None => false,
        }
    }

    /// Replaces the whole index with the given agents and positions.
    pub fn rebuild(&mut self, agents: impl IntoIterator<Item = (AgentId, Point)>) {
        let entries: Vec<IndexedAgent> = agents
            .into_iter()
            .map(|(id, position)| IndexedAgent {
                id,
                position: [position.x, position.y],
            })
            .collect();

        self.indexed_positions = entries
            .iter()
            .map(|entry| (entry.id, entry.position))
            .collect();
        self.tree = RTree::bulk_load(entries);
    }

    /// All indexed agents within `radius` of `center`, boundary included, in ascending id order.
    /// A negative radius covers nothing.
    #[must_use]
    pub fn within_distance(&self, center: Point, radius: f64) -> Vec<AgentId> {
        if radius < 0.0 {
            return Vec::new();
        }
        let mut found: Vec<AgentId> = self
            .tree
            .locate_within_distance([center.x, center.y], radius * radius)
            .map(|entry| entry.id)
            .collect();
        found.sort_unstable();
        found
    }
}
