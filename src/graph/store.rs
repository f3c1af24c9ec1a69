//! In-memory dependency graph over a resource snapshot
//!
//! Nodes are indices into the borrowed resource slice; edges carry a
//! [`RelationType`]. Ids are matched case-insensitively and duplicate edges
//! are suppressed.

use super::store_models::{DependencyEdge, RelationType};
use crate::models::ResourceDescriptor;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

pub struct DependencyGraph<'a> {
    resources: &'a [ResourceDescriptor],
    graph: DiGraph<usize, RelationType>,
    /// Lowercased id → node
    index: HashMap<String, NodeIndex>,
    edge_set: HashSet<(NodeIndex, NodeIndex, RelationType)>,
    /// Lowercased subnet id → lowercased NSG id, from VNet subnet definitions
    subnet_nsgs: HashMap<String, String>,
    dangling: usize,
}

impl<'a> DependencyGraph<'a> {
    /// Graph with one node per resource and no edges.
    /// When ids repeat, the first record wins.
    pub fn with_nodes(resources: &'a [ResourceDescriptor]) -> Self {
        let mut graph = DiGraph::with_capacity(resources.len(), resources.len());
        let mut index = HashMap::with_capacity(resources.len());
        for (i, resource) in resources.iter().enumerate() {
            let key = resource.id_key();
            if index.contains_key(&key) {
                continue;
            }
            let idx = graph.add_node(i);
            index.insert(key, idx);
        }
        Self {
            resources,
            graph,
            index,
            edge_set: HashSet::new(),
            subnet_nsgs: HashMap::new(),
            dangling: 0,
        }
    }

    // ==================== Construction ====================

    /// Add an edge by ids. Unknown targets count as dangling references.
    /// Returns true when a new edge was added.
    pub(crate) fn link(&mut self, source_id: &str, target_id: &str, relation: RelationType) -> bool {
        let Some(source) = self.node_index(source_id) else {
            return false;
        };
        let Some(target) = self.node_index(target_id) else {
            self.dangling += 1;
            return false;
        };
        self.link_nodes(source, target, relation)
    }

    pub(crate) fn link_nodes(&mut self, source: NodeIndex, target: NodeIndex, relation: RelationType) -> bool {
        if source == target || !self.edge_set.insert((source, target, relation)) {
            return false;
        }
        self.graph.add_edge(source, target, relation);
        true
    }

    pub(crate) fn record_dangling(&mut self) {
        self.dangling += 1;
    }

    pub(crate) fn record_subnet_nsg(&mut self, subnet_id: &str, nsg_id: &str) {
        self.subnet_nsgs
            .insert(subnet_id.to_ascii_lowercase(), nsg_id.to_ascii_lowercase());
    }

    // ==================== Node Operations ====================

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(&id.to_ascii_lowercase()).copied()
    }

    pub fn resource_at(&self, idx: NodeIndex) -> &'a ResourceDescriptor {
        let resources: &'a [ResourceDescriptor] = self.resources;
        &resources[self.graph[idx]]
    }

    pub fn resource(&self, id: &str) -> Option<&'a ResourceDescriptor> {
        self.node_index(id).map(|idx| self.resource_at(idx))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index(id).is_some()
    }

    /// Resources in the graph, in snapshot order
    pub fn resources(&self) -> impl Iterator<Item = &'a ResourceDescriptor> + '_ {
        self.graph.node_indices().map(move |idx| self.resource_at(idx))
    }

    pub fn resources_of_type(&self, resource_type: &str) -> Vec<&'a ResourceDescriptor> {
        self.resources()
            .filter(|r| r.resource_type.eq_ignore_ascii_case(resource_type))
            .collect()
    }

    /// NSG protecting a subnet, when the subnet's VNet declared one that is in the graph
    pub fn subnet_nsg(&self, subnet_id: &str) -> Option<&'a ResourceDescriptor> {
        self.subnet_nsgs
            .get(&subnet_id.to_ascii_lowercase())
            .and_then(|nsg| self.resource(nsg))
    }

    // ==================== Edge Operations ====================

    /// Targets of `id`'s outgoing edges of one relation
    pub fn outgoing(&self, id: &str, relation: RelationType) -> Vec<&'a ResourceDescriptor> {
        self.neighbors(id, relation, Direction::Outgoing)
    }

    /// Sources of `id`'s incoming edges of one relation
    pub fn incoming(&self, id: &str, relation: RelationType) -> Vec<&'a ResourceDescriptor> {
        self.neighbors(id, relation, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, relation: RelationType, dir: Direction) -> Vec<&'a ResourceDescriptor> {
        let Some(idx) = self.node_index(id) else {
            return vec![];
        };
        let mut out: Vec<(NodeIndex, &'a ResourceDescriptor)> = self
            .graph
            .edges_directed(idx, dir)
            .filter(|e| *e.weight() == relation)
            .map(|e| {
                let other = match dir {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (other, self.resource_at(other))
            })
            .collect();
        // petgraph walks adjacency lists newest-first; report in snapshot order
        out.sort_by_key(|(other, _)| self.graph[*other]);
        out.into_iter().map(|(_, r)| r).collect()
    }

    pub fn has_incoming(&self, id: &str, relation: RelationType) -> bool {
        self.node_index(id).is_some_and(|idx| {
            self.graph
                .edges_directed(idx, Direction::Incoming)
                .any(|e| *e.weight() == relation)
        })
    }

    /// All edges in insertion order
    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.graph
            .edge_references()
            .map(|e| DependencyEdge {
                source_id: self.resource_at(e.source()).id.clone(),
                target_id: self.resource_at(e.target()).id.clone(),
                relation_type: *e.weight(),
            })
            .collect()
    }

    pub fn edges_of(&self, relation: RelationType) -> usize {
        self.graph
            .edge_references()
            .filter(|e| *e.weight() == relation)
            .count()
    }

    // ==================== Graph Metrics ====================

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// References to ids outside the snapshot
    pub fn dangling_references(&self) -> usize {
        self.dangling
    }
}
