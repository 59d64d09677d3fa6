//! Frozen genre graph with per-relationship projections and path queries

use std::collections::{BTreeSet, HashMap, VecDeque};

use petgraph::graphmap::DiGraphMap;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::model::*;

/// Edges of a single relationship type and the genres they touch.
///
/// Neighbor order follows edge insertion order, which the builder keeps sorted
/// by (source, target) so breadth-first ties resolve by id.
#[derive(Debug, Clone)]
pub struct Projection {
    kind: RelationshipType,
    inner: DiGraphMap<GenreId, f64>,
}

impl Projection {
    pub fn new(kind: RelationshipType) -> Self {
        Projection {
            kind,
            inner: DiGraphMap::new(),
        }
    }

    pub(crate) fn add_edge(&mut self, edge: &RelationshipEdge) {
        debug_assert_eq!(edge.kind, self.kind);
        self.inner.add_edge(edge.source, edge.target, edge.weight);
    }

    pub fn kind(&self) -> RelationshipType {
        self.kind
    }

    pub fn contains(&self, id: GenreId) -> bool {
        self.inner.contains_node(id)
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Genres with at least one edge of this type, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = GenreId> + '_ {
        self.inner.nodes()
    }

    pub fn edges(&self) -> impl Iterator<Item = (GenreId, GenreId, f64)> + '_ {
        self.inner.all_edges().map(|(s, t, w)| (s, t, *w))
    }

    pub fn successors(&self, id: GenreId) -> impl Iterator<Item = GenreId> + '_ {
        self.inner.neighbors_directed(id, Direction::Outgoing)
    }

    pub fn predecessors(&self, id: GenreId) -> impl Iterator<Item = GenreId> + '_ {
        self.inner.neighbors_directed(id, Direction::Incoming)
    }

    pub fn in_degree(&self, id: GenreId) -> usize {
        self.predecessors(id).count()
    }

    pub fn out_degree(&self, id: GenreId) -> usize {
        self.successors(id).count()
    }

    /// Breadth-first shortest-path tree rooted at `source`.
    pub fn path_tree(&self, source: GenreId) -> PathTree {
        let mut parents = HashMap::new();
        parents.insert(source, None);

        let mut queue = VecDeque::from([source]);
        while let Some(current) = queue.pop_front() {
            for next in self.successors(current) {
                if !parents.contains_key(&next) {
                    parents.insert(next, Some(current));
                    queue.push_back(next);
                }
            }
        }

        PathTree { source, parents }
    }
}

/// Result of a single-source breadth-first search.
#[derive(Debug, Clone)]
pub struct PathTree {
    source: GenreId,
    parents: HashMap<GenreId, Option<GenreId>>,
}

impl PathTree {
    pub fn source(&self) -> GenreId {
        self.source
    }

    pub fn reaches(&self, target: GenreId) -> bool {
        self.parents.contains_key(&target)
    }

    /// Ordered ids from the source to `target`, both inclusive.
    pub fn path_to(&self, target: GenreId) -> Option<Vec<GenreId>> {
        let mut current = *self.parents.get(&target)?;
        let mut path = vec![target];
        while let Some(node) = current {
            path.push(node);
            current = self.parents.get(&node).copied().flatten();
        }
        path.reverse();
        Some(path)
    }
}

/// Outcome of a path query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Path(Vec<GenreId>),
    NoPath,
}

impl Route {
    pub fn is_found(&self) -> bool {
        matches!(self, Route::Path(_))
    }

    pub fn nodes(&self) -> &[GenreId] {
        match self {
            Route::Path(nodes) => nodes,
            Route::NoPath => &[],
        }
    }
}

/// Node/edge set of an induced subgraph, sorted for stable output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    pub nodes: Vec<GenreId>,
    pub edges: Vec<RelationshipEdge>,
}

impl Subgraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: GenreId) -> bool {
        self.nodes.binary_search(&id).is_ok()
    }
}

/// The genre ontology. Built once by [`crate::GraphBuilder`]; exposes no
/// mutation afterwards, so it can be shared across threads without locking.
pub struct GraphIndex {
    inner: StableDiGraph<GenreNode, RelationshipEdge>,
    index_of: HashMap<GenreId, NodeIndex>,
    by_name: HashMap<String, GenreId>,
    /// All ids, ascending.
    order: Vec<GenreId>,
    projections: HashMap<RelationshipType, Projection>,
    roots: Vec<GenreId>,
}

impl std::fmt::Debug for GraphIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphIndex")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .field("root_count", &self.roots.len())
            .finish()
    }
}

impl GraphIndex {
    pub(crate) fn from_parts(
        inner: StableDiGraph<GenreNode, RelationshipEdge>,
        projections: HashMap<RelationshipType, Projection>,
        roots: Vec<GenreId>,
    ) -> Self {
        let mut index_of = HashMap::with_capacity(inner.node_count());
        let mut by_name = HashMap::with_capacity(inner.node_count());
        for idx in inner.node_indices() {
            let node = &inner[idx];
            index_of.insert(node.id, idx);
            by_name.entry(node.name.clone()).or_insert(node.id);
        }
        let mut order: Vec<GenreId> = index_of.keys().copied().collect();
        order.sort_unstable();

        GraphIndex {
            inner,
            index_of,
            by_name,
            order,
            projections,
            roots,
        }
    }

    /// Get a genre by id.
    pub fn genre(&self, id: GenreId) -> Option<&GenreNode> {
        let idx = *self.index_of.get(&id)?;
        self.inner.node_weight(idx)
    }

    /// Get a genre by exact name.
    pub fn genre_by_name(&self, name: &str) -> Option<&GenreNode> {
        self.by_name.get(name).and_then(|id| self.genre(*id))
    }

    pub fn contains(&self, id: GenreId) -> bool {
        self.index_of.contains_key(&id)
    }

    /// Total number of genres.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Total number of relationships.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over all genres in ascending id order.
    pub fn genres(&self) -> impl Iterator<Item = &GenreNode> {
        self.order.iter().filter_map(move |id| self.genre(*id))
    }

    pub fn ids(&self) -> &[GenreId] {
        &self.order
    }

    /// Iterate over all relationships.
    pub fn edges(&self) -> impl Iterator<Item = &RelationshipEdge> {
        self.inner
            .edge_indices()
            .filter_map(move |idx| self.inner.edge_weight(idx))
    }

    /// Get all outgoing relationships of a genre, any type.
    pub fn edges_from(&self, source: GenreId) -> impl Iterator<Item = &RelationshipEdge> {
        self.index_of.get(&source).into_iter().flat_map(move |&idx| {
            self.inner
                .edges_directed(idx, Direction::Outgoing)
                .map(|edge_ref| edge_ref.weight())
        })
    }

    /// Edges of one relationship type and their endpoints.
    pub fn projection(&self, kind: RelationshipType) -> &Projection {
        // Every type gets a projection at build time, possibly empty.
        &self.projections[&kind]
    }

    /// Genres without an incoming SUBGENRE_OF edge, ascending.
    pub fn roots(&self) -> &[GenreId] {
        &self.roots
    }

    pub fn is_root(&self, id: GenreId) -> bool {
        self.roots.binary_search(&id).is_ok()
    }

    pub fn depth(&self, id: GenreId) -> Option<u32> {
        self.genre(id).and_then(|n| n.depth)
    }

    /// Direct SUBGENRE_OF children of a genre.
    pub fn subgenres(&self, id: GenreId) -> impl Iterator<Item = GenreId> + '_ {
        self.projection(RelationshipType::SubgenreOf).successors(id)
    }

    /// Shortest path from `source` to `target` using only edges of `kind`.
    ///
    /// Unknown ids are an error; a missing route is [`Route::NoPath`].
    pub fn shortest_path(
        &self,
        source: GenreId,
        target: GenreId,
        kind: RelationshipType,
    ) -> Result<Route, GraphError> {
        for id in [source, target] {
            if !self.contains(id) {
                return Err(GraphError::UnknownNode(id));
            }
        }

        let route = self
            .projection(kind)
            .path_tree(source)
            .path_to(target)
            .map_or(Route::NoPath, Route::Path);
        Ok(route)
    }

    /// Induced subgraph over `nodes`, with edges of every type. Unknown ids are
    /// skipped.
    pub fn induced_subgraph(&self, nodes: &BTreeSet<GenreId>) -> Subgraph {
        let known: Vec<GenreId> = nodes
            .iter()
            .copied()
            .filter(|id| self.contains(*id))
            .collect();

        let mut edges: Vec<RelationshipEdge> = known
            .iter()
            .flat_map(|&id| self.edges_from(id))
            .filter(|edge| nodes.contains(&edge.target))
            .copied()
            .collect();
        edges.sort_by(|a, b| (a.source, a.target, a.kind).cmp(&(b.source, b.target, b.kind)));

        Subgraph {
            nodes: known,
            edges,
        }
    }
}
