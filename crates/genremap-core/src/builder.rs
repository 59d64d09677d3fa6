//! One-shot construction of the genre index from a store snapshot

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use crate::config::{round_to, GenreMapConfig};
use crate::error::BuildError;
use crate::graph::{GraphIndex, Projection};
use crate::model::*;
use crate::store::{GenreStore, Snapshot};

/// Global min/max of the raw genre values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueBounds {
    pub bouncy: (f64, f64),
    pub organic: (f64, f64),
}

impl ValueBounds {
    /// Per-axis bounds over every finite raw value, so a genre carrying only
    /// one value still widens that axis. `None` unless some record carries both.
    pub fn from_records(records: &[GenreRecord]) -> Option<Self> {
        records.iter().find_map(raw_pair)?;
        Some(ValueBounds {
            bouncy: axis_bounds(records.iter().filter_map(|r| r.bouncy_value))?,
            organic: axis_bounds(records.iter().filter_map(|r| r.organic_value))?,
        })
    }

    /// Normalized (bouncy, organic) for a record, or `None` if either value is missing.
    pub fn normalize(&self, record: &GenreRecord, precision: u32) -> Option<(f64, f64)> {
        let (b, o) = raw_pair(record)?;
        Some((
            normalize_axis(b, self.bouncy, precision),
            normalize_axis(o, self.organic, precision),
        ))
    }
}

fn raw_pair(record: &GenreRecord) -> Option<(f64, f64)> {
    match (record.bouncy_value, record.organic_value) {
        (Some(b), Some(o)) if b.is_finite() && o.is_finite() => Some((b, o)),
        _ => None,
    }
}

fn axis_bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |bounds, v| match bounds {
            None => Some((v, v)),
            Some((min, max)) => Some((v.min(min), v.max(max))),
        })
}

fn normalize_axis(value: f64, (min, max): (f64, f64), precision: u32) -> f64 {
    let range = max - min;
    if range <= 0.0 {
        return 0.5;
    }
    round_to((value - min) / range, precision)
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Builds a [`GraphIndex`] from a snapshot. Runs once per process.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    precision: u32,
}

impl GraphBuilder {
    pub fn new(precision: u32) -> Self {
        GraphBuilder { precision }
    }

    pub fn from_config(config: &GenreMapConfig) -> Self {
        Self::new(config.decimal_precision)
    }

    /// Pull the snapshot from `store` and build.
    pub fn build_from_store<S: GenreStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<GraphIndex, BuildError> {
        let snapshot = store.snapshot()?;
        self.build(&snapshot)
    }

    pub fn build(&self, snapshot: &Snapshot) -> Result<GraphIndex, BuildError> {
        if snapshot.is_empty() {
            return Err(BuildError::EmptySnapshot);
        }
        let bounds =
            ValueBounds::from_records(&snapshot.genres).ok_or(BuildError::NoNormalizationValues)?;
        tracing::debug!("Normalization bounds: {:?}", bounds);

        let mut graph: StableDiGraph<GenreNode, RelationshipEdge> = StableDiGraph::new();
        let mut index_of: HashMap<GenreId, NodeIndex> = HashMap::new();

        for record in &snapshot.genres {
            if index_of.contains_key(&record.id) {
                return Err(BuildError::DuplicateGenre(record.id));
            }
            let normalized = bounds.normalize(record, self.precision);
            let node = GenreNode {
                id: record.id,
                name: record.name.clone(),
                description: record.description.clone(),
                bouncy_value: normalized.map(|(b, _)| b),
                organic_value: normalized.map(|(_, o)| o),
                depth: None,
                has_subgenre: false,
                is_spotify_genre: normalized.is_some(),
            };
            index_of.insert(record.id, graph.add_node(node));
        }

        let edges = self.collect_edges(snapshot, &graph, &index_of);
        for edge in &edges {
            graph.add_edge(index_of[&edge.source], index_of[&edge.target], *edge);
        }

        let projections = build_projections(&edges);
        let subgenres = &projections[&RelationshipType::SubgenreOf];

        let mut roots: Vec<GenreId> = subgenres
            .nodes()
            .filter(|id| subgenres.in_degree(*id) == 0)
            .collect();
        roots.sort_unstable();

        let depths = assign_depths(subgenres, &roots);
        for (id, &idx) in &index_of {
            let node = &mut graph[idx];
            node.depth = depths.get(id).copied();
            node.has_subgenre = subgenres.out_degree(*id) > 0;
        }

        tracing::info!(
            "Built genre graph: {} genres, {} relationships, {} roots",
            graph.node_count(),
            graph.edge_count(),
            roots.len()
        );

        Ok(GraphIndex::from_parts(graph, projections, roots))
    }

    /// Turn relationship records into parent → child edges, dropping records
    /// that reference unknown genres, point at themselves, or repeat.
    fn collect_edges(
        &self,
        snapshot: &Snapshot,
        graph: &StableDiGraph<GenreNode, RelationshipEdge>,
        index_of: &HashMap<GenreId, NodeIndex>,
    ) -> Vec<RelationshipEdge> {
        let mut seen = HashSet::new();
        let mut edges = Vec::with_capacity(snapshot.relationships.len());

        for record in &snapshot.relationships {
            let source = record.genre2_id;
            let target = record.genre1_id;
            let kind = record.relationship_type;

            let (Some(&s_idx), Some(&t_idx)) = (index_of.get(&source), index_of.get(&target))
            else {
                tracing::warn!(
                    "Dropping {} relationship {} -> {}: unknown genre",
                    kind,
                    source,
                    target
                );
                continue;
            };
            if source == target {
                tracing::warn!("Dropping {} self-relationship on {}", kind, source);
                continue;
            }
            if !seen.insert((source, target, kind)) {
                tracing::debug!("Skipping duplicate {} relationship {} -> {}", kind, source, target);
                continue;
            }

            let weight = match (graph[s_idx].position(), graph[t_idx].position()) {
                (Some(a), Some(b)) => distance(a, b),
                _ => 0.0,
            };
            edges.push(RelationshipEdge {
                source,
                target,
                kind,
                weight,
            });
        }

        edges
    }
}

fn build_projections(edges: &[RelationshipEdge]) -> HashMap<RelationshipType, Projection> {
    let mut sorted: Vec<&RelationshipEdge> = edges.iter().collect();
    sorted.sort_by_key(|e| (e.source, e.target));

    let mut projections: HashMap<RelationshipType, Projection> = RelationshipType::ALL
        .into_iter()
        .map(|kind| (kind, Projection::new(kind)))
        .collect();
    for edge in sorted {
        if let Some(projection) = projections.get_mut(&edge.kind) {
            projection.add_edge(edge);
        }
    }

    for projection in projections.values() {
        tracing::debug!(
            "{} projection: {} genres, {} edges",
            projection.kind(),
            projection.node_count(),
            projection.edge_count()
        );
    }
    projections
}

/// Multi-source BFS seeded with every root at depth 0. The first wavefront to
/// reach a genre fixes its depth, which is its minimum distance to any root.
fn assign_depths(subgenres: &Projection, roots: &[GenreId]) -> HashMap<GenreId, u32> {
    let mut depths: HashMap<GenreId, u32> = HashMap::new();
    let mut queue = VecDeque::new();
    for &root in roots {
        depths.insert(root, 0);
        queue.push_back(root);
    }

    while let Some(current) = queue.pop_front() {
        let next_depth = depths[&current] + 1;
        for child in subgenres.successors(current) {
            if !depths.contains_key(&child) {
                depths.insert(child, next_depth);
                queue.push_back(child);
            }
        }
    }

    depths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{genre, rel, spotify_genre};

    #[test]
    fn test_normalization_uses_global_bounds() {
        let snapshot = Snapshot::new(
            vec![
                spotify_genre(1, "a", 10.0, 100.0),
                spotify_genre(2, "b", 20.0, 300.0),
                spotify_genre(3, "c", 15.0, 200.0),
            ],
            vec![],
        );
        let index = GraphBuilder::new(6).build(&snapshot).unwrap();

        let c = index.genre(GenreId(3)).unwrap();
        assert_eq!(c.bouncy_value, Some(0.5));
        assert_eq!(c.organic_value, Some(0.5));
        assert_eq!(index.genre(GenreId(1)).unwrap().position(), Some((0.0, 0.0)));
        assert_eq!(index.genre(GenreId(2)).unwrap().position(), Some((1.0, 1.0)));
    }

    #[test]
    fn test_half_values_left_null_together() {
        let mut partial = genre(3, "partial");
        partial.bouncy_value = Some(12.0);
        let snapshot = Snapshot::new(
            vec![
                spotify_genre(1, "a", 10.0, 100.0),
                spotify_genre(2, "b", 20.0, 300.0),
                partial,
            ],
            vec![],
        );
        let index = GraphBuilder::new(6).build(&snapshot).unwrap();

        let node = index.genre(GenreId(3)).unwrap();
        assert_eq!(node.bouncy_value, None);
        assert_eq!(node.organic_value, None);
        assert!(!node.is_spotify_genre);
        assert!(index.genre(GenreId(1)).unwrap().is_spotify_genre);
    }

    #[test]
    fn test_single_axis_value_widens_bounds() {
        let mut bouncy_only = genre(3, "bouncy only");
        bouncy_only.bouncy_value = Some(40.0);
        let snapshot = Snapshot::new(
            vec![
                spotify_genre(1, "a", 10.0, 100.0),
                spotify_genre(2, "b", 20.0, 300.0),
                bouncy_only,
            ],
            vec![],
        );
        let index = GraphBuilder::new(6).build(&snapshot).unwrap();

        let b = index.genre(GenreId(2)).unwrap();
        assert_eq!(b.bouncy_value, Some(0.333333));
        assert_eq!(b.organic_value, Some(1.0));
        assert_eq!(index.genre(GenreId(3)).unwrap().position(), None);
    }

    #[test]
    fn test_single_axis_values_alone_fail() {
        let mut bouncy_only = genre(1, "bouncy only");
        bouncy_only.bouncy_value = Some(1.0);
        let mut organic_only = genre(2, "organic only");
        organic_only.organic_value = Some(2.0);
        let snapshot = Snapshot::new(vec![bouncy_only, organic_only], vec![]);
        let err = GraphBuilder::new(6).build(&snapshot).unwrap_err();
        assert!(matches!(err, BuildError::NoNormalizationValues));
    }

    #[test]
    fn test_normalization_rounds_to_precision() {
        let snapshot = Snapshot::new(
            vec![
                spotify_genre(1, "a", 0.0, 0.0),
                spotify_genre(2, "b", 3.0, 3.0),
                spotify_genre(3, "c", 1.0, 2.0),
            ],
            vec![],
        );
        let index = GraphBuilder::new(2).build(&snapshot).unwrap();
        assert_eq!(index.genre(GenreId(3)).unwrap().position(), Some((0.33, 0.67)));
    }

    #[test]
    fn test_single_valued_genre_normalizes_to_center() {
        let snapshot = Snapshot::new(vec![spotify_genre(1, "only", 7.0, 7.0)], vec![]);
        let index = GraphBuilder::new(6).build(&snapshot).unwrap();
        assert_eq!(index.genre(GenreId(1)).unwrap().position(), Some((0.5, 0.5)));
    }

    #[test]
    fn test_empty_snapshot_fails() {
        let err = GraphBuilder::new(6).build(&Snapshot::default()).unwrap_err();
        assert!(matches!(err, BuildError::EmptySnapshot));
    }

    #[test]
    fn test_duplicate_genre_fails() {
        let snapshot = Snapshot::new(
            vec![spotify_genre(1, "a", 1.0, 1.0), genre(1, "again")],
            vec![],
        );
        let err = GraphBuilder::new(6).build(&snapshot).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateGenre(GenreId(1))));
    }

    #[test]
    fn test_edges_point_parent_to_child_with_weight() {
        let snapshot = Snapshot::new(
            vec![
                spotify_genre(1, "rock", 0.0, 0.0),
                spotify_genre(2, "punk", 3.0, 4.0),
                genre(3, "unmeasured"),
            ],
            vec![
                rel(2, 1, RelationshipType::SubgenreOf),
                rel(3, 1, RelationshipType::SubgenreOf),
            ],
        );
        let index = GraphBuilder::new(6).build(&snapshot).unwrap();

        let edges: Vec<_> = index.edges_from(GenreId(1)).collect();
        assert_eq!(edges.len(), 2);
        let to_punk = edges.iter().find(|e| e.target == GenreId(2)).unwrap();
        assert_eq!(to_punk.kind, RelationshipType::SubgenreOf);
        assert!((to_punk.weight - 2f64.sqrt()).abs() < 1e-9);
        let to_unmeasured = edges.iter().find(|e| e.target == GenreId(3)).unwrap();
        assert_eq!(to_unmeasured.weight, 0.0);
    }

    #[test]
    fn test_drops_unknown_self_and_duplicate_edges() {
        let snapshot = Snapshot::new(
            vec![spotify_genre(1, "a", 0.0, 0.0), spotify_genre(2, "b", 1.0, 1.0)],
            vec![
                rel(2, 1, RelationshipType::SubgenreOf),
                rel(2, 1, RelationshipType::SubgenreOf),
                rel(2, 99, RelationshipType::SubgenreOf),
                rel(1, 1, RelationshipType::FusionOf),
                rel(2, 1, RelationshipType::InfluencedBy),
            ],
        );
        let index = GraphBuilder::new(6).build(&snapshot).unwrap();
        assert_eq!(index.edge_count(), 2);
        assert_eq!(index.projection(RelationshipType::FusionOf).node_count(), 0);
    }

    #[test]
    fn test_depth_takes_minimum_over_roots() {
        // 1 -> 2 -> 3 -> 4 and 5 -> 4: genre 4 is one hop from root 5.
        let snapshot = Snapshot::new(
            (1..=5)
                .map(|i| spotify_genre(i, &format!("g{i}"), i as f64, i as f64))
                .collect(),
            vec![
                rel(2, 1, RelationshipType::SubgenreOf),
                rel(3, 2, RelationshipType::SubgenreOf),
                rel(4, 3, RelationshipType::SubgenreOf),
                rel(4, 5, RelationshipType::SubgenreOf),
            ],
        );
        let index = GraphBuilder::new(6).build(&snapshot).unwrap();

        assert_eq!(index.roots(), &[GenreId(1), GenreId(5)]);
        assert_eq!(index.depth(GenreId(1)), Some(0));
        assert_eq!(index.depth(GenreId(5)), Some(0));
        assert_eq!(index.depth(GenreId(3)), Some(2));
        assert_eq!(index.depth(GenreId(4)), Some(1));
    }

    #[test]
    fn test_genre_outside_hierarchy_has_no_depth() {
        let snapshot = Snapshot::new(
            vec![
                spotify_genre(1, "a", 0.0, 0.0),
                spotify_genre(2, "b", 1.0, 1.0),
                spotify_genre(3, "c", 2.0, 2.0),
            ],
            vec![
                rel(2, 1, RelationshipType::SubgenreOf),
                rel(3, 2, RelationshipType::InfluencedBy),
            ],
        );
        let index = GraphBuilder::new(6).build(&snapshot).unwrap();

        assert_eq!(index.depth(GenreId(3)), None);
        assert!(!index.is_root(GenreId(3)));
        assert!(index.genre(GenreId(1)).unwrap().has_subgenre);
        assert!(!index.genre(GenreId(2)).unwrap().has_subgenre);
    }
}
