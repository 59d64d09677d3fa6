//! Per-session view composition: which genres a client should see
//!
//! The visible set always connects the ontology roots down to every selected
//! or expanded genre, opens one level below each expanded genre, and stitches
//! requested genres to one another through their shared hierarchy.

use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{PrunePolicy, ViewLimits};
use crate::graph::{GraphIndex, Projection, Subgraph};
use crate::model::{GenreId, RelationshipType};
use crate::selection::SelectionState;

/// Bookkeeping about how a view was composed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewStats {
    /// Requested ids the index does not know; ignored.
    pub stale: Vec<GenreId>,
    /// Genres contributed only by stitching requested genres together.
    pub stitched_only: Vec<GenreId>,
    /// Genres removed by the prune policy.
    pub pruned: Vec<GenreId>,
    /// Stitching was skipped because too many genres were requested.
    pub stitching_skipped: bool,
}

/// The induced subgraph a session should render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedView {
    pub subgraph: Subgraph,
    pub stats: ViewStats,
}

impl ComposedView {
    pub fn nodes(&self) -> &[GenreId] {
        &self.subgraph.nodes
    }
}

/// Computes views against a shared, read-only index. Every call allocates its
/// own working sets, so one composer can serve many threads at once.
#[derive(Debug, Clone, Copy)]
pub struct ViewComposer<'a> {
    index: &'a GraphIndex,
    limits: &'a ViewLimits,
}

impl<'a> ViewComposer<'a> {
    pub fn new(index: &'a GraphIndex, limits: &'a ViewLimits) -> Self {
        ViewComposer { index, limits }
    }

    /// Induced subgraph over every genre in the index.
    pub fn entire(&self) -> ComposedView {
        let all: BTreeSet<GenreId> = self.index.ids().iter().copied().collect();
        ComposedView {
            subgraph: self.index.induced_subgraph(&all),
            stats: ViewStats::default(),
        }
    }

    pub fn compose(&self, state: &SelectionState) -> ComposedView {
        let (visible, stats) = self.visible_set(state);
        let subgraph = self.index.induced_subgraph(&visible);

        tracing::debug!(
            "Composed view: {} genres, {} relationships ({} stale, {} pruned)",
            subgraph.nodes.len(),
            subgraph.edges.len(),
            stats.stale.len(),
            stats.pruned.len()
        );
        ComposedView { subgraph, stats }
    }

    /// The visible genre set for `state`, before taking the induced subgraph.
    pub fn visible_set(&self, state: &SelectionState) -> (BTreeSet<GenreId>, ViewStats) {
        let index = self.index;
        let hierarchy = index.projection(RelationshipType::SubgenreOf);
        let mut stats = ViewStats {
            stale: state.stale_ids(index),
            ..ViewStats::default()
        };
        if !stats.stale.is_empty() {
            tracing::warn!("Ignoring unknown genre ids in selection: {:?}", stats.stale);
        }

        let selected: BTreeSet<GenreId> = known(index, &state.selected);
        let expanded: BTreeSet<GenreId> = known(index, &state.expanded);
        let highlight = state.highlight.filter(|id| index.contains(*id));
        let requested: BTreeSet<GenreId> = selected.union(&expanded).copied().collect();

        // Roots plus everything the session asked for.
        let mut required: BTreeSet<GenreId> = index.roots().iter().copied().collect();
        required.extend(requested.iter().copied());

        // Shortest paths from every root down to the highlight and to every
        // selected or expanded genre.
        let mut root_targets = requested.clone();
        root_targets.extend(highlight);
        required.extend(paths_from(hierarchy, index.roots(), &root_targets));

        // One level below each expanded genre.
        for &id in &expanded {
            required.extend(hierarchy.successors(id));
        }

        // Paths between requested genres. Paths starting at a root are already
        // covered above and nothing can reach a root, so only requested
        // genres inside the hierarchy need to act as sources or targets.
        let stitch: Vec<GenreId> = requested
            .iter()
            .copied()
            .filter(|id| hierarchy.contains(*id) && !index.is_root(*id))
            .collect();
        let stitched = if stitch.len() > self.limits.max_pairwise_sources {
            tracing::warn!(
                "Skipping pairwise stitching: {} requested genres exceed limit of {}",
                stitch.len(),
                self.limits.max_pairwise_sources
            );
            stats.stitching_skipped = true;
            BTreeSet::new()
        } else {
            let targets: BTreeSet<GenreId> = stitch.iter().copied().collect();
            paths_from(hierarchy, &stitch, &targets)
        };

        stats.stitched_only = stitched.difference(&required).copied().collect();
        let visible = match self.limits.prune {
            PrunePolicy::Disabled => {
                let mut visible = required;
                visible.extend(stitched);
                visible
            }
            PrunePolicy::StitchedDescendants => {
                let collapsed: Vec<GenreId> = stitch
                    .iter()
                    .copied()
                    .filter(|id| !expanded.contains(id))
                    .collect();
                let below = descendants_of(hierarchy, &collapsed, &stats.stitched_only);
                stats.pruned = stats
                    .stitched_only
                    .iter()
                    .copied()
                    .filter(|id| below.contains(id))
                    .collect();
                let mut visible = required;
                visible.extend(stitched.into_iter().filter(|id| !below.contains(id)));
                visible
            }
        };

        (visible, stats)
    }
}

fn known(index: &GraphIndex, ids: &BTreeSet<GenreId>) -> BTreeSet<GenreId> {
    ids.iter().copied().filter(|id| index.contains(*id)).collect()
}

/// The members of `candidates` that lie strictly below any of `sources`.
fn descendants_of(
    projection: &Projection,
    sources: &[GenreId],
    candidates: &[GenreId],
) -> BTreeSet<GenreId> {
    if candidates.is_empty() {
        return BTreeSet::new();
    }

    sources
        .par_iter()
        .filter(|source| projection.contains(**source))
        .flat_map_iter(|&source| {
            let tree = projection.path_tree(source);
            candidates
                .iter()
                .copied()
                .filter(|&id| id != source && tree.reaches(id))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Union of the nodes on the shortest path from each source to each target.
/// One breadth-first search per source, run in parallel.
fn paths_from(
    projection: &Projection,
    sources: &[GenreId],
    targets: &BTreeSet<GenreId>,
) -> BTreeSet<GenreId> {
    if targets.is_empty() {
        return BTreeSet::new();
    }

    sources
        .par_iter()
        .filter(|source| projection.contains(**source))
        .flat_map_iter(|&source| {
            let tree = projection.path_tree(source);
            targets
                .iter()
                .filter_map(|&target| tree.path_to(target))
                .flatten()
                .collect::<Vec<_>>()
        })
        .collect()
}
