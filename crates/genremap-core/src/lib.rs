//! genremap core — genre ontology graph, per-session views, and layout

pub mod model;
pub mod error;
pub mod config;
pub mod store;
pub mod builder;
pub mod graph;
pub mod selection;
pub mod view;
pub mod layout;
pub mod assemble;
pub mod shared;


#[cfg(test)]
pub mod test_utils;

pub use model::{GenreId, RelationshipType, GenreNode, RelationshipEdge, GenreRecord, RelationshipRecord};
pub use error::{BuildError, GraphError, StoreError, ConfigError};
pub use config::{GenreMapConfig, LayoutConfig, ViewLimits, PrunePolicy, round_to};
pub use store::{GenreStore, Snapshot, JsonSnapshotStore};
pub use builder::GraphBuilder;
pub use graph::{GraphIndex, Projection, PathTree, Route, Subgraph};
pub use selection::{SelectionState, GraphAction, ActionKind, GraphUpdate};
pub use view::{ViewComposer, ComposedView, ViewStats};
pub use layout::{LayoutEngine, Layout, Coordinate, normalize_positions};
pub use assemble::{ViewAssembler, SessionView, GenreData, GenreGraphData, GenreSummary, RelationshipSummary};
pub use shared::SharedIndex;
