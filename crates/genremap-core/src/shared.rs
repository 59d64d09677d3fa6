//! Publish-once handle to the index shared by every request handler

use std::sync::Arc;

use crate::assemble::{SessionView, ViewAssembler};
use crate::builder::GraphBuilder;
use crate::config::GenreMapConfig;
use crate::error::BuildError;
use crate::graph::GraphIndex;
use crate::layout::LayoutEngine;
use crate::selection::{GraphUpdate, SelectionState};
use crate::store::GenreStore;
use crate::view::{ComposedView, ViewComposer};

/// Cheap to clone; all clones read the same frozen index without locking.
/// A rebuild means constructing a new handle, never mutating this one.
#[derive(Debug, Clone)]
pub struct SharedIndex {
    index: Arc<GraphIndex>,
    config: Arc<GenreMapConfig>,
}

impl SharedIndex {
    pub fn new(index: GraphIndex, config: GenreMapConfig) -> Self {
        SharedIndex {
            index: Arc::new(index),
            config: Arc::new(config),
        }
    }

    /// Build from the store snapshot and publish.
    pub fn build<S: GenreStore + ?Sized>(
        store: &S,
        config: GenreMapConfig,
    ) -> Result<Self, BuildError> {
        let index = GraphBuilder::from_config(&config).build_from_store(store)?;
        Ok(Self::new(index, config))
    }

    pub fn index(&self) -> &GraphIndex {
        &self.index
    }

    pub fn config(&self) -> &GenreMapConfig {
        &self.config
    }

    pub fn composer(&self) -> ViewComposer<'_> {
        ViewComposer::new(&self.index, &self.config.view)
    }

    /// Compose, lay out, and assemble the view for `state`.
    pub fn render(&self, state: &SelectionState) -> SessionView {
        let view = self.composer().compose(state);
        self.finish(&view, state)
    }

    /// The whole ontology in one view.
    pub fn render_entire(&self) -> SessionView {
        let view = self.composer().entire();
        self.finish(&view, &SelectionState::default())
    }

    /// Apply a client update to `state`, then render it. Returns `None` and
    /// leaves `state` untouched when the update names an unknown genre.
    pub fn update(&self, state: &mut SelectionState, update: &GraphUpdate) -> Option<SessionView> {
        update
            .apply_to(state, &self.index)
            .then(|| self.render(state))
    }

    fn finish(&self, view: &ComposedView, state: &SelectionState) -> SessionView {
        let layout = LayoutEngine::from_config(&self.config).layout(&view.subgraph);
        ViewAssembler::new(self.config.decimal_precision).assemble(&self.index, view, &layout, state)
    }
}
