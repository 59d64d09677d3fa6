//! Serializable session responses built from a composed view and its layout

use serde::{Deserialize, Serialize};

use crate::config::round_to;
use crate::graph::GraphIndex;
use crate::layout::Layout;
use crate::model::{GenreId, GenreNode, RelationshipEdge, RelationshipType};
use crate::selection::SelectionState;
use crate::view::ComposedView;

/// What the client needs to render one genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreSummary {
    pub id: GenreId,
    pub name: String,
    pub description: Option<String>,
    pub has_subgenre: bool,
    pub is_selectable: bool,
    pub bouncyness: Option<f64>,
    pub organicness: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipSummary {
    pub source: GenreId,
    pub target: GenreId,
    #[serde(rename = "type")]
    pub kind: RelationshipType,
}

impl From<&RelationshipEdge> for RelationshipSummary {
    fn from(edge: &RelationshipEdge) -> Self {
        RelationshipSummary {
            source: edge.source,
            target: edge.target,
            kind: edge.kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreData {
    pub genres: Vec<GenreSummary>,
    pub state: SelectionState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreGraphData {
    pub relationships: Vec<RelationshipSummary>,
    pub layout: Layout,
}

/// Complete, self-consistent response for one session request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub genre_data: GenreData,
    pub graph: GenreGraphData,
}

#[derive(Debug, Clone, Copy)]
pub struct ViewAssembler {
    precision: u32,
}

impl ViewAssembler {
    pub fn new(precision: u32) -> Self {
        ViewAssembler { precision }
    }

    pub fn summarize(&self, genre: &GenreNode) -> GenreSummary {
        GenreSummary {
            id: genre.id,
            name: genre.name.clone(),
            description: genre.description.clone(),
            has_subgenre: genre.has_subgenre,
            is_selectable: genre.is_spotify_genre,
            bouncyness: genre.bouncy_value.map(|v| round_to(v, self.precision)),
            organicness: genre.organic_value.map(|v| round_to(v, self.precision)),
        }
    }

    pub fn assemble(
        &self,
        index: &GraphIndex,
        view: &ComposedView,
        layout: &Layout,
        state: &SelectionState,
    ) -> SessionView {
        let genres = view
            .subgraph
            .nodes
            .iter()
            .filter_map(|id| index.genre(*id))
            .map(|genre| self.summarize(genre))
            .collect();
        let relationships = view
            .subgraph
            .edges
            .iter()
            .map(RelationshipSummary::from)
            .collect();

        SessionView {
            genre_data: GenreData {
                genres,
                state: state.clone(),
            },
            graph: GenreGraphData {
                relationships,
                layout: layout.clone(),
            },
        }
    }
}
