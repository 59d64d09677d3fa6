//! Core data structures for the genre ontology

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable genre identifier assigned by the persistence layer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct GenreId(pub i64);

impl fmt::Display for GenreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GenreId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(GenreId)
    }
}

/// What kind of relationship an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    /// Parent → child in the genre hierarchy.
    SubgenreOf,
    InfluencedBy,
    FusionOf,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 3] = [
        RelationshipType::SubgenreOf,
        RelationshipType::InfluencedBy,
        RelationshipType::FusionOf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::SubgenreOf => "SUBGENRE_OF",
            RelationshipType::InfluencedBy => "INFLUENCED_BY",
            RelationshipType::FusionOf => "FUSION_OF",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = String;

    /// Accepts the wire form (`SUBGENRE_OF`) as well as kebab/lower case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SUBGENRE_OF" => Ok(RelationshipType::SubgenreOf),
            "INFLUENCED_BY" => Ok(RelationshipType::InfluencedBy),
            "FUSION_OF" => Ok(RelationshipType::FusionOf),
            other => Err(format!("unknown relationship type: {other}")),
        }
    }
}

/// A single genre in the ontology graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreNode {
    pub id: GenreId,
    pub name: String,
    pub description: Option<String>,
    /// Normalized into [0, 1]; `None` together with `organic_value`.
    pub bouncy_value: Option<f64>,
    pub organic_value: Option<f64>,
    /// Distance from the nearest root via SUBGENRE_OF edges.
    pub depth: Option<u32>,
    pub has_subgenre: bool,
    pub is_spotify_genre: bool,
}

impl GenreNode {
    /// The normalized (bouncy, organic) vector, if both values are present.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.bouncy_value, self.organic_value) {
            (Some(b), Some(o)) => Some((b, o)),
            _ => None,
        }
    }
}

/// A directed edge in the genre graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RelationshipEdge {
    pub source: GenreId,
    pub target: GenreId,
    pub kind: RelationshipType,
    /// Euclidean distance between the endpoints' normalized vectors, 0 when
    /// either endpoint has none.
    pub weight: f64,
}

/// Genre row as supplied by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreRecord {
    pub id: GenreId,
    pub name: String,
    #[serde(default)]
    pub normalized_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bouncy_value: Option<f64>,
    #[serde(default)]
    pub organic_value: Option<f64>,
}

/// Relationship row as supplied by the store.
///
/// `genre2` is the broader term, `genre1` the specific one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RelationshipRecord {
    pub genre1_id: GenreId,
    pub genre2_id: GenreId,
    pub relationship_type: RelationshipType,
}
