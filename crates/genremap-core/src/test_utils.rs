//! Test fixtures for genre snapshots and indexes

use crate::builder::GraphBuilder;
use crate::graph::GraphIndex;
use crate::model::*;
use crate::store::Snapshot;

/// A genre record without bouncy/organic values.
pub fn genre(id: i64, name: &str) -> GenreRecord {
    GenreRecord {
        id: GenreId(id),
        name: name.to_string(),
        normalized_name: Some(name.to_lowercase()),
        description: None,
        bouncy_value: None,
        organic_value: None,
    }
}

/// A genre record carrying both raw values.
pub fn spotify_genre(id: i64, name: &str, bouncy: f64, organic: f64) -> GenreRecord {
    GenreRecord {
        bouncy_value: Some(bouncy),
        organic_value: Some(organic),
        ..genre(id, name)
    }
}

/// Store row: `genre1` is the specific genre, `genre2` the broader one.
pub fn rel(genre1: i64, genre2: i64, kind: RelationshipType) -> RelationshipRecord {
    RelationshipRecord {
        genre1_id: GenreId(genre1),
        genre2_id: GenreId(genre2),
        relationship_type: kind,
    }
}

pub fn edge(source: i64, target: i64, kind: RelationshipType) -> RelationshipEdge {
    RelationshipEdge {
        source: GenreId(source),
        target: GenreId(target),
        kind,
        weight: 0.0,
    }
}

/// Genres `1..=n`, all measurable, with parent → child SUBGENRE_OF `edges`.
pub fn hierarchy_snapshot(n: i64, edges: &[(i64, i64)]) -> Snapshot {
    let genres = (1..=n)
        .map(|i| spotify_genre(i, &format!("genre {i}"), i as f64, (n - i) as f64))
        .collect();
    let relationships = edges
        .iter()
        .map(|&(parent, child)| rel(child, parent, RelationshipType::SubgenreOf))
        .collect();
    Snapshot::new(genres, relationships)
}

pub fn build(snapshot: &Snapshot) -> GraphIndex {
    GraphBuilder::new(6).build(snapshot).unwrap()
}

/// `1 -> 2 -> 3` over SUBGENRE_OF.
pub fn chain_index() -> GraphIndex {
    build(&hierarchy_snapshot(3, &[(1, 2), (2, 3)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_snapshot_orientation() {
        let snapshot = hierarchy_snapshot(2, &[(1, 2)]);
        assert_eq!(snapshot.genres.len(), 2);
        assert_eq!(snapshot.relationships[0].genre2_id, GenreId(1));
        assert_eq!(snapshot.relationships[0].genre1_id, GenreId(2));
    }
}
