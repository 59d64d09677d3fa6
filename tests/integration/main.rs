//! Integration tests for genremap
//!
//! These tests drive the store, index, composer, layout, and assembler together
//! through the public API and the CLI binary.

use genremap_core::{
    ActionKind, GenreId, GenreMapConfig, GraphUpdate, JsonSnapshotStore, RelationshipType,
    SelectionState, SessionView, SharedIndex,
};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const SNAPSHOT: &str = r#"{
  "genres": [
    {"id": 1, "name": "rock", "bouncy_value": 4.0, "organic_value": 6.0},
    {"id": 2, "name": "punk rock", "bouncy_value": 7.0, "organic_value": 3.0},
    {"id": 3, "name": "hardcore punk", "bouncy_value": 9.0, "organic_value": 1.0},
    {"id": 4, "name": "electronic", "description": "made with machines"},
    {"id": 5, "name": "techno", "bouncy_value": 8.0, "organic_value": 0.0},
    {"id": 6, "name": "industrial", "bouncy_value": 2.0, "organic_value": 2.0}
  ],
  "relationships": [
    {"genre1_id": 2, "genre2_id": 1, "relationship_type": "SUBGENRE_OF"},
    {"genre1_id": 3, "genre2_id": 2, "relationship_type": "SUBGENRE_OF"},
    {"genre1_id": 5, "genre2_id": 4, "relationship_type": "SUBGENRE_OF"},
    {"genre1_id": 6, "genre2_id": 3, "relationship_type": "INFLUENCED_BY"},
    {"genre1_id": 6, "genre2_id": 5, "relationship_type": "FUSION_OF"},
    {"genre1_id": 6, "genre2_id": 99, "relationship_type": "FUSION_OF"}
  ]
}"#;

fn write_snapshot(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("genres.json");
    std::fs::write(&path, SNAPSHOT).unwrap();
    path
}

fn load(path: &Path) -> SharedIndex {
    SharedIndex::build(&JsonSnapshotStore::new(path), GenreMapConfig::default()).unwrap()
}

fn view_ids(view: &SessionView) -> Vec<i64> {
    view.genre_data.genres.iter().map(|g| g.id.0).collect()
}

#[test]
fn test_build_from_json_snapshot() {
    let dir = TempDir::new().unwrap();
    let shared = load(&write_snapshot(&dir));
    let index = shared.index();

    assert_eq!(index.node_count(), 6);
    // The relationship pointing at genre 99 is dropped.
    assert_eq!(index.edge_count(), 5);
    assert_eq!(index.roots(), vec![GenreId(1), GenreId(4)]);
    assert_eq!(index.depth(GenreId(3)), Some(2));
    assert_eq!(index.depth(GenreId(6)), None);

    let electronic = index.genre_by_name("electronic").unwrap();
    assert!(electronic.has_subgenre);
    assert!(!electronic.is_spotify_genre);
    assert_eq!(electronic.description.as_deref(), Some("made with machines"));

    let hardcore = index.genre(GenreId(3)).unwrap();
    assert_eq!(hardcore.bouncy_value, Some(1.0));
    assert_eq!(hardcore.organic_value, Some(0.166667));
}

#[test]
fn test_session_flow() {
    let dir = TempDir::new().unwrap();
    let shared = load(&write_snapshot(&dir));
    let mut state = SelectionState::new();

    let view = shared.update(
        &mut state,
        &GraphUpdate::new(ActionKind::Expand).with_name("rock"),
    )
    .unwrap();
    assert_eq!(view_ids(&view), vec![1, 2, 4]);

    let view = shared.update(
        &mut state,
        &GraphUpdate::new(ActionKind::Select).with_id(GenreId(3)),
    )
    .unwrap();
    assert_eq!(view_ids(&view), vec![1, 2, 3, 4]);
    assert_eq!(view.genre_data.state, state);

    let view = shared.update(
        &mut state,
        &GraphUpdate::new(ActionKind::Select).with_name("industrial"),
    )
    .unwrap();
    // Industrial is linked only by influence and fusion; it joins the view but
    // brings no hierarchy ancestors along.
    assert!(view_ids(&view).contains(&6));
    assert!(view
        .graph
        .relationships
        .iter()
        .any(|r| r.kind == RelationshipType::InfluencedBy && r.source == GenreId(3)));

    for summary in &view.genre_data.genres {
        let coordinate = view.graph.layout[&summary.id];
        assert!((0.0..=1.0).contains(&coordinate.x));
        assert!((0.0..=1.0).contains(&coordinate.y));
    }

    let view = shared
        .update(&mut state, &GraphUpdate::new(ActionKind::Reset))
        .unwrap();
    assert!(state.is_empty());
    assert_eq!(view_ids(&view), vec![1, 4]);
}

#[test]
fn test_unknown_genre_in_state_is_ignored() {
    let dir = TempDir::new().unwrap();
    let shared = load(&write_snapshot(&dir));
    let state = SelectionState::new().with_selected([GenreId(2), GenreId(404)]);

    let view = shared.render(&state);
    assert_eq!(view_ids(&view), vec![1, 2, 4]);
    assert_eq!(view.genre_data.state, state);
}

#[test]
fn test_concurrent_sessions_share_one_index() {
    let dir = TempDir::new().unwrap();
    let shared = load(&write_snapshot(&dir));

    let states: Vec<SelectionState> = (1..=6)
        .map(|id| SelectionState::new().with_selected([GenreId(id)]))
        .collect();
    let expected: Vec<SessionView> = states.iter().map(|s| shared.render(s)).collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = states
            .iter()
            .map(|state| {
                let shared = shared.clone();
                scope.spawn(move || shared.render(state))
            })
            .collect();
        for (handle, expected) in handles.into_iter().zip(&expected) {
            assert_eq!(&handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_missing_snapshot_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = JsonSnapshotStore::new(dir.path().join("absent.json"));
    assert!(SharedIndex::build(&store, GenreMapConfig::default()).is_err());
}

fn genremap(dir: &TempDir, args: &[&str]) -> std::process::Output {
    let snapshot = write_snapshot(dir);
    Command::new(env!("CARGO_BIN_EXE_genremap"))
        .arg("--snapshot")
        .arg(&snapshot)
        .args(args)
        .current_dir(dir.path())
        .output()
        .expect("failed to run genremap")
}

#[test]
fn test_cli_path() {
    let dir = TempDir::new().unwrap();
    let output = genremap(&dir, &["path", "--from", "1", "--to", "3"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        "rock (1) -> punk rock (2) -> hardcore punk (3)"
    );
}

#[test]
fn test_cli_view_with_actions() {
    let dir = TempDir::new().unwrap();
    let output = genremap(
        &dir,
        &["view", "--action", "expand:rock", "--action", "select:3"],
    );
    assert!(output.status.success());

    let view: SessionView = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view_ids(&view), vec![1, 2, 3, 4]);
    assert_eq!(view.genre_data.state.highlight, Some(GenreId(3)));
}

#[test]
fn test_cli_lookup_unknown_fails() {
    let dir = TempDir::new().unwrap();
    let output = genremap(&dir, &["lookup", "--name", "polka"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_view_rejects_unknown_action_genre() {
    let dir = TempDir::new().unwrap();
    let output = genremap(&dir, &["view", "--action", "highlight:polka"]);
    assert!(!output.status.success());
}
