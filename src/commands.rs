//! CLI command implementations

use anyhow::Context as _;
use genremap_core::{
    ActionKind, GenreId, GenreMapConfig, GraphUpdate, JsonSnapshotStore, RelationshipType, Route,
    SelectionState, SharedIndex,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Options shared by every command.
pub struct Context {
    pub snapshot: PathBuf,
    pub config: Option<PathBuf>,
}

impl Context {
    /// Load config, read the snapshot, and build the shared index.
    fn load(&self) -> anyhow::Result<SharedIndex> {
        let config = GenreMapConfig::load(self.config.as_deref())?;
        tracing::info!("Loading genre snapshot: {}", self.snapshot.display());

        let store = JsonSnapshotStore::new(&self.snapshot);
        let shared = SharedIndex::build(&store, config)?;
        Ok(shared)
    }
}

pub struct ViewRequest {
    pub state: Option<PathBuf>,
    pub selected: Vec<GenreId>,
    pub expanded: Vec<GenreId>,
    pub highlight: Option<GenreId>,
    pub actions: Vec<String>,
    pub entire: bool,
    pub pretty: bool,
}

#[derive(Serialize)]
struct BuildStats {
    genres: usize,
    relationships: usize,
    roots: usize,
    projections: Vec<ProjectionStats>,
}

#[derive(Serialize)]
struct ProjectionStats {
    kind: RelationshipType,
    genres: usize,
    relationships: usize,
}

pub fn build(ctx: &Context) -> anyhow::Result<()> {
    let shared = ctx.load()?;
    let index = shared.index();

    let stats = BuildStats {
        genres: index.node_count(),
        relationships: index.edge_count(),
        roots: index.roots().len(),
        projections: RelationshipType::ALL
            .into_iter()
            .map(|kind| {
                let projection = index.projection(kind);
                ProjectionStats {
                    kind,
                    genres: projection.node_count(),
                    relationships: projection.edge_count(),
                }
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

pub fn lookup(ctx: &Context, id: Option<GenreId>, name: Option<String>) -> anyhow::Result<()> {
    let shared = ctx.load()?;
    let index = shared.index();

    let genre = match (id, name.as_deref()) {
        (Some(id), _) => index.genre(id),
        (None, Some(name)) => index.genre_by_name(name),
        (None, None) => anyhow::bail!("either --id or --name is required"),
    };
    match genre {
        Some(genre) => println!("{}", serde_json::to_string_pretty(genre)?),
        None => anyhow::bail!("genre not found"),
    }
    Ok(())
}

pub fn path(ctx: &Context, from: GenreId, to: GenreId, kind: RelationshipType) -> anyhow::Result<()> {
    let shared = ctx.load()?;
    match shared.index().shortest_path(from, to, kind)? {
        Route::Path(nodes) => {
            let rendered: Vec<String> = nodes
                .iter()
                .map(|id| match shared.index().genre(*id) {
                    Some(genre) => format!("{} ({})", genre.name, id),
                    None => id.to_string(),
                })
                .collect();
            println!("{}", rendered.join(" -> "));
        }
        Route::NoPath => println!("no {kind} path from {from} to {to}"),
    }
    Ok(())
}

pub fn view(ctx: &Context, request: ViewRequest) -> anyhow::Result<()> {
    let shared = ctx.load()?;

    let response = if request.entire {
        shared.render_entire()
    } else {
        let mut state = match &request.state {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading selection state {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing selection state {}", path.display()))?
            }
            None => SelectionState::new(),
        };
        state = state
            .with_selected(request.selected)
            .with_expanded(request.expanded);
        if request.highlight.is_some() {
            state.highlight = request.highlight;
        }
        for action in &request.actions {
            let update = parse_update(action)?;
            if !update.apply_to(&mut state, shared.index()) {
                anyhow::bail!("action `{action}` names an unknown genre");
            }
        }
        shared.render(&state)
    };

    let json = if request.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct ReplayResult {
    session: usize,
    genres: usize,
    relationships: usize,
}

pub fn replay(ctx: &Context, sessions: PathBuf) -> anyhow::Result<()> {
    let shared = ctx.load()?;
    let text = std::fs::read_to_string(&sessions)
        .with_context(|| format!("reading sessions {}", sessions.display()))?;
    let states: Vec<SelectionState> = serde_json::from_str(&text)
        .with_context(|| format!("parsing sessions {}", sessions.display()))?;

    let started = Instant::now();
    let results: Vec<ReplayResult> = states
        .par_iter()
        .enumerate()
        .map(|(session, state)| {
            let view = shared.render(state);
            ReplayResult {
                session,
                genres: view.genre_data.genres.len(),
                relationships: view.graph.relationships.len(),
            }
        })
        .collect();
    tracing::info!(
        "Rendered {} sessions in {:?}",
        results.len(),
        started.elapsed()
    );

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

/// Parse `action[:genre]`, where the genre is an id or an exact name.
pub fn parse_update(spec: &str) -> anyhow::Result<GraphUpdate> {
    let (action, target) = match spec.split_once(':') {
        Some((action, target)) => (action, Some(target.trim())),
        None => (spec, None),
    };
    let kind: ActionKind = action.parse().map_err(anyhow::Error::msg)?;

    let mut update = GraphUpdate::new(kind);
    if let Some(target) = target.filter(|t| !t.is_empty()) {
        update = match target.parse::<GenreId>() {
            Ok(id) => update.with_id(id),
            Err(_) => update.with_name(target),
        };
    }
    Ok(update)
}
