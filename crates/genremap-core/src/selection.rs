//! Per-session selection state and the actions that mutate it

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::graph::GraphIndex;
use crate::model::GenreId;

/// Which genres a session has selected, expanded, and highlighted.
///
/// Owned by the session store; ids may be stale relative to the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionState {
    pub selected: BTreeSet<GenreId>,
    pub expanded: BTreeSet<GenreId>,
    pub highlight: Option<GenreId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selected(mut self, ids: impl IntoIterator<Item = GenreId>) -> Self {
        self.selected.extend(ids);
        self
    }

    pub fn with_expanded(mut self, ids: impl IntoIterator<Item = GenreId>) -> Self {
        self.expanded.extend(ids);
        self
    }

    pub fn with_highlight(mut self, id: Option<GenreId>) -> Self {
        self.highlight = id;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.expanded.is_empty() && self.highlight.is_none()
    }

    /// Apply a user action in place.
    pub fn apply(&mut self, action: &GraphAction) {
        match *action {
            GraphAction::Expand { id } => {
                if !self.expanded.remove(&id) {
                    self.expanded.insert(id);
                    self.highlight = Some(id);
                }
            }
            GraphAction::Select { id } => {
                self.highlight = Some(id);
                if !self.selected.remove(&id) {
                    self.selected.insert(id);
                }
            }
            GraphAction::Highlight { id } => {
                self.highlight = id;
            }
            GraphAction::Collapse => {
                self.expanded.clear();
                self.highlight = None;
            }
            GraphAction::Reset => {
                *self = SelectionState::default();
            }
        }
    }

    /// Ids referenced by this state that the index does not know.
    pub fn stale_ids(&self, index: &GraphIndex) -> Vec<GenreId> {
        let stale: BTreeSet<GenreId> = self
            .selected
            .iter()
            .chain(self.expanded.iter())
            .chain(self.highlight.iter())
            .copied()
            .filter(|id| !index.contains(*id))
            .collect();
        stale.into_iter().collect()
    }
}

/// A resolved mutation of [`SelectionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GraphAction {
    /// Toggle expansion; newly expanded genres become the highlight.
    Expand { id: GenreId },
    /// Toggle selection and highlight the genre.
    Select { id: GenreId },
    Highlight { id: Option<GenreId> },
    /// Drop all expansions and the highlight, keep selections.
    Collapse,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Expand,
    Select,
    Highlight,
    Collapse,
    Reset,
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expand" => Ok(ActionKind::Expand),
            "select" => Ok(ActionKind::Select),
            "highlight" => Ok(ActionKind::Highlight),
            "collapse" => Ok(ActionKind::Collapse),
            "reset" => Ok(ActionKind::Reset),
            other => Err(format!("unknown action: {other}")),
        }
    }
}

/// Client request that may reference a genre by id or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphUpdate {
    pub action: ActionKind,
    #[serde(default)]
    pub id: Option<GenreId>,
    #[serde(default)]
    pub name: Option<String>,
}

impl GraphUpdate {
    pub fn new(action: ActionKind) -> Self {
        GraphUpdate {
            action,
            id: None,
            name: None,
        }
    }

    pub fn with_id(mut self, id: GenreId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Resolve into an action. A name is only consulted when no id is given.
    /// Returns `None` when a genre reference was given but cannot be resolved,
    /// or when a targeted action carries no reference at all. A highlight
    /// without any reference clears the highlight.
    pub fn resolve(&self, index: &GraphIndex) -> Option<GraphAction> {
        let target = match (self.id, self.name.as_deref()) {
            (Some(id), _) => Some(id),
            (None, Some(name)) => Some(index.genre_by_name(name)?.id),
            (None, None) => None,
        };

        match self.action {
            ActionKind::Expand => target.map(|id| GraphAction::Expand { id }),
            ActionKind::Select => target.map(|id| GraphAction::Select { id }),
            ActionKind::Highlight => Some(GraphAction::Highlight { id: target }),
            ActionKind::Collapse => Some(GraphAction::Collapse),
            ActionKind::Reset => Some(GraphAction::Reset),
        }
    }

    /// Resolve and apply to `state`. Returns whether anything was applied.
    pub fn apply_to(&self, state: &mut SelectionState, index: &GraphIndex) -> bool {
        match self.resolve(index) {
            Some(action) => {
                state.apply(&action);
                true
            }
            None => {
                tracing::warn!(
                    "Ignoring {:?} update: genre {:?} not found",
                    self.action,
                    self.name
                );
                false
            }
        }
    }
}
