//! States, outputs and errors of the selection machine.

use std::collections::BTreeMap;

use indexmap::IndexSet;
use serde::Serialize;

use crate::board::{DependentMap, Route, TerritoryId, UnitId};
use crate::filter::FilterStatus;
use crate::transport::AssignmentError;

/// The move being built, from the first click until commit or cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDraft {
    pub start: TerritoryId,
    /// Insertion ordered; removal without a target takes the newest.
    pub selected: IndexSet<UnitId>,
    pub waypoints: Vec<TerritoryId>,
    /// Cargo loaded onto air transports for this move.
    pub dependents: DependentMap,
    pub hover: Option<TerritoryId>,
}

impl MoveDraft {
    pub fn new(start: TerritoryId) -> Self {
        Self {
            start,
            selected: IndexSet::new(),
            waypoints: Vec::new(),
            dependents: DependentMap::new(),
            hover: None,
        }
    }

    pub fn selected_units(&self) -> Vec<UnitId> {
        self.selected.iter().copied().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MoveState {
    #[default]
    Idle,
    FirstTerritorySelected(MoveDraft),
    /// Held while carriers for the chosen endpoint are being settled.
    EndpointConfirmed { draft: MoveDraft, endpoint: TerritoryId },
}

impl MoveState {
    pub fn draft(&self) -> Option<&MoveDraft> {
        match self {
            MoveState::Idle => None,
            MoveState::FirstTerritorySelected(draft) => Some(draft),
            MoveState::EndpointConfirmed { draft, .. } => Some(draft),
        }
    }

    pub fn start(&self) -> Option<TerritoryId> {
        self.draft().map(|d| d.start)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, MoveState::Idle)
    }

    /// Drops a pending endpoint, keeping the draft untouched.
    pub fn into_draft(self) -> Option<MoveDraft> {
        match self {
            MoveState::Idle => None,
            MoveState::FirstTerritorySelected(draft) => Some(draft),
            MoveState::EndpointConfirmed { draft, .. } => Some(draft),
        }
    }
}

/// The finished move handed to whoever executes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveDescription {
    pub units: Vec<UnitId>,
    pub route: Route,
    /// Land unit to the sea transport carrying it.
    pub units_to_sea_transports: BTreeMap<UnitId, UnitId>,
    /// Air transport to the units it carries.
    pub air_transport_dependents: BTreeMap<UnitId, Vec<UnitId>>,
}

/// Render hint derived from the filter status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorHint {
    #[default]
    Clear,
    Warning,
    Error,
}

/// Derived state after the last recomputation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feedback {
    pub route: Option<Route>,
    pub movable: Vec<UnitId>,
    /// `None` when there is no route to filter against.
    pub status: Option<FilterStatus>,
    pub cursor: CursorHint,
    pub message: Option<String>,
}

/// Inconsistent internal state. The move is abandoned, not repaired.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("{0} appears twice in the movable set")]
    DuplicateMovableUnit(UnitId),

    #[error("dependent map references {0}, which is not selected")]
    StaleDependent(UnitId),
}

/// Why a destination click did not produce a move. The draft is kept.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum EndpointRejection {
    #[error("no route to {0}")]
    NoRoute(String),

    #[error("route stops short at {0}")]
    ShortRoute(String),

    #[error("no selected units can move to {0}")]
    NoMovableUnits(String),

    #[error("no transports can load the units")]
    NoCarriers,

    #[error("nothing to unload")]
    NothingToUnload,

    #[error("selected transports do not match the units to unload")]
    InfeasibleUnload,

    #[error("too many {0} units selected")]
    TooManyOfType(String),

    #[error("choice includes units that were not offered")]
    InvalidChoice,

    #[error("choice cancelled")]
    ChoiceCancelled,

    #[error(transparent)]
    Assignment(#[from] AssignmentError),
}

/// What one input event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed.
    Ignored,
    /// The draft changed; feedback is current.
    Updated,
    /// The endpoint was refused and the draft kept.
    Rejected(EndpointRejection),
    Committed(MoveDescription),
    Cancelled,
    Aborted(SelectionError),
}
