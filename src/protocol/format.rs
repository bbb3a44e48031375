//! Text rendering of engine output.
//!
//! Every response is one line starting with a keyword. Territory names are
//! written with `_` in place of spaces so a line always splits cleanly on
//! whitespace; an empty list is written as `-`.

use crate::board::{BoardState, Route, TerritoryId, UnitId};
use crate::filter::FilterStatus;
use crate::selection::{ChoiceRequest, CursorHint, Feedback, MoveDescription, MoveState};

/// A territory as a single token.
pub fn territory_token(board: &BoardState, id: TerritoryId) -> String {
    match board.get_territory(id) {
        Some(t) => t.name.replace(' ', "_"),
        None => id.to_string(),
    }
}

/// A comma separated unit list, or `-` when empty.
pub fn unit_list(units: &[UnitId]) -> String {
    if units.is_empty() {
        return "-".to_string();
    }
    units.iter().map(|u| u.to_string()).collect::<Vec<_>>().join(",")
}

fn territory_list(board: &BoardState, territories: &[TerritoryId]) -> String {
    if territories.is_empty() {
        return "-".to_string();
    }
    territories
        .iter()
        .map(|&t| territory_token(board, t))
        .collect::<Vec<_>>()
        .join(",")
}

/// Every territory on the route, start first.
pub fn format_route(board: &BoardState, route: &Route) -> String {
    territory_list(board, &route.all_territories())
}

fn status_token(status: Option<FilterStatus>) -> &'static str {
    match status {
        None => "-",
        Some(FilterStatus::AllUnitsCanMove) => "all",
        Some(FilterStatus::SomeUnitsCanMove) => "some",
        Some(FilterStatus::NoUnitsCanMove) => "none",
    }
}

fn cursor_token(cursor: CursorHint) -> &'static str {
    match cursor {
        CursorHint::Clear => "clear",
        CursorHint::Warning => "warning",
        CursorHint::Error => "error",
    }
}

/// `feedback route <r> status <s> movable <units> cursor <c> [message <text>]`
pub fn format_feedback(board: &BoardState, feedback: &Feedback) -> String {
    let route = match &feedback.route {
        Some(r) => format_route(board, r),
        None => "-".to_string(),
    };
    let mut line = format!(
        "feedback route {} status {} movable {} cursor {}",
        route,
        status_token(feedback.status),
        unit_list(&feedback.movable),
        cursor_token(feedback.cursor),
    );
    if let Some(message) = &feedback.message {
        line.push_str(" message ");
        line.push_str(message);
    }
    line
}

/// `choice <purpose> candidates <units> defaults <units> [max <n>] title <text>`
pub fn format_choice(request: &ChoiceRequest) -> String {
    let mut line = format!(
        "choice {} candidates {} defaults {}",
        request.purpose,
        unit_list(&request.candidates),
        unit_list(&request.defaults),
    );
    if let Some(max) = request.max {
        line.push_str(&format!(" max {}", max));
    }
    line.push_str(" title ");
    line.push_str(&request.title);
    line
}

/// `state idle`, or the draft under construction.
pub fn format_state(board: &BoardState, state: &MoveState) -> String {
    let (label, draft, endpoint) = match state {
        MoveState::Idle => return "state idle".to_string(),
        MoveState::FirstTerritorySelected(draft) => ("selecting", draft, None),
        MoveState::EndpointConfirmed { draft, endpoint } => ("confirming", draft, Some(*endpoint)),
    };
    let mut line = format!(
        "state {} start {} units {} waypoints {}",
        label,
        territory_token(board, draft.start),
        unit_list(&draft.selected_units()),
        territory_list(board, &draft.waypoints),
    );
    if let Some(end) = endpoint {
        line.push_str(&format!(" endpoint {}", territory_token(board, end)));
    }
    for (carrier, cargo) in draft.dependents.iter() {
        line.push_str(&format!(" carries {}:{}", carrier, unit_list(cargo)));
    }
    line
}

/// `move <json>` for a committed move.
pub fn format_move(description: &MoveDescription) -> serde_json::Result<String> {
    Ok(format!("move {}", serde_json::to_string(description)?))
}
