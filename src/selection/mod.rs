//! Selection state machine.
//!
//! Turns clicks and hovers into a move. The machine owns the in-progress
//! draft (start territory, selected units, waypoints and air transport
//! dependents) and after every input re-resolves the route and re-filters
//! the movable units. Clicking a destination settles carriers if the route
//! loads or unloads, then emits a `MoveDescription`.
//!
//! Questions for the player go through a `UnitChooser`. A refused or
//! cancelled answer at the endpoint leaves the draft exactly as it was.

pub mod chooser;
pub mod input;
pub mod state;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

pub use chooser::{AcceptDefaults, ChoicePurpose, ChoiceRequest, ScriptedChooser, UnitChooser};
pub use input::{ClickEvent, Modifiers, MouseButton, MULTI_SELECT_COUNT};
pub use state::{
    CursorHint, EndpointRejection, Feedback, MoveDescription, MoveDraft, MoveState, Outcome,
    SelectionError,
};

use crate::board::{
    categorize, must_move_with, BoardState, CategoryGroup, CategoryKeys, DependentMap, PlayerId,
    Route, TerritoryId, UnitId, UnitTypeId,
};
use crate::config::RulesOptions;
use crate::filter::{can_move, filter_movable, movable_in, FilterStatus, MoveContext, MoveType, PriorMove};
use crate::pathing::{RouteCache, RouteKey, RouteRequest, RouteResolver};
use crate::transport::{
    air_transport_dependents, choose_units_to_unload, is_feasible_unload_selection, map_transports,
    plan_load, plan_unload, validate_carrier_selection, AirLoadPlan, Assignment, AssignmentError,
};

/// Answers a chooser may give before a refused question counts as cancelled.
const MAX_CHOICE_ATTEMPTS: usize = 16;

/// Read-only view of the world for one input event.
#[derive(Debug, Clone, Copy)]
pub struct MoveEnv<'a> {
    pub board: &'a BoardState,
    pub options: &'a RulesOptions,
    pub player: PlayerId,
    pub prior_moves: &'a [PriorMove],
}

impl<'a> MoveEnv<'a> {
    pub fn new(board: &'a BoardState, options: &'a RulesOptions, player: PlayerId) -> Self {
        Self { board, options, player, prior_moves: &[] }
    }

    pub fn with_prior_moves(mut self, prior_moves: &'a [PriorMove]) -> Self {
        self.prior_moves = prior_moves;
        self
    }

    fn context<'d>(&self, dependents: &'d DependentMap) -> MoveContext<'d>
    where
        'a: 'd,
    {
        MoveContext {
            player: self.player,
            non_combat: self.options.non_combat,
            edit_mode: self.options.edit_mode,
            selectable_zero_movement_units: self.options.selectable_zero_movement_units,
            move_type: if self.options.airborne_move { MoveType::Special } else { MoveType::Default },
            prior_moves: self.prior_moves,
            dependents,
        }
    }

    fn request<'u>(&self, units: &'u [UnitId]) -> RouteRequest<'u> {
        RouteRequest {
            player: self.player,
            units,
            non_combat: self.options.non_combat,
            skip_airborne_check: self.options.airborne_move,
        }
    }

    fn name(&self, territory: TerritoryId) -> String {
        self.board.territory(territory).name.clone()
    }
}

/// The interactive move builder.
#[derive(Debug, Default)]
pub struct SelectionMachine {
    state: MoveState,
    cache: RouteCache,
    feedback: Feedback,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MoveState {
        &self.state
    }

    /// Route, movable units and hints from the last recomputation.
    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    /// Selected units in selection order. Empty when idle.
    pub fn selected(&self) -> Vec<UnitId> {
        self.state.draft().map(MoveDraft::selected_units).unwrap_or_default()
    }

    pub fn route_cache(&self) -> &RouteCache {
        &self.cache
    }

    /// Forgets memoized routes. Call after the board or rules change.
    pub fn invalidate_routes(&mut self) {
        self.cache.invalidate();
    }

    /// Handles one click.
    pub fn click(&mut self, env: &MoveEnv<'_>, event: &ClickEvent, chooser: &mut dyn UnitChooser) -> Outcome {
        match (event.button, std::mem::take(&mut self.state)) {
            (MouseButton::Right, MoveState::FirstTerritorySelected(draft)) => {
                self.deselect_units(env, draft, event)
            }
            (MouseButton::Left, MoveState::Idle) => self.select_units_to_move(env, None, event, chooser),
            (MouseButton::Left, MoveState::FirstTerritorySelected(draft)) => {
                if draft.start == event.territory {
                    self.select_units_to_move(env, Some(draft), event, chooser)
                } else if event.modifiers.ctrl {
                    self.select_waypoint(env, draft, event.territory)
                } else {
                    self.select_endpoint(env, draft, event.territory, chooser)
                }
            }
            (_, other) => {
                self.state = other;
                Outcome::Ignored
            }
        }
    }

    /// Handles the pointer entering `territory`.
    pub fn hover(&mut self, env: &MoveEnv<'_>, territory: TerritoryId) -> Outcome {
        let mut draft = match std::mem::take(&mut self.state) {
            MoveState::FirstTerritorySelected(draft) => draft,
            other => {
                self.state = other;
                return Outcome::Ignored;
            }
        };
        draft.hover = Some(territory);

        let selected = draft.selected_units();
        let route = self.route_for(env, &draft, territory, &selected);
        if let Err(e) = self.update_feedback(env, &draft, &selected, route) {
            return self.abort(e);
        }

        // Aircraft may have a better route of their own.
        let board = env.board;
        let movable = &self.feedback.movable;
        if movable.len() < selected.len() && movable.iter().all(|&u| board.type_of(u).is_air()) {
            let air: Vec<UnitId> = selected
                .iter()
                .copied()
                .filter(|&u| board.type_of(u).is_air())
                .collect();
            if !air.is_empty() {
                let route = self.route_for(env, &draft, territory, &air);
                if let Err(e) = self.update_feedback(env, &draft, &air, route) {
                    return self.abort(e);
                }
            }
        }

        self.state = MoveState::FirstTerritorySelected(draft);
        Outcome::Updated
    }

    /// Drops the in-progress move.
    pub fn cancel(&mut self) -> Outcome {
        if self.state.is_idle() {
            return Outcome::Ignored;
        }
        info!("move cancelled");
        self.reset();
        Outcome::Cancelled
    }

    fn reset(&mut self) {
        self.state = MoveState::Idle;
        self.cache.invalidate();
        self.feedback = Feedback::default();
    }

    fn abort(&mut self, err: SelectionError) -> Outcome {
        error!(error = %err, "inconsistent selection, abandoning move");
        self.reset();
        Outcome::Aborted(err)
    }

    /// Puts a draft back, or goes idle if it never got a unit.
    fn restore(&mut self, draft: MoveDraft) {
        self.state = if draft.selected.is_empty() {
            MoveState::Idle
        } else {
            MoveState::FirstTerritorySelected(draft)
        };
    }

    fn reject(&mut self, draft: MoveDraft, rejection: EndpointRejection) -> Outcome {
        warn!(reason = %rejection, "endpoint rejected");
        self.state = MoveState::FirstTerritorySelected(draft);
        Outcome::Rejected(rejection)
    }

    fn route_for(&mut self, env: &MoveEnv<'_>, draft: &MoveDraft, end: TerritoryId, units: &[UnitId]) -> Option<Route> {
        let key = RouteKey::new(draft.start, end, units, &draft.waypoints);
        let resolver = RouteResolver::with_configured_policy(env.board, env.options);
        let request = env.request(units);
        self.cache
            .get_or_resolve(key, || resolver.resolve_route(draft.start, end, &request, &draft.waypoints))
    }

    /// Re-filters `units` against `route` and refreshes the feedback.
    fn update_feedback(
        &mut self,
        env: &MoveEnv<'_>,
        draft: &MoveDraft,
        units: &[UnitId],
        route: Option<Route>,
    ) -> Result<(), SelectionError> {
        let selection = draft.selected_units();
        if let Some(stray) = draft.dependents.first_stray(&selection) {
            return Err(SelectionError::StaleDependent(stray));
        }

        let route = match route {
            Some(route) if route.has_steps() => route,
            other => {
                self.feedback = Feedback {
                    route: other,
                    movable: units.to_vec(),
                    ..Feedback::default()
                };
                return Ok(());
            }
        };

        let ctx = env.context(&draft.dependents);
        let result = filter_movable(env.board, units, &route, &ctx);
        if let Some(dup) = first_duplicate(&result.units) {
            return Err(SelectionError::DuplicateMovableUnit(dup));
        }

        let (mut cursor, mut message) = match result.status {
            FilterStatus::NoUnitsCanMove => (CursorHint::Error, result.message),
            FilterStatus::SomeUnitsCanMove => (CursorHint::Warning, result.message),
            FilterStatus::AllUnitsCanMove => {
                if selection.iter().all(|u| result.units.contains(u)) {
                    (CursorHint::Clear, None)
                } else {
                    (CursorHint::Warning, Some("Not all units can move there".to_string()))
                }
            }
        };
        if let Some(shortfall) = load_shortfall(env, draft, &route, &result.units) {
            cursor = CursorHint::Error;
            message = Some(shortfall);
        }
        debug!(
            to = %env.board.territory(route.end()).name,
            steps = route.number_of_steps(),
            movable = result.units.len(),
            status = ?result.status,
            "recomputed"
        );
        self.feedback = Feedback {
            route: Some(route),
            movable: result.units,
            status: Some(result.status),
            cursor,
            message,
        };
        Ok(())
    }

    fn select_units_to_move(
        &mut self,
        env: &MoveEnv<'_>,
        draft: Option<MoveDraft>,
        event: &ClickEvent,
        chooser: &mut dyn UnitChooser,
    ) -> Outcome {
        let board = env.board;
        let territory = event.territory;
        let mut draft = draft.unwrap_or_else(|| MoveDraft::new(territory));

        if !can_select(env, &draft, &event.units) {
            warn!(territory = %board.territory(territory).name, "units not selectable");
            self.restore(draft);
            return Outcome::Ignored;
        }

        let picked = match pick_units(env, &draft, event, chooser) {
            Some(picked) if !picked.is_empty() => picked,
            _ => {
                self.restore(draft);
                return Outcome::Ignored;
            }
        };
        draft.selected.extend(picked);
        self.cache.invalidate();

        let air_transport_ready = draft
            .selected
            .iter()
            .any(|&u| board.type_of(u).is_air_transport() && !board.has_moved(u));
        if env.options.air_transport_loading_allowed() && air_transport_ready {
            load_paratroopers(env, &mut draft, territory, chooser);
        }

        let selected = draft.selected_units();
        let route = self.route_for(env, &draft, territory, &selected);
        if let Err(e) = self.update_feedback(env, &draft, &selected, route) {
            return self.abort(e);
        }
        debug!(selected = selected.len(), at = %board.territory(territory).name, "selection grown");
        self.state = MoveState::FirstTerritorySelected(draft);
        Outcome::Updated
    }

    fn deselect_units(&mut self, env: &MoveEnv<'_>, mut draft: MoveDraft, event: &ClickEvent) -> Outcome {
        let board = env.board;
        // A stack clicked in another territory counts as no stack.
        let clicked: &[UnitId] = if event.territory == draft.start { &event.units } else { &[] };
        let selected = draft.selected_units();
        let riding: Vec<UnitId> = selected
            .iter()
            .flat_map(|&u| must_move_with(board, u, &draft.dependents))
            .collect();
        let count = event.modifiers.count();

        let mut to_remove: Vec<UnitId> = Vec::new();
        if clicked.is_empty() {
            if event.modifiers.ctrl {
                to_remove = selected.clone();
            } else {
                for &unit in selected.iter().rev().filter(|u| !riding.contains(u)).take(count) {
                    to_remove.push(unit);
                    to_remove.extend_from_slice(draft.dependents.cargo_of(unit));
                }
            }
        } else if event.modifiers.ctrl {
            for &unit in clicked.iter().filter(|u| draft.selected.contains(*u)) {
                to_remove.push(unit);
                to_remove.extend_from_slice(draft.dependents.cargo_of(unit));
            }
        } else {
            for &unit in clicked {
                if to_remove.len() == count {
                    break;
                }
                if draft.selected.contains(&unit) && !to_remove.contains(&unit) {
                    to_remove.push(unit);
                }
            }
        }

        if to_remove.is_empty() {
            self.state = MoveState::FirstTerritorySelected(draft);
            return Outcome::Ignored;
        }
        for unit in &to_remove {
            draft.selected.shift_remove(unit);
            draft.dependents.remove_unit(*unit);
        }
        self.cache.invalidate();

        if draft.selected.is_empty() {
            info!("selection emptied, move cancelled");
            self.reset();
            return Outcome::Cancelled;
        }

        let selected = draft.selected_units();
        let route = self.route_for(env, &draft, event.territory, &selected);
        if let Err(e) = self.update_feedback(env, &draft, &selected, route) {
            return self.abort(e);
        }
        self.state = MoveState::FirstTerritorySelected(draft);
        Outcome::Updated
    }

    fn select_waypoint(&mut self, env: &MoveEnv<'_>, mut draft: MoveDraft, territory: TerritoryId) -> Outcome {
        if !draft.waypoints.contains(&territory) {
            draft.waypoints.push(territory);
        }
        self.cache.invalidate();

        let selected = draft.selected_units();
        let route = self.route_for(env, &draft, territory, &selected);
        if let Err(e) = self.update_feedback(env, &draft, &selected, route) {
            return self.abort(e);
        }
        debug!(waypoints = draft.waypoints.len(), "waypoint added");
        self.state = MoveState::FirstTerritorySelected(draft);
        Outcome::Updated
    }

    fn select_endpoint(
        &mut self,
        env: &MoveEnv<'_>,
        draft: MoveDraft,
        endpoint: TerritoryId,
        chooser: &mut dyn UnitChooser,
    ) -> Outcome {
        let selected = draft.selected_units();
        let route = self.route_for(env, &draft, endpoint, &selected);
        if let Err(e) = self.update_feedback(env, &draft, &selected, route.clone()) {
            return self.abort(e);
        }

        let route = match route {
            None => return self.reject(draft, EndpointRejection::NoRoute(env.name(endpoint))),
            Some(r) if r.end() != endpoint => {
                return self.reject(draft, EndpointRejection::ShortRoute(env.name(r.end())))
            }
            Some(r) => r,
        };
        let movable = self.feedback.movable.clone();
        if movable.is_empty() || self.feedback.status == Some(FilterStatus::NoUnitsCanMove) {
            return self.reject(draft, EndpointRejection::NoMovableUnits(env.name(endpoint)));
        }

        self.state = MoveState::EndpointConfirmed { draft, endpoint };
        let settled = match self.state.draft() {
            Some(draft) => settle(env, draft, &route, movable, chooser),
            None => Err(EndpointRejection::ChoiceCancelled),
        };

        match settled {
            Ok(description) => {
                info!(
                    units = description.units.len(),
                    to = %env.board.territory(endpoint).name,
                    steps = route.number_of_steps(),
                    "move committed"
                );
                self.reset();
                Outcome::Committed(description)
            }
            Err(rejection) => match std::mem::take(&mut self.state).into_draft() {
                Some(draft) => self.reject(draft, rejection),
                None => {
                    self.reset();
                    Outcome::Cancelled
                }
            },
        }
    }
}

/// Outside edit mode every clicked unit must be the player's; in edit mode
/// they must share the owner of the existing selection.
fn can_select(env: &MoveEnv<'_>, draft: &MoveDraft, units: &[UnitId]) -> bool {
    let required = if env.options.edit_mode {
        draft.selected.first().map(|&u| env.board.unit(u).owner)
    } else {
        Some(env.player)
    };
    match required {
        Some(owner) => units.iter().all(|&u| env.board.unit(u).owner == owner),
        None => true,
    }
}

/// Units a left click adds to the selection, not yet inserted.
fn pick_units(
    env: &MoveEnv<'_>,
    draft: &MoveDraft,
    event: &ClickEvent,
    chooser: &mut dyn UnitChooser,
) -> Option<Vec<UnitId>> {
    let board = env.board;
    let territory = event.territory;
    let ctx = env.context(&draft.dependents);
    let movable = |u: UnitId| can_move(board, u, None, &ctx, &[]);
    let mut picked: Vec<UnitId> = Vec::new();

    if event.units.is_empty() && draft.selected.is_empty() && !event.modifiers.shift {
        let candidates: Vec<UnitId> = board
            .units_in(territory)
            .iter()
            .copied()
            .filter(|&u| movable(u))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let request = ChoiceRequest::new(
            board,
            ChoicePurpose::SelectUnits,
            format!("Select units to move from {}", board.territory(territory).name),
            candidates,
            &CategoryKeys::default(),
        );
        let chosen = chooser.choose(board, &request)?;
        if !request.admits(&chosen) || !single_owner(board, &chosen) {
            warn!("unit choice rejected");
            return None;
        }
        picked.extend(chosen);
    }

    let fresh = |u: &UnitId, picked: &[UnitId]| !draft.selected.contains(u) && !picked.contains(u);

    if event.modifiers.shift {
        // Edit mode never mixes owners in one selection.
        let owner = if env.options.edit_mode {
            draft
                .selected
                .first()
                .or(picked.first())
                .or(board.units_in(territory).first())
                .map(|&u| board.unit(u).owner)
        } else {
            None
        };
        for &unit in board.units_in(territory) {
            let owned = owner.map_or(true, |o| board.unit(unit).owner == o);
            if owned && movable(unit) && fresh(&unit, &picked) {
                picked.push(unit);
            }
        }
    } else if event.modifiers.ctrl {
        for &unit in &event.units {
            if movable(unit) && fresh(&unit, &picked) {
                picked.push(unit);
            }
        }
    } else {
        let mut best: Vec<UnitId> = Vec::new();
        for &unit in &event.units {
            if movable(unit) && fresh(&unit, &picked) && !best.contains(&unit) {
                best.push(unit);
            }
        }
        best.sort_by(|a, b| board.unit(*b).movement_left.cmp(&board.unit(*a).movement_left));
        best.truncate(event.modifiers.count());
        picked.extend(best);
    }
    Some(picked)
}

fn single_owner(board: &BoardState, units: &[UnitId]) -> bool {
    match units.first() {
        Some(&first) => {
            let owner = board.unit(first).owner;
            units.iter().all(|&u| board.unit(u).owner == owner)
        }
        None => true,
    }
}

fn first_duplicate(units: &[UnitId]) -> Option<UnitId> {
    units
        .iter()
        .enumerate()
        .find(|(i, u)| units[..*i].contains(u))
        .map(|(_, &u)| u)
}

/// Offers air transports in `territory` and then the units to load on them.
/// Accepted cargo joins the selection and the dependent map.
fn load_paratroopers(env: &MoveEnv<'_>, draft: &mut MoveDraft, territory: TerritoryId, chooser: &mut dyn UnitChooser) {
    let board = env.board;
    let selected = draft.selected_units();
    let pool: Vec<UnitId> = {
        let ctx = env.context(&draft.dependents);
        board
            .units_in(territory)
            .iter()
            .copied()
            .filter(|&u| {
                board.unit(u).owner == env.player
                    && board.unit(u).transporting.is_empty()
                    && draft.dependents.cargo_of(u).is_empty()
                    && can_move(board, u, None, &ctx, &[])
            })
            .collect()
    };
    let plan = AirLoadPlan::gather(board, &pool, territory, env.player, &draft.dependents);
    let candidates: Vec<UnitId> = plan
        .candidates
        .iter()
        .copied()
        .filter(|u| !selected.contains(u))
        .collect();
    if plan.is_empty() || candidates.is_empty() {
        return;
    }

    let keys = CategoryKeys { movement: true, ..CategoryKeys::default() };
    let request = ChoiceRequest::new(
        board,
        ChoicePurpose::AirTransports,
        "Select air transports to load",
        plan.transports.clone(),
        &keys,
    )
    .with_max(plan.transports.len());
    let transports = match chooser.choose(board, &request) {
        Some(t) if !t.is_empty() && request.admits(&t) => t,
        _ => return,
    };
    draft.selected.extend(transports.iter().copied());

    let min_cost = candidates.iter().filter_map(|&u| board.transport_cost(u)).min().unwrap_or(0);
    let usable: Vec<UnitId> = transports
        .iter()
        .copied()
        .filter(|&t| board.available_capacity(t) >= min_cost)
        .collect();
    if usable.is_empty() {
        return;
    }
    let fits = air_transport_dependents(board, &usable, &candidates);
    let loadable: Vec<UnitId> = candidates
        .iter()
        .copied()
        .filter(|u| fits.mapping.contains_key(u))
        .collect();

    let keys = CategoryKeys { transport_cost: true, dependents: Some(&draft.dependents), ..CategoryKeys::default() };
    let request = ChoiceRequest::new(
        board,
        ChoicePurpose::Paratroopers,
        "What units do you want to load",
        loadable,
        &keys,
    );
    let room: u32 = usable.iter().map(|&t| board.available_capacity(t)).sum();
    let accepted = ask_until(chooser, board, &request, |picked| {
        let assignment = air_transport_dependents(board, &usable, picked);
        if assignment.is_complete() {
            Ok(assignment)
        } else {
            Err(AssignmentError::InfeasibleSelection { needed: board.transport_cost_of(picked), available: room })
        }
    });
    let assignment = match accepted {
        Ok(a) => a,
        Err(_) => return,
    };
    for (&unit, &carrier) in &assignment.mapping {
        draft.dependents.add(carrier, unit);
        draft.selected.insert(unit);
    }
    debug!(loaded = assignment.mapping.len(), "paratroopers boarded");
}

/// Puts `request` to the chooser until `accept` takes an answer.
///
/// A cancel, or the same refused answer twice in a row, gives up.
fn ask_until<T, E>(
    chooser: &mut dyn UnitChooser,
    board: &BoardState,
    request: &ChoiceRequest,
    mut accept: impl FnMut(&[UnitId]) -> Result<T, E>,
) -> Result<T, EndpointRejection>
where
    E: Into<EndpointRejection>,
{
    let mut refused: Option<Vec<UnitId>> = None;
    let mut last_error = EndpointRejection::ChoiceCancelled;
    for _ in 0..MAX_CHOICE_ATTEMPTS {
        let answer = chooser.choose(board, request).ok_or(EndpointRejection::ChoiceCancelled)?;
        let verdict = if request.admits(&answer) {
            accept(&answer).map_err(Into::into)
        } else {
            Err(EndpointRejection::InvalidChoice)
        };
        match verdict {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(purpose = %request.purpose, error = %e, "choice refused");
                if refused.as_ref() == Some(&answer) {
                    return Err(e);
                }
                refused = Some(answer);
                last_error = e;
            }
        }
    }
    Err(last_error)
}

/// Warns while hovering a load route that the carriers at its end fall
/// short: a unit cannot be carried, there is too little room, or the
/// default assignment relies on carriers that could not unload afterwards.
fn load_shortfall(env: &MoveEnv<'_>, draft: &MoveDraft, route: &Route, movable: &[UnitId]) -> Option<String> {
    let board = env.board;
    if !route.is_load() {
        return None;
    }
    let land: Vec<UnitId> = movable.iter().copied().filter(|&u| board.type_of(u).is_land()).collect();
    if land.is_empty() {
        return None;
    }
    if let Some(&unit) = land.iter().find(|&&u| !board.is_transportable(u)) {
        return Some(format!("{} cannot be carried", board.type_of(unit).name));
    }

    let zone = env.name(route.end());
    let plan = plan_load(board, route, env.player, &land, false, env.options.non_combat, &draft.dependents);
    if !plan.assignment.is_complete() {
        Some(format!("Not enough transports in {}", zone))
    } else if plan.uses_incapable() {
        Some(format!("Transports in {} cannot unload this turn", zone))
    } else {
        None
    }
}

/// Settles carriers for a confirmed endpoint and builds the description.
fn settle(
    env: &MoveEnv<'_>,
    draft: &MoveDraft,
    route: &Route,
    movable: Vec<UnitId>,
    chooser: &mut dyn UnitChooser,
) -> Result<MoveDescription, EndpointRejection> {
    let board = env.board;
    let any_land = movable.iter().any(|&u| board.type_of(u).is_land());

    let mut sea_assignment = Assignment::default();
    let units = if route.is_load() && any_land {
        sea_assignment = settle_load(env, draft, route, &movable, chooser)?;
        movable
    } else if route.is_unload() && any_land {
        settle_unload(env, draft, route, &movable, chooser)?
    } else {
        refine_selection(env, draft, route, movable, chooser)?
    };

    let units_to_sea_transports = map_transports(board, &units, route, &sea_assignment);
    // Air transports dropped during refinement lose their cargo entry.
    let air_transport_dependents = draft
        .dependents
        .iter()
        .filter(|(carrier, _)| units.contains(carrier))
        .map(|(carrier, cargo)| (carrier, cargo.to_vec()))
        .collect();

    Ok(MoveDescription {
        units,
        route: route.clone(),
        units_to_sea_transports,
        air_transport_dependents,
    })
}

fn settle_load(
    env: &MoveEnv<'_>,
    draft: &MoveDraft,
    route: &Route,
    units: &[UnitId],
    chooser: &mut dyn UnitChooser,
) -> Result<Assignment, EndpointRejection> {
    let board = env.board;
    let land: Vec<UnitId> = units.iter().copied().filter(|&u| board.type_of(u).is_land()).collect();
    if let Some(&unit) = land.iter().find(|&&u| !board.is_transportable(u)) {
        return Err(AssignmentError::NotTransportable(unit).into());
    }
    let plan = plan_load(board, route, env.player, &land, true, env.options.non_combat, &draft.dependents);
    if plan.candidates.is_empty() {
        return Err(EndpointRejection::NoCarriers);
    }

    if !plan.needs_confirmation {
        if plan.assignment.is_complete() {
            return Ok(plan.assignment);
        }
        return Err(AssignmentError::InfeasibleSelection {
            needed: board.transport_cost_of(&land),
            available: plan.candidates.iter().map(|c| c.available).sum(),
        }
        .into());
    }

    let keys = CategoryKeys { movement: true, dependents: Some(&draft.dependents), ..CategoryKeys::default() };
    let request = ChoiceRequest::new(
        board,
        ChoicePurpose::LoadTransports,
        "Select transports to load",
        plan.candidate_units(),
        &keys,
    )
    .with_defaults(plan.default_selection.clone())
    .with_max(plan.selection_limit(land.len()));

    ask_until(chooser, board, &request, |picked| {
        if picked == plan.default_selection.as_slice() && plan.assignment.is_complete() {
            return Ok(plan.assignment.clone());
        }
        validate_carrier_selection(board, &plan, &land, picked)
    })
}

fn settle_unload(
    env: &MoveEnv<'_>,
    draft: &MoveDraft,
    route: &Route,
    movable: &[UnitId],
    chooser: &mut dyn UnitChooser,
) -> Result<Vec<UnitId>, EndpointRejection> {
    let board = env.board;
    let non_combat = env.options.non_combat;
    // Combat-phase eligibility is already settled by the filter.
    let unloadable = |u: UnitId| board.unit(u).owner == env.player && board.type_of(u).is_land();

    let requested: Vec<UnitId> = draft.selected.iter().copied().filter(|&u| unloadable(u)).collect();
    let mut units = if requested.is_empty() {
        Vec::new()
    } else {
        let ctx = env.context(&draft.dependents);
        let candidates: Vec<UnitId> = movable_in(board, route.start(), Some(route), &ctx, &requested)
            .into_iter()
            .filter(|&u| board.type_of(u).is_land())
            .collect();
        let plan = plan_unload(board, route, &requested, &candidates, non_combat, &draft.dependents);
        if plan.needs_choice {
            let keys = CategoryKeys { movement: true, dependents: Some(&draft.dependents), ..CategoryKeys::default() };
            let request = ChoiceRequest::new(
                board,
                ChoicePurpose::UnloadTransports,
                "Select transports to unload",
                plan.transports.clone(),
                &keys,
            )
            .with_defaults(plan.default_transports.clone());
            let transports = ask_until(chooser, board, &request, |picked| {
                if is_feasible_unload_selection(board, &requested, picked) {
                    Ok(picked.to_vec())
                } else {
                    Err(EndpointRejection::InfeasibleUnload)
                }
            })?;
            choose_units_to_unload(board, &requested, &candidates, &transports)
        } else {
            plan.units
        }
    };

    // Aircraft fly along the unload route on their own.
    units.extend(movable.iter().copied().filter(|&u| !unloadable(u)));
    if units.is_empty() {
        return Err(EndpointRejection::NothingToUnload);
    }
    Ok(units)
}

/// Lets the player pick between same-type units that differ in movement
/// left, capped at the per-type counts already selected. Dependents of
/// the result are added back afterwards.
fn refine_selection(
    env: &MoveEnv<'_>,
    draft: &MoveDraft,
    route: &Route,
    units: Vec<UnitId>,
    chooser: &mut dyn UnitChooser,
) -> Result<Vec<UnitId>, EndpointRejection> {
    let board = env.board;
    let ctx = env.context(&draft.dependents);
    let mut candidates = movable_in(board, draft.start, Some(route), &ctx, &units);
    let keys = CategoryKeys { movement: true, dependents: Some(&draft.dependents), ..CategoryKeys::default() };
    let groups = categorize(board, &candidates, &keys);

    let mut chosen = units;
    if must_refine(&groups, &chosen) {
        let mut caps: BTreeMap<UnitTypeId, usize> = BTreeMap::new();
        for &u in &chosen {
            *caps.entry(board.unit(u).unit_type).or_default() += 1;
        }
        candidates.sort_by(|a, b| board.unit(*b).movement_left.cmp(&board.unit(*a).movement_left));
        let defaults: Vec<UnitId> = chosen.iter().copied().filter(|u| candidates.contains(u)).collect();
        let request = ChoiceRequest::new(
            board,
            ChoicePurpose::RefineSelection,
            format!("Select units to move from {}", board.territory(draft.start).name),
            candidates,
            &keys,
        )
        .with_defaults(defaults);

        chosen = ask_until(chooser, board, &request, |picked| {
            let mut counts: BTreeMap<UnitTypeId, usize> = BTreeMap::new();
            for &u in picked {
                *counts.entry(board.unit(u).unit_type).or_default() += 1;
            }
            match counts.iter().find(|&(ty, &n)| n > caps.get(ty).copied().unwrap_or(0)) {
                Some((&ty, _)) => Err(EndpointRejection::TooManyOfType(board.unit_type(ty).name.clone())),
                None => Ok(picked.to_vec()),
            }
        })?;
    }

    let base = chosen.clone();
    for unit in base {
        for dep in must_move_with(board, unit, &draft.dependents) {
            if !chosen.contains(&dep) {
                chosen.push(dep);
            }
        }
    }
    if chosen.is_empty() {
        return Err(EndpointRejection::NoMovableUnits(env.name(route.end())));
    }
    Ok(chosen)
}

/// True when two categories of one type differ (in movement or cargo) and
/// the selection takes some but not all of them.
fn must_refine(groups: &[CategoryGroup], units: &[UnitId]) -> bool {
    let moving = |g: &CategoryGroup| g.category.movement.map_or(false, |m| m > Decimal::ZERO);
    let all_in = |g: &CategoryGroup| g.units.iter().all(|u| units.contains(u));
    let any_in = |g: &CategoryGroup| g.units.iter().any(|u| units.contains(u));

    groups.iter().enumerate().any(|(i, a)| {
        groups.iter().enumerate().any(|(j, b)| {
            i != j
                && moving(a)
                && moving(b)
                && a.category.unit_type == b.category.unit_type
                && !(all_in(a) && all_in(b))
                && (any_in(a) || any_in(b))
        })
    })
}
