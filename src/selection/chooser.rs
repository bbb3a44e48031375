//! The one question the machine can put to the player: "pick some of these
//! units". Everything from seeding a selection to confirming carriers goes
//! through `UnitChooser`.

use std::collections::VecDeque;
use std::fmt;

use crate::board::{categorize, BoardState, CategoryKeys, UnitId};

/// Why the player is being asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoicePurpose {
    SelectUnits,
    LoadTransports,
    UnloadTransports,
    AirTransports,
    Paratroopers,
    RefineSelection,
}

impl fmt::Display for ChoicePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChoicePurpose::SelectUnits => "select",
            ChoicePurpose::LoadTransports => "load",
            ChoicePurpose::UnloadTransports => "unload",
            ChoicePurpose::AirTransports => "airtransports",
            ChoicePurpose::Paratroopers => "paratroopers",
            ChoicePurpose::RefineSelection => "refine",
        };
        f.write_str(s)
    }
}

/// Candidates with a precomputed default and category grouping hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceRequest {
    pub purpose: ChoicePurpose,
    pub title: String,
    pub candidates: Vec<UnitId>,
    pub defaults: Vec<UnitId>,
    /// Candidates grouped by interchangeable category.
    pub groups: Vec<Vec<UnitId>>,
    /// Upper bound on the answer size, if any.
    pub max: Option<usize>,
}

impl ChoiceRequest {
    pub fn new(
        board: &BoardState,
        purpose: ChoicePurpose,
        title: impl Into<String>,
        candidates: Vec<UnitId>,
        keys: &CategoryKeys<'_>,
    ) -> Self {
        let groups = categorize(board, &candidates, keys)
            .into_iter()
            .map(|g| g.units)
            .collect();
        Self {
            purpose,
            title: title.into(),
            candidates,
            defaults: Vec::new(),
            groups,
            max: None,
        }
    }

    pub fn with_defaults(mut self, defaults: Vec<UnitId>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// True when every picked unit is a distinct candidate and the size
    /// limit holds.
    pub fn admits(&self, picked: &[UnitId]) -> bool {
        let distinct = picked.iter().enumerate().all(|(i, u)| !picked[..i].contains(u));
        distinct
            && picked.iter().all(|u| self.candidates.contains(u))
            && self.max.map_or(true, |m| picked.len() <= m)
    }
}

/// Something that answers choice requests. `None` means the player cancelled.
pub trait UnitChooser {
    fn choose(&mut self, board: &BoardState, request: &ChoiceRequest) -> Option<Vec<UnitId>>;
}

/// Accepts every default without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptDefaults;

impl UnitChooser for AcceptDefaults {
    fn choose(&mut self, _board: &BoardState, request: &ChoiceRequest) -> Option<Vec<UnitId>> {
        Some(request.defaults.clone())
    }
}

/// Replays queued answers in order, then falls back to the defaults.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChooser {
    answers: VecDeque<Option<Vec<UnitId>>>,
    asked: Vec<ChoiceRequest>,
}

impl ScriptedChooser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a selection.
    pub fn answer(&mut self, units: Vec<UnitId>) {
        self.answers.push_back(Some(units));
    }

    /// Queues a cancellation.
    pub fn cancel(&mut self) {
        self.answers.push_back(None);
    }

    pub fn pending(&self) -> usize {
        self.answers.len()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Requests seen so far, oldest first.
    pub fn asked(&self) -> &[ChoiceRequest] {
        &self.asked
    }

    /// Drains the request log.
    pub fn take_asked(&mut self) -> Vec<ChoiceRequest> {
        std::mem::take(&mut self.asked)
    }
}

impl UnitChooser for ScriptedChooser {
    fn choose(&mut self, _board: &BoardState, request: &ChoiceRequest) -> Option<Vec<UnitId>> {
        self.asked.push(request.clone());
        match self.answers.pop_front() {
            Some(answer) => answer,
            None => Some(request.defaults.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(candidates: &[u32], max: Option<usize>) -> ChoiceRequest {
        ChoiceRequest {
            purpose: ChoicePurpose::SelectUnits,
            title: "pick".into(),
            candidates: candidates.iter().map(|&n| UnitId(n)).collect(),
            defaults: vec![UnitId(candidates[0])],
            groups: Vec::new(),
            max,
        }
    }

    #[test]
    fn admits_checks_membership_duplicates_and_size() {
        let r = request(&[1, 2, 3], Some(2));
        assert!(r.admits(&[UnitId(1), UnitId(3)]));
        assert!(!r.admits(&[UnitId(4)]));
        assert!(!r.admits(&[UnitId(1), UnitId(1)]));
        assert!(!r.admits(&[UnitId(1), UnitId(2), UnitId(3)]));
    }

    #[test]
    fn scripted_answers_then_defaults() {
        let board = BoardState::new();
        let r = request(&[1, 2], None);
        let mut chooser = ScriptedChooser::new();
        chooser.answer(vec![UnitId(2)]);
        chooser.cancel();

        assert_eq!(chooser.choose(&board, &r), Some(vec![UnitId(2)]));
        assert_eq!(chooser.choose(&board, &r), None);
        assert_eq!(chooser.choose(&board, &r), Some(vec![UnitId(1)]));
        assert_eq!(chooser.asked().len(), 3);
        assert_eq!(chooser.pending(), 0);
    }
}
