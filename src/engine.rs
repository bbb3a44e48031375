//! Engine state management.
//!
//! Holds the loaded board, the player to move, the rules options and the
//! selection machine, and answers each protocol command by writing response
//! lines to the given writer.

use std::io::{self, Write};

use tracing::{debug, info, warn};

use crate::board::{BoardState, PlayerId, UnitId};
use crate::config::{ConfigError, RulesOptions};
use crate::filter::PriorMove;
use crate::protocol::format::{format_choice, format_feedback, format_move, format_state};
use crate::protocol::{resolve_territory, ClickArgs, Scenario, ScenarioError};
use crate::selection::{
    ClickEvent, MouseButton, MoveDescription, MoveEnv, Outcome, ScriptedChooser, SelectionMachine,
};

/// Errors reported back to the driver as `error <message>`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no scenario loaded")]
    NoScenario,

    #[error("no player to move")]
    NoPlayer,

    #[error("unknown player '{0}'")]
    UnknownPlayer(String),

    #[error("unknown territory '{0}'")]
    UnknownTerritory(String),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Holds the mutable state of the engine between commands.
#[derive(Debug, Default)]
pub struct Engine {
    pub board: Option<BoardState>,
    pub player: Option<PlayerId>,
    pub options: RulesOptions,
    pub prior_moves: Vec<PriorMove>,
    /// Moves committed since the scenario was loaded, oldest first.
    pub moves: Vec<MoveDescription>,
    machine: SelectionMachine,
    chooser: ScriptedChooser,
}

impl Engine {
    /// Creates an engine with no scenario loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the board, rules and player with those of `scenario`.
    pub fn load_scenario(&mut self, scenario: Scenario) {
        self.board = Some(scenario.board);
        self.options = scenario.rules;
        self.player = scenario.player;
        self.prior_moves = scenario.prior_moves;
        self.moves.clear();
        self.machine = SelectionMachine::new();
        self.chooser.clear();
    }

    /// Sets the player to move. Any move being built is dropped.
    pub fn set_player(&mut self, name: &str) -> Result<(), EngineError> {
        let board = self.board.as_ref().ok_or(EngineError::NoScenario)?;
        let player = board
            .player_by_name(name)
            .ok_or_else(|| EngineError::UnknownPlayer(name.to_string()))?;
        self.player = Some(player);
        self.machine.cancel();
        Ok(())
    }

    /// Applies a rules option. Memoized routes are dropped since they depend
    /// on the rules.
    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), EngineError> {
        self.options.apply_option(name, value)?;
        self.machine.invalidate_routes();
        debug!(option = name, value = ?value, "option set");
        Ok(())
    }

    /// Queues an answer for the next choice request. `None` cancels it.
    pub fn queue_choice(&mut self, answer: Option<Vec<UnitId>>) {
        match answer {
            Some(units) => self.chooser.answer(units),
            None => self.chooser.cancel(),
        }
    }

    pub fn machine(&self) -> &SelectionMachine {
        &self.machine
    }

    /// Handles `load <path>`.
    pub fn handle_load<W: Write>(&mut self, path: &str, out: &mut W) -> io::Result<()> {
        match Scenario::from_path(path) {
            Ok(scenario) => {
                self.load_scenario(scenario);
                let (territories, units) = match &self.board {
                    Some(b) => (b.territories().len(), b.units().len()),
                    None => (0, 0),
                };
                info!(path, territories, units, "scenario loaded");
                writeln!(out, "loaded territories {} units {}", territories, units)?;
                out.flush()
            }
            Err(e) => report(out, &e.into()),
        }
    }

    /// Handles `setplayer <name>`. Silent on success.
    pub fn handle_setplayer<W: Write>(&mut self, name: &str, out: &mut W) -> io::Result<()> {
        match self.set_player(name) {
            Ok(()) => Ok(()),
            Err(e) => report(out, &e),
        }
    }

    /// Handles `setoption`. Silent on success.
    pub fn handle_setoption<W: Write>(
        &mut self,
        name: &str,
        value: Option<&str>,
        out: &mut W,
    ) -> io::Result<()> {
        match self.set_option(name, value) {
            Ok(()) => Ok(()),
            Err(e) => report(out, &e),
        }
    }

    /// Handles the `isready` command.
    pub fn handle_isready<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "readyok")?;
        out.flush()
    }

    /// Handles a click: echoes every choice request it raised, then the outcome.
    pub fn handle_click<W: Write>(&mut self, args: &ClickArgs, out: &mut W) -> io::Result<()> {
        let Some(board) = self.board.as_ref() else {
            return report(out, &EngineError::NoScenario);
        };
        let Some(player) = self.player else {
            return report(out, &EngineError::NoPlayer);
        };
        let Some(territory) = resolve_territory(board, &args.territory) else {
            return report(out, &EngineError::UnknownTerritory(args.territory.clone()));
        };

        let event = ClickEvent {
            territory,
            units: args.units.clone(),
            button: if args.right { MouseButton::Right } else { MouseButton::Left },
            modifiers: args.modifiers,
        };
        let env = MoveEnv::new(board, &self.options, player).with_prior_moves(&self.prior_moves);
        let outcome = self.machine.click(&env, &event, &mut self.chooser);

        for request in self.chooser.take_asked() {
            writeln!(out, "{}", format_choice(&request))?;
        }
        if self.chooser.pending() > 0 {
            warn!(unused = self.chooser.pending(), "dropping unused choice answers");
            self.chooser.clear();
        }

        match outcome {
            Outcome::Updated => {
                writeln!(out, "{}", format_state(board, self.machine.state()))?;
                writeln!(out, "{}", format_feedback(board, self.machine.feedback()))?;
            }
            Outcome::Committed(description) => {
                writeln!(out, "{}", format_move(&description)?)?;
                self.moves.push(description);
            }
            other => write_outcome(out, &other)?,
        }
        out.flush()
    }

    /// Handles `hover <territory>`.
    pub fn handle_hover<W: Write>(&mut self, territory: &str, out: &mut W) -> io::Result<()> {
        let Some(board) = self.board.as_ref() else {
            return report(out, &EngineError::NoScenario);
        };
        let Some(player) = self.player else {
            return report(out, &EngineError::NoPlayer);
        };
        let Some(id) = resolve_territory(board, territory) else {
            return report(out, &EngineError::UnknownTerritory(territory.to_string()));
        };

        let env = MoveEnv::new(board, &self.options, player).with_prior_moves(&self.prior_moves);
        match self.machine.hover(&env, id) {
            Outcome::Updated => writeln!(out, "{}", format_feedback(board, self.machine.feedback()))?,
            other => write_outcome(out, &other)?,
        }
        out.flush()
    }

    /// Handles `cancel`.
    pub fn handle_cancel<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let outcome = self.machine.cancel();
        write_outcome(out, &outcome)?;
        out.flush()
    }

    /// Handles `status`: the state line, then the feedback line while a move
    /// is being built.
    pub fn handle_status<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let Some(board) = self.board.as_ref() else {
            return report(out, &EngineError::NoScenario);
        };
        let state = self.machine.state();
        writeln!(out, "{}", format_state(board, state))?;
        if !state.is_idle() {
            writeln!(out, "{}", format_feedback(board, self.machine.feedback()))?;
        }
        out.flush()
    }
}

/// Single-line outcomes that need no board.
fn write_outcome<W: Write>(out: &mut W, outcome: &Outcome) -> io::Result<()> {
    match outcome {
        Outcome::Ignored => writeln!(out, "ignored"),
        Outcome::Updated => writeln!(out, "updated"),
        Outcome::Rejected(reason) => writeln!(out, "rejected {}", reason),
        Outcome::Committed(description) => writeln!(out, "{}", format_move(description)?),
        Outcome::Cancelled => writeln!(out, "cancelled"),
        Outcome::Aborted(error) => writeln!(out, "aborted {}", error),
    }
}

fn report<W: Write>(out: &mut W, error: &EngineError) -> io::Result<()> {
    warn!(%error, "command failed");
    writeln!(out, "error {}", error)?;
    out.flush()
}
