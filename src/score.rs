//! Point standings.
//!
//! [`ScoreListener`] is a [`TournamentListener`] crediting points after every game:
//!
//! | outcome | acting contestant | opponent |
//! |---------|-------------------|----------|
//! | win     | 1                 | 0        |
//! | draw    | 0.5               | 0.5      |
//! | lose    | 0                 | 1        |
//!
//! Every game hands out exactly one point, byes included (the bye itself never scores).

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::anyhow;
use tracing::trace;

use crate::game_interface::{GameOutcome, OutcomeKind};
use crate::season::{Contestant, Entrant, Match};
use crate::tournament::TournamentListener;

const FULL_POINT: f64 = 1.0;
const HALF_POINT: f64 = 0.5;
const ZERO: f64 = 0.0;

/// Accumulated points per contestant. Contestants are never removed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSheet<C: Contestant> {
    points: HashMap<C, f64>,
}

impl<C: Contestant> Default for ScoreSheet<C> {
    fn default() -> Self {
        ScoreSheet {
            points: HashMap::new(),
        }
    }
}

impl<C: Contestant> ScoreSheet<C> {
    /// An empty sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` to the points of `contestant`, who starts at zero.
    pub fn credit(&mut self, contestant: &C, value: f64) {
        *self.points.entry(contestant.clone()).or_insert(ZERO) += value;
    }

    /// Points of `contestant`, `None` if they never played.
    pub fn points(&self, contestant: &C) -> Option<f64> {
        self.points.get(contestant).copied()
    }

    /// Sum of all points.
    pub fn total(&self) -> f64 {
        self.points.values().sum()
    }

    /// Number of contestants on the sheet.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True before the first credit.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Contestants by decreasing points.
    pub fn ranking(&self) -> Vec<(C, f64)> {
        let mut ranking: Vec<_> = self.points.iter().map(|(c, p)| (c.clone(), *p)).collect();
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranking
    }

    /// Iterates over all entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&C, f64)> {
        self.points.iter().map(|(c, p)| (c, *p))
    }
}

/// Listener keeping a [`ScoreSheet`] up to date.
///
/// Clones share the same sheet, so one clone can be given to the tournament while another one
/// is kept to read the standings.
#[derive(Debug, Clone)]
pub struct ScoreListener<C: Contestant> {
    sheet: Arc<Mutex<ScoreSheet<C>>>,
}

impl<C: Contestant> Default for ScoreListener<C> {
    fn default() -> Self {
        ScoreListener {
            sheet: Arc::default(),
        }
    }
}

impl<C: Contestant> ScoreListener<C> {
    /// A listener with an empty sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current standings.
    pub fn score_sheet(&self) -> ScoreSheet<C> {
        self.sheet
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn credits(
        fixture: &Match<C>,
        outcome: &GameOutcome<C>,
    ) -> anyhow::Result<(f64, Option<C>, f64)> {
        let opponent = match fixture.opponent_of(&outcome.acting) {
            Some(Entrant::Real(c)) => Some(c.clone()),
            Some(Entrant::Bye) => None,
            None => {
                return Err(anyhow!(
                    "{:?} is not part of {fixture:?}",
                    outcome.acting
                ))
            }
        };
        let (acting, other) = match outcome.kind {
            OutcomeKind::Win => (FULL_POINT, ZERO),
            OutcomeKind::Draw => (HALF_POINT, HALF_POINT),
            OutcomeKind::Lose => (ZERO, FULL_POINT),
        };
        Ok((acting, opponent, other))
    }
}

impl<C: Contestant> TournamentListener<C> for ScoreListener<C> {
    fn game_ended(&mut self, fixture: &Match<C>, outcome: &GameOutcome<C>) -> anyhow::Result<()> {
        let (acting_points, opponent, opponent_points) = Self::credits(fixture, outcome)?;

        let mut sheet = self.sheet.lock().unwrap_or_else(PoisonError::into_inner);
        sheet.credit(&outcome.acting, acting_points);
        if let Some(opponent) = opponent {
            sheet.credit(&opponent, opponent_points);
        }
        trace!(acting = ?outcome.acting, acting_points, opponent_points, "credited");
        Ok(())
    }
}
