//! Season execution.
//!
//! [`DefaultTournament`] walks the fixtures produced by [`build_season`], hands every real match
//! to the [`RuleEngine`] and settles bye matches itself. Each outcome is broadcast to the
//! registered [`TournamentListener`]s, in registration order, and then handed to the caller's
//! sink before the next match starts.
//!
//! By default any failure (rule engine error, inconsistent outcome, listener error) aborts the
//! season. With [`DefaultTournament::with_isolate_failures`] a failed game is replaced by a
//! forfeit and a failing listener is skipped.

use anyhow::{bail, Context};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::game_interface::{GameOutcome, OutcomeError, RuleEngine};
use crate::season::{build_season, Contestant, Match};

/// Observer notified after every game of a season.
pub trait TournamentListener<C>: Send {
    /// Called once per match, bye matches included.
    fn game_ended(&mut self, fixture: &Match<C>, outcome: &GameOutcome<C>) -> anyhow::Result<()>;
}

/// Something able to play a whole season. The server only relies on this trait.
pub trait Tournament<C>: Send {
    /// Plays every match of one season between `contestants`.
    ///
    /// Outcomes are given to `sink` in fixture order.
    fn play_season(
        &mut self,
        contestants: &[C],
        sink: &mut dyn FnMut(GameOutcome<C>),
    ) -> anyhow::Result<SeasonSummary>;
}

/// Counters of a finished season.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeasonSummary {
    /// Number of matchdays.
    pub matchdays: usize,
    /// Games actually played by the rule engine.
    pub games: usize,
    /// Automatic wins against the bye.
    pub byes: usize,
    /// Games replaced by a forfeit.
    pub forfeits: usize,
}

impl SeasonSummary {
    /// Every match of the season, synthetic ones included.
    pub fn matches(&self) -> usize {
        self.games + self.byes + self.forfeits
    }
}

/// Plays seasons with a [`RuleEngine`].
pub struct DefaultTournament<C, E> {
    engine: E,
    listeners: Vec<Box<dyn TournamentListener<C>>>,
    isolate_failures: bool,
}

impl<C: Contestant, E: RuleEngine<C>> DefaultTournament<C, E> {
    /// Creates a fail-fast tournament without listeners.
    pub fn new(engine: E) -> Self {
        DefaultTournament {
            engine,
            listeners: vec![],
            isolate_failures: false,
        }
    }

    /// Turn engine failures into forfeits and skip failing listeners instead of aborting.
    pub fn with_isolate_failures(mut self, value: bool) -> Self {
        self.isolate_failures = value;
        self
    }

    /// Registers a listener. Listeners are called in registration order.
    pub fn add_tournament_listener(&mut self, listener: Box<dyn TournamentListener<C>>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn play_match(&mut self, fixture: &Match<C>) -> anyhow::Result<Played<C>> {
        if let Some(receiver) = fixture.bye_receiver() {
            trace!(?fixture, "bye");
            return Ok(Played::Bye(GameOutcome::bye(receiver.clone())));
        }
        let Some((first, second)) = fixture.real_pair() else {
            bail!("match without any contestant: {fixture:?}");
        };

        let result = self
            .engine
            .play_one_game(first, second)
            .with_context(|| format!("rule engine failed on {fixture:?}"))
            .and_then(|outcome| {
                check_outcome(fixture, &outcome)
                    .with_context(|| format!("rule engine reported {outcome:?}"))?;
                Ok(outcome)
            });

        match result {
            Ok(outcome) => Ok(Played::Game(outcome)),
            Err(e) if self.isolate_failures => {
                warn!("{e:#}, scoring as forfeit");
                Ok(Played::Forfeit(GameOutcome::forfeit(first.clone(), format!("{e:#}"))))
            }
            Err(e) => Err(e),
        }
    }

    fn broadcast(&mut self, fixture: &Match<C>, outcome: &GameOutcome<C>) -> anyhow::Result<()> {
        for (index, listener) in self.listeners.iter_mut().enumerate() {
            if let Err(e) = listener.game_ended(fixture, outcome) {
                if !self.isolate_failures {
                    return Err(e.context(format!("listener #{index} failed")));
                }
                error!("listener #{index} failed on {fixture:?}: {e:#}");
            }
        }
        Ok(())
    }
}

impl<C: Contestant, E: RuleEngine<C>> Tournament<C> for DefaultTournament<C, E> {
    #[instrument(skip_all, fields(contestants = contestants.len()))]
    fn play_season(
        &mut self,
        contestants: &[C],
        sink: &mut dyn FnMut(GameOutcome<C>),
    ) -> anyhow::Result<SeasonSummary> {
        let mut summary = SeasonSummary::default();

        for (day, matchday) in build_season(contestants).enumerate() {
            debug!(day, matches = matchday.len(), "matchday");
            summary.matchdays += 1;
            for fixture in matchday {
                let outcome = match self.play_match(&fixture)? {
                    Played::Game(outcome) => {
                        summary.games += 1;
                        outcome
                    }
                    Played::Bye(outcome) => {
                        summary.byes += 1;
                        outcome
                    }
                    Played::Forfeit(outcome) => {
                        summary.forfeits += 1;
                        outcome
                    }
                };
                self.broadcast(&fixture, &outcome)?;
                sink(outcome);
            }
        }

        info!(?summary, "season finished");
        Ok(summary)
    }
}

enum Played<C> {
    Game(GameOutcome<C>),
    Bye(GameOutcome<C>),
    Forfeit(GameOutcome<C>),
}

fn check_outcome<C: PartialEq>(
    fixture: &Match<C>,
    outcome: &GameOutcome<C>,
) -> Result<(), OutcomeError> {
    if fixture.opponent_of(&outcome.acting).is_none() {
        return Err(OutcomeError::ForeignContestant);
    }
    if outcome.is_bye() {
        // only the league grants byes
        return Err(OutcomeError::WinWithoutLine);
    }
    outcome.validate()
}
