//! Module defining what the rule engine has to implement and what it reports back.

use std::fmt;

use thiserror::Error;

/// Reason attached to the automatic win granted against the bye.
pub const BYE_REASON: &str = "bye";

/// Prefix of the reason attached to a forfeit replacing a failed game.
pub const FORFEIT_REASON_PREFIX: &str = "forfeit";

/// Result of a game from the acting contestant's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// The acting contestant won.
    Win,
    /// Nobody won.
    Draw,
    /// The acting contestant lost.
    Lose,
}

/// Marker of a winning line on the board (e.g. the cells of a connected row).
///
/// Opaque to the league: the rule engine decides what it contains.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WinningLine(pub String);

impl fmt::Display for WinningLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOutcome<C> {
    /// Win, draw or loss of `acting`.
    pub kind: OutcomeKind,
    /// The contestant whose move ended the game.
    pub acting: C,
    /// Why the game ended. Required for a loss.
    pub reason: Option<String>,
    /// Winning lines. Non-empty iff `kind` is a win, except for bye wins.
    pub winning_lines: Vec<WinningLine>,
}

/// Broken [`GameOutcome`] invariant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutcomeError {
    /// A win must name at least one winning line.
    #[error("win without winning line")]
    WinWithoutLine,
    /// Only a win can have winning lines.
    #[error("{0:?} with {1} winning line(s)")]
    LinesWithoutWin(OutcomeKind, usize),
    /// A loss must come with a reason.
    #[error("loss without reason")]
    LossWithoutReason,
    /// The acting contestant is not part of the game.
    #[error("acting contestant did not play this game")]
    ForeignContestant,
}

impl<C> GameOutcome<C> {
    /// `acting` won through `winning_lines`.
    pub fn win(acting: C, winning_lines: Vec<WinningLine>) -> Self {
        GameOutcome {
            kind: OutcomeKind::Win,
            acting,
            reason: None,
            winning_lines,
        }
    }

    /// The game ended in a draw on `acting`'s move.
    pub fn draw(acting: C) -> Self {
        GameOutcome {
            kind: OutcomeKind::Draw,
            acting,
            reason: None,
            winning_lines: vec![],
        }
    }

    /// `acting` lost, e.g. by playing an illegal move.
    pub fn lose(acting: C, reason: impl Into<String>) -> Self {
        GameOutcome {
            kind: OutcomeKind::Lose,
            acting,
            reason: Some(reason.into()),
            winning_lines: vec![],
        }
    }

    /// Automatic win of `receiver` against the bye.
    pub fn bye(receiver: C) -> Self {
        GameOutcome {
            kind: OutcomeKind::Win,
            acting: receiver,
            reason: Some(BYE_REASON.to_owned()),
            winning_lines: vec![],
        }
    }

    /// Replaces a game the rule engine could not play. Scored as a draw.
    pub fn forfeit(acting: C, cause: impl fmt::Display) -> Self {
        GameOutcome {
            kind: OutcomeKind::Draw,
            acting,
            reason: Some(format!("{FORFEIT_REASON_PREFIX}: {cause}")),
            winning_lines: vec![],
        }
    }

    /// Builder-style reason setter.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// True for the synthetic win against the bye.
    pub fn is_bye(&self) -> bool {
        self.kind == OutcomeKind::Win
            && self.winning_lines.is_empty()
            && self.reason.as_deref() == Some(BYE_REASON)
    }

    /// True for a synthetic forfeit.
    pub fn is_forfeit(&self) -> bool {
        self.reason
            .as_deref()
            .is_some_and(|r| r.starts_with(FORFEIT_REASON_PREFIX))
    }

    /// Checks the invariants between kind, reason and winning lines.
    pub fn validate(&self) -> Result<(), OutcomeError> {
        if self.is_bye() {
            return Ok(());
        }
        match self.kind {
            OutcomeKind::Win if self.winning_lines.is_empty() => Err(OutcomeError::WinWithoutLine),
            OutcomeKind::Win => Ok(()),
            kind if !self.winning_lines.is_empty() => {
                Err(OutcomeError::LinesWithoutWin(kind, self.winning_lines.len()))
            }
            OutcomeKind::Lose if self.reason.as_deref().map_or(true, str::is_empty) => {
                Err(OutcomeError::LossWithoutReason)
            }
            _ => Ok(()),
        }
    }
}

/// What the board game should implement to play league fixtures.
///
/// The league never calls it for a match against the bye.
pub trait RuleEngine<C>: Send {
    /// Plays a single game, `first` moving first, and reports how it ended.
    ///
    /// The outcome's `acting` contestant must be `first` or `second`.
    ///
    /// # Error
    /// Returned when the game could not be played at all (lost connection, engine bug, ...).
    fn play_one_game(&mut self, first: &C, second: &C) -> anyhow::Result<GameOutcome<C>>;
}

impl<C, F> RuleEngine<C> for F
where
    F: FnMut(&C, &C) -> anyhow::Result<GameOutcome<C>> + Send,
{
    fn play_one_game(&mut self, first: &C, second: &C) -> anyhow::Result<GameOutcome<C>> {
        self(first, second)
    }
}
