//! # League Server
//!
//! A Rust crate running a never-ending double round-robin league for two-player board games,
//! with contestants joining and leaving over UDP.
//!
//! It provides:
//! - Fixture generation with the circle method, padded with a bye for odd fields ([`season`])
//! - Season execution against a pluggable rule engine ([`tournament`], [`game_interface`])
//! - Point standings kept by a tournament listener ([`score`])
//! - A UDP registration server starting seasons whenever at least two contestants are
//!   registered ([`server`], [`protocol`])
//!
//! Every pair of contestants meets twice per season, once with each side moving first. Seasons
//! run back to back on their own thread while registrations keep being answered.
//!
//! # Documentation Overview
//!
//! - For the pairing algorithm, see [`season::build_season`].
//! - For plugging in a game, implement [`RuleEngine`](crate::game_interface::RuleEngine).
//! - For observing games, implement [`TournamentListener`](crate::tournament::TournamentListener)
//!   or use [`ScoreListener`](crate::score::ScoreListener).
//! - For the wire protocol and the season lifecycle, see [`protocol`] and [`server`].
//! - For server settings, see [`Configuration`](crate::configuration::Configuration).
//!
//! # Usage Example
//!
//! Playing seasons directly, without the network:
//!
//! ```
//! use league_server::prelude::*;
//!
//! fn first_mover_wins(
//!     first: &&'static str,
//!     _second: &&'static str,
//! ) -> anyhow::Result<GameOutcome<&'static str>> {
//!     Ok(GameOutcome::win(*first, vec![WinningLine("a1-a4".into())]))
//! }
//!
//! let scores: ScoreListener<&'static str> = ScoreListener::new();
//! let mut tournament = DefaultTournament::new(first_mover_wins);
//! tournament.add_tournament_listener(Box::new(scores.clone()));
//!
//! let mut outcomes = vec![];
//! let summary = tournament
//!     .play_season(&["alice", "bob", "carol"], &mut |o| outcomes.push(o))
//!     .unwrap();
//!
//! // 3 contestants + bye: 6 matchdays of 2 matches, half of them byes
//! assert_eq!(summary.matches(), 12);
//! assert_eq!(summary.byes, 6);
//! assert_eq!(scores.score_sheet().total(), 12.0);
//! ```
#![warn(missing_docs)]

pub use anyhow;
pub mod configuration;
pub mod game_interface;
pub mod logger;
pub mod protocol;
pub mod registration;
pub mod score;
pub mod season;
pub mod server;
pub mod tournament;

/// Commonly used types and traits for quick access.
///
/// ```rust
/// use league_server::prelude::*;
/// ```
pub mod prelude {
    pub use crate::configuration::Configuration;
    pub use crate::game_interface::{GameOutcome, OutcomeKind, RuleEngine, WinningLine};
    pub use crate::registration::Registration;
    pub use crate::score::{ScoreListener, ScoreSheet};
    pub use crate::season::{build_season, Contestant, Entrant, Match, Matchday};
    pub use crate::server::{Server, ServerHandle};
    pub use crate::tournament::{DefaultTournament, Tournament, TournamentListener};
}
