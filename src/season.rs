//! Double round-robin fixture generation.
//!
//! A [`Season`] is built with the circle method: when the number of contestants is odd a
//! synthetic [`Entrant::Bye`] is appended, the first entrant stays fixed and the others rotate
//! one position per [`Matchday`]. One rotation cycle is a [`Round`], in which every pair of
//! entrants meets exactly once. The second round of a season replays the first one with
//! first-mover and second-mover swapped, so every pair meets exactly twice, once with each side
//! moving first.
//!
//! Everything here is pure: the same input order always yields the same fixtures.
//!
//! ```
//! use league_server::season::build_season;
//!
//! let matchdays: Vec<_> = build_season(&["a", "b", "c", "d"]).collect();
//! assert_eq!(matchdays.len(), 6);
//! assert!(matchdays.iter().all(|day| day.len() == 2));
//! ```

use std::{fmt, hash::Hash};

/// Anything that can take part in a league.
///
/// Implemented for every type with value equality that can be moved to the season thread.
pub trait Contestant: Clone + Eq + Hash + fmt::Debug + Send + 'static {}

impl<T: Clone + Eq + Hash + fmt::Debug + Send + 'static> Contestant for T {}

/// One side of a [`Match`]: either a real contestant or the bye used to even out the field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Entrant<C> {
    /// A registered contestant.
    Real(C),
    /// Synthetic opponent. A match against it is never played.
    Bye,
}

impl<C> Entrant<C> {
    /// The contestant behind this entrant, `None` for the bye.
    pub fn as_real(&self) -> Option<&C> {
        match self {
            Entrant::Real(c) => Some(c),
            Entrant::Bye => None,
        }
    }

    /// True for [`Entrant::Bye`].
    pub fn is_bye(&self) -> bool {
        matches!(self, Entrant::Bye)
    }
}

impl<C: fmt::Display> fmt::Display for Entrant<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entrant::Real(c) => write!(f, "{c}"),
            Entrant::Bye => write!(f, "<bye>"),
        }
    }
}

/// A scheduled pairing. `first` moves first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Match<C> {
    /// The entrant making the first move.
    pub first: Entrant<C>,
    /// The entrant moving second.
    pub second: Entrant<C>,
}

impl<C> Match<C> {
    /// Creates a match where `first` moves first.
    pub fn new(first: Entrant<C>, second: Entrant<C>) -> Self {
        Match { first, second }
    }

    /// Same pairing with the first-mover swapped.
    #[must_use]
    pub fn reversed(self) -> Self {
        Match {
            first: self.second,
            second: self.first,
        }
    }

    /// True when one side is the bye.
    pub fn is_bye(&self) -> bool {
        self.first.is_bye() || self.second.is_bye()
    }

    /// Both contestants in first-mover order, `None` for a bye match.
    pub fn real_pair(&self) -> Option<(&C, &C)> {
        Some((self.first.as_real()?, self.second.as_real()?))
    }

    /// The real contestant of a bye match.
    pub fn bye_receiver(&self) -> Option<&C> {
        match (&self.first, &self.second) {
            (Entrant::Real(c), Entrant::Bye) | (Entrant::Bye, Entrant::Real(c)) => Some(c),
            _ => None,
        }
    }
}

impl<C: PartialEq> Match<C> {
    /// The entrant facing `contestant`, or `None` if `contestant` does not play in this match.
    pub fn opponent_of(&self, contestant: &C) -> Option<&Entrant<C>> {
        if self.first.as_real() == Some(contestant) {
            Some(&self.second)
        } else if self.second.as_real() == Some(contestant) {
            Some(&self.first)
        } else {
            None
        }
    }
}

impl<C: fmt::Display> fmt::Display for Match<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} VS {}]", self.first, self.second)
    }
}

/// The matches of one day. No entrant appears twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchday<C> {
    matches: Vec<Match<C>>,
}

impl<C> Matchday<C> {
    /// All matches of the day, in playing order.
    pub fn matches(&self) -> &[Match<C>] {
        &self.matches
    }

    /// Number of matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// True when the day holds no match.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Same matchday with every match reversed.
    #[must_use]
    pub fn reversed(self) -> Self {
        Matchday {
            matches: self.matches.into_iter().map(Match::reversed).collect(),
        }
    }
}

impl<C> IntoIterator for Matchday<C> {
    type Item = Match<C>;
    type IntoIter = std::vec::IntoIter<Match<C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

/// A single round-robin cycle over a fixed entrant order.
#[derive(Debug, Clone)]
pub struct Round<C> {
    entrants: Vec<Entrant<C>>,
}

impl<C: Clone> Round<C> {
    /// Pads `contestants` with a bye if their number is odd.
    pub fn new(contestants: &[C]) -> Self {
        let mut entrants: Vec<_> = contestants.iter().cloned().map(Entrant::Real).collect();
        if entrants.len() % 2 == 1 {
            entrants.push(Entrant::Bye);
        }
        Round { entrants }
    }

    /// Number of matchdays, one less than the (even) number of entrants.
    pub fn len(&self) -> usize {
        self.entrants.len().saturating_sub(1)
    }

    /// True for an empty field.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `day`-th matchday of the round.
    ///
    /// # Panics
    /// If `day >= self.len()`.
    pub fn matchday(&self, day: usize) -> Matchday<C> {
        let n = self.entrants.len();
        assert!(day < self.len(), "matchday {day} out of range");

        let rotating = n - 1;
        let seat = |position: usize| -> Entrant<C> {
            if position == 0 {
                self.entrants[0].clone()
            } else {
                self.entrants[1 + (position - 1 + day) % rotating].clone()
            }
        };

        let matches = (0..n / 2)
            .map(|i| {
                let outer = seat(i);
                let inner = seat(n - 1 - i);
                // the fixed entrant alternates sides, everyone else keeps the outer seat first
                if i == 0 && day % 2 == 1 {
                    Match::new(inner, outer)
                } else {
                    Match::new(outer, inner)
                }
            })
            .collect();

        Matchday { matches }
    }

    /// Iterates over the matchdays of the round.
    pub fn matchdays(&self) -> impl Iterator<Item = Matchday<C>> + '_ {
        (0..self.len()).map(|day| self.matchday(day))
    }
}

/// Two rounds over the same entrant order, the second with reversed sides.
#[derive(Debug, Clone)]
pub struct Season<C> {
    round: Round<C>,
}

impl<C: Clone> Season<C> {
    /// Creates the season for the given contestant order.
    pub fn new(contestants: &[C]) -> Self {
        Season {
            round: Round::new(contestants),
        }
    }

    /// Matchdays of the first round.
    pub fn first_round(&self) -> impl Iterator<Item = Matchday<C>> + '_ {
        self.round.matchdays()
    }

    /// Matchdays of the second round: the first round with every match reversed.
    pub fn second_round(&self) -> impl Iterator<Item = Matchday<C>> + '_ {
        self.round.matchdays().map(Matchday::reversed)
    }
}

impl<C: Clone> IntoIterator for Season<C> {
    type Item = Matchday<C>;
    type IntoIter = Matchdays<C>;

    fn into_iter(self) -> Matchdays<C> {
        Matchdays {
            round: self.round,
            next: 0,
        }
    }
}

/// Lazy iterator over all matchdays of a [`Season`].
#[derive(Debug, Clone)]
pub struct Matchdays<C> {
    round: Round<C>,
    next: usize,
}

impl<C: Clone> Iterator for Matchdays<C> {
    type Item = Matchday<C>;

    fn next(&mut self) -> Option<Matchday<C>> {
        let per_round = self.round.len();
        let day = self.next;
        if day >= 2 * per_round {
            return None;
        }
        self.next += 1;
        if day < per_round {
            Some(self.round.matchday(day))
        } else {
            Some(self.round.matchday(day - per_round).reversed())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (2 * self.round.len()).saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<C: Clone> ExactSizeIterator for Matchdays<C> {}

/// All matchdays of one season for `contestants`, in playing order.
pub fn build_season<C: Clone>(contestants: &[C]) -> Matchdays<C> {
    Season::new(contestants).into_iter()
}
