use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use league_server::prelude::*;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const MAX_PLAYERS: usize = 20;
const MAX_SEASONS: usize = 10;

fn init_test_logger() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

type Opponents = Arc<Mutex<HashMap<String, Vec<String>>>>;

/// Plays pseudo-random but reproducible games and remembers who met whom.
struct MockBoard {
    state: u64,
    opponents: Opponents,
}

impl MockBoard {
    fn new(seed: u64, opponents: Opponents) -> Self {
        MockBoard {
            state: seed | 1,
            opponents,
        }
    }

    fn next(&mut self) -> u64 {
        // xorshift64
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }
}

impl RuleEngine<String> for MockBoard {
    fn play_one_game(
        &mut self,
        first: &String,
        second: &String,
    ) -> anyhow::Result<GameOutcome<String>> {
        {
            let mut opponents = self.opponents.lock().unwrap();
            opponents.entry(first.clone()).or_default().push(second.clone());
            opponents.entry(second.clone()).or_default().push(first.clone());
        }

        let acting = if self.next() % 2 == 0 { first } else { second }.clone();
        Ok(match self.next() % 3 {
            0 => GameOutcome::win(acting, vec![WinningLine(format!("col {}", self.next() % 7))]),
            1 => GameOutcome::draw(acting),
            _ => GameOutcome::lose(acting, "illegal move"),
        })
    }
}

fn create_players(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("P{i}")).collect()
}

struct Run {
    outcomes: Vec<GameOutcome<String>>,
    opponents: HashMap<String, Vec<String>>,
    sheet: ScoreSheet<String>,
}

fn play_seasons(players: &[String], seasons: usize) -> Run {
    let opponents = Opponents::default();
    let scores: ScoreListener<String> = ScoreListener::new();
    let seed = (players.len() * 31 + seasons) as u64;
    let mut tournament: DefaultTournament<String, _> =
        DefaultTournament::new(MockBoard::new(seed, opponents.clone()));
    tournament.add_tournament_listener(Box::new(scores.clone()));

    let mut outcomes = vec![];
    for _ in 0..seasons {
        tournament
            .play_season(players, &mut |o| outcomes.push(o))
            .unwrap();
    }

    let opponents = opponents.lock().unwrap().clone();
    Run {
        outcomes,
        opponents,
        sheet: scores.score_sheet(),
    }
}

fn verify_sum_of_points(run: &Run, players: usize, seasons: usize) {
    let real_players = if players % 2 == 0 { players } else { players + 1 };
    let games_per_day = real_players / 2;
    let expected = (2 * real_players.saturating_sub(1) * games_per_day * seasons) as f64;
    assert_eq!(run.sheet.total(), expected, "{players} players, {seasons} seasons");
}

fn verify_players(run: &Run, players: &[String], seasons: usize) {
    if players.len() < 2 || seasons == 0 {
        assert!(run.opponents.is_empty());
        return;
    }
    let expected = (players.len() - 1) * seasons * 2;
    for player in players {
        assert_eq!(run.opponents[player].len(), expected, "{player}");
    }
}

fn verify_game_states(run: &Run) {
    for outcome in run.outcomes.iter().filter(|o| !o.is_bye()) {
        if outcome.kind == OutcomeKind::Win {
            assert!(!outcome.winning_lines.is_empty(), "{outcome:?}");
        } else {
            assert!(outcome.winning_lines.is_empty(), "{outcome:?}");
        }
        if outcome.kind == OutcomeKind::Lose {
            let reason = outcome.reason.as_deref().unwrap_or_default();
            assert!(!reason.is_empty(), "{outcome:?}");
        }
    }
}

#[test]
fn amount_of_games_2_players() {
    init_test_logger();
    let players = create_players(2);
    let run = play_seasons(&players, 1);
    verify_game_states(&run);
    verify_players(&run, &players, 1);
    verify_sum_of_points(&run, 2, 1);
}

#[test]
fn amount_of_games_3_players() {
    init_test_logger();
    let players = create_players(3);
    let run = play_seasons(&players, 1);
    verify_game_states(&run);
    verify_players(&run, &players, 1);
    verify_sum_of_points(&run, 3, 1);
    assert_eq!(run.outcomes.iter().filter(|o| o.is_bye()).count(), 6);
}

#[test]
fn amount_of_games_4_players() {
    init_test_logger();
    let players = create_players(4);
    let run = play_seasons(&players, 1);
    verify_game_states(&run);
    verify_players(&run, &players, 1);
    verify_sum_of_points(&run, 4, 1);
}

#[test]
fn every_field_size_and_season_count() {
    init_test_logger();
    for count in 0..=MAX_PLAYERS {
        let players = create_players(count);
        for seasons in 0..=MAX_SEASONS {
            let run = play_seasons(&players, seasons);
            verify_game_states(&run);
            verify_players(&run, &players, seasons);
            verify_sum_of_points(&run, count, seasons);
        }
    }
}

#[test]
fn lone_player_collects_byes() {
    let players = create_players(1);
    let run = play_seasons(&players, 3);
    assert!(run.outcomes.iter().all(GameOutcome::is_bye));
    assert_eq!(run.sheet.points(&players[0]), Some(6.0));
    assert!(run.opponents.is_empty());
}

#[test]
fn standings_survive_a_smaller_next_season() {
    let players = create_players(4);
    let scores: ScoreListener<String> = ScoreListener::new();
    let mut tournament: DefaultTournament<String, _> =
        DefaultTournament::new(MockBoard::new(7, Opponents::default()));
    tournament.add_tournament_listener(Box::new(scores.clone()));

    tournament.play_season(&players, &mut |_| {}).unwrap();
    tournament.play_season(&players[..2], &mut |_| {}).unwrap();

    let sheet = scores.score_sheet();
    assert_eq!(sheet.len(), 4);
    assert_eq!(sheet.total(), 12.0 + 2.0);
}

#[test]
fn forfeits_keep_the_point_total() {
    let players = create_players(5);
    let scores: ScoreListener<String> = ScoreListener::new();
    let mut tournament: DefaultTournament<String, _> = DefaultTournament::new(
        |first: &String, second: &String| -> anyhow::Result<GameOutcome<String>> {
            if first == "P0" || second == "P0" {
                anyhow::bail!("P0 disconnected");
            }
            Ok(GameOutcome::win(first.clone(), vec![WinningLine("row 1".into())]))
        },
    )
    .with_isolate_failures(true);
    tournament.add_tournament_listener(Box::new(scores.clone()));

    let summary = tournament.play_season(&players, &mut |_| {}).unwrap();

    assert_eq!(summary.forfeits, 8);
    assert_eq!(summary.byes, 10);
    assert_eq!(summary.games, 12);
    assert_eq!(scores.score_sheet().total(), summary.matches() as f64);
}
