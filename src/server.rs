//! UDP registration and season lifecycle.
//!
//! The [`Server`] owns the set of registered contestants and the tournament. Its receive loop
//! answers every datagram right away; seasons run on a separate thread so registrations are
//! never held up by a season in flight.
//!
//! # Lifecycle
//!
//! - After a `REGISTER` or `UNREGISTER` is applied, if no season is running and at least
//!   [`MIN_CONTESTANTS`] are registered, the registrations are snapshotted and a season starts.
//! - While a season runs, requests are answered but never start another one. The running season
//!   keeps its snapshot: late registrations wait for the next season, and contestants leaving
//!   mid-season still play out the current one.
//! - When a season ends, even through an error or a panic of the tournament, the start
//!   condition is evaluated again against the current registrations, and the next season starts
//!   immediately if it holds.
//!
//! The decision and the snapshot are taken under the single lobby lock, so two seasons can never
//! overlap.
//!
//! # Example
//!
//! ```no_run
//! use league_server::prelude::*;
//!
//! # fn engine(_: &Registration, _: &Registration) -> anyhow::Result<GameOutcome<Registration>> { todo!() }
//! fn main() -> anyhow::Result<()> {
//!     let config = Configuration::from_env();
//!
//!     let scores: ScoreListener<Registration> = ScoreListener::new();
//!     let mut tournament = DefaultTournament::new(engine)
//!         .with_isolate_failures(config.isolate_failures());
//!     tournament.add_tournament_listener(Box::new(scores.clone()));
//!
//!     let server = Server::bind(config, tournament)?;
//!     println!("listening on {}", server.local_addr()?);
//!     server.run()
//! }
//! ```

use std::{
    any::Any,
    io::ErrorKind,
    net::{SocketAddr, UdpSocket},
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread,
};

use anyhow::Context;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::configuration::Configuration;
use crate::game_interface::GameOutcome;
use crate::logger::init_logger_once;
use crate::protocol::{Command, Reply};
use crate::registration::Registration;
use crate::tournament::Tournament;

/// Registered contestants needed to start a season.
pub const MIN_CONTESTANTS: usize = 2;

/// Largest UDP payload over IPv4. Every datagram is read whole, so a long name is never cut
/// down to one that passes validation.
const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Server-wide run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No season in flight.
    Idle,
    /// A season is being played.
    Running,
}

/// Registration set plus run state. Every transition goes through this type.
#[derive(Debug)]
pub(crate) struct Lobby {
    registrations: Vec<Registration>,
    phase: Phase,
    max_name_length: usize,
}

impl Lobby {
    pub(crate) fn new(max_name_length: usize) -> Self {
        Lobby {
            registrations: vec![],
            phase: Phase::Idle,
            max_name_length,
        }
    }

    /// Applies one datagram. Returns the reply and, when a season has to start, its contestants.
    pub(crate) fn handle(
        &mut self,
        origin: SocketAddr,
        datagram: &[u8],
    ) -> (Reply, Option<Vec<Registration>>) {
        let command = match Command::parse(datagram, self.max_name_length) {
            Ok(command) => command,
            Err(e) => {
                debug!(%origin, "rejected: {e}");
                return (e.into(), None);
            }
        };

        let reply = match command {
            Command::Register { name } => self.register(Registration::new(name, origin)),
            Command::Unregister => self.unregister(origin),
        };
        let season = self.try_start();
        (reply, season)
    }

    fn register(&mut self, registration: Registration) -> Reply {
        let reply = Reply::Welcome(registration.name.clone());
        match self.registrations.iter_mut().find(|r| **r == registration) {
            Some(existing) => {
                debug!(%registration, "already registered");
                existing.reply_to = registration.reply_to;
            }
            None => {
                info!(%registration, "registered");
                self.registrations.push(registration);
            }
        }
        reply
    }

    fn unregister(&mut self, origin: SocketAddr) -> Reply {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.reply_to != origin);
        if self.registrations.len() == before {
            debug!(%origin, "unregister without registration");
            Reply::NotRegistered
        } else {
            info!(%origin, "unregistered");
            Reply::Unregistered
        }
    }

    /// Starts a season if idle with enough contestants.
    fn try_start(&mut self) -> Option<Vec<Registration>> {
        if self.phase == Phase::Idle && self.registrations.len() >= MIN_CONTESTANTS {
            self.phase = Phase::Running;
            Some(self.registrations.clone())
        } else {
            None
        }
    }

    /// Called when the running season ends. Returns the contestants of the next one, if any.
    pub(crate) fn finish_season(&mut self) -> Option<Vec<Registration>> {
        self.phase = Phase::Idle;
        self.try_start()
    }

    pub(crate) fn len(&self) -> usize {
        self.registrations.len()
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }
}

type OutcomeSink = Box<dyn FnMut(GameOutcome<Registration>) + Send>;

struct Shared<T> {
    lobby: Mutex<Lobby>,
    season: Mutex<Runner<T>>,
    seasons_started: AtomicUsize,
    shutdown: AtomicBool,
}

struct Runner<T> {
    tournament: T,
    sink: OutcomeSink,
}

/// A panicking listener or sink elsewhere must not take the receive loop down with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The league server.
pub struct Server<T> {
    socket: UdpSocket,
    shared: Arc<Shared<T>>,
}

impl<T: Tournament<Registration> + 'static> Server<T> {
    /// Binds the UDP socket described by `config`.
    ///
    /// Installs the global logger described by `config` first, unless the caller already
    /// installed a subscriber.
    #[instrument(skip(tournament))]
    pub fn bind(config: Configuration, tournament: T) -> anyhow::Result<Server<T>> {
        if init_logger_once(config.log, config.log_level)? {
            debug!(to_file = config.log, level = %config.log_level, "logger installed");
        }

        let socket = UdpSocket::bind(config.bind_address)
            .with_context(|| format!("could not bind UDP socket on {}", config.bind_address))?;
        socket
            .set_read_timeout(Some(config.poll_interval))
            .context("server error: setting read timeout")?;

        let sink: OutcomeSink = Box::new(|outcome| debug!(?outcome, "game ended"));
        Ok(Server {
            socket,
            shared: Arc::new(Shared {
                lobby: Mutex::new(Lobby::new(config.max_name_length)),
                season: Mutex::new(Runner { tournament, sink }),
                seasons_started: AtomicUsize::new(0),
                shutdown: AtomicBool::new(false),
            }),
        })
    }

    /// Replaces the sink receiving every outcome of every season.
    pub fn with_outcome_sink(
        self,
        sink: impl FnMut(GameOutcome<Registration>) + Send + 'static,
    ) -> Self {
        lock(&self.shared.season).sink = Box::new(sink);
        self
    }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.socket.local_addr().context("server error: no local address")
    }

    /// A handle to observe and stop the server from another thread.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shared: self.shared.clone(),
        }
    }

    /// Receives and answers datagrams until [`ServerHandle::shutdown`] is called.
    ///
    /// A season still running at shutdown is played to its end on its own thread.
    pub fn run(self) -> anyhow::Result<()> {
        info!(addr = ?self.socket.local_addr().ok(), "league server started");
        let mut buf = vec![0; MAX_DATAGRAM_SIZE];

        while !self.shared.shutdown.load(Ordering::Acquire) {
            let (n, origin) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    continue;
                }
                // e.g. ICMP port unreachable from an earlier reply on some platforms
                Err(e) if e.kind() == ErrorKind::ConnectionReset => {
                    trace!("ignored: {e}");
                    continue;
                }
                Err(e) => return Err(e).context("server error: receiving datagram"),
            };
            self.process(origin, &buf[..n]);
        }

        info!("league server stopped");
        Ok(())
    }

    fn process(&self, origin: SocketAddr, datagram: &[u8]) {
        trace!(%origin, datagram = %String::from_utf8_lossy(datagram), "received");
        let (reply, season) = lock(&self.shared.lobby).handle(origin, datagram);

        // reply before the season starts, so the welcome is never late
        if let Err(e) = self.socket.send_to(reply.to_string().as_bytes(), origin) {
            warn!(%origin, "could not send {reply}: {e}");
        }

        if let Some(contestants) = season {
            self.spawn_seasons(contestants);
        }
    }

    fn spawn_seasons(&self, contestants: Vec<Registration>) {
        let shared = self.shared.clone();
        let spawned = thread::Builder::new()
            .name("season".into())
            .spawn(move || run_seasons(&shared, contestants));
        if let Err(e) = spawned {
            // nothing runs, so the lobby must not stay in `Running`; the next request retries
            error!("could not spawn season thread: {e}");
            lock(&self.shared.lobby).phase = Phase::Idle;
        }
    }
}

/// Plays seasons back to back for as long as enough contestants are registered.
fn run_seasons<T: Tournament<Registration>>(shared: &Shared<T>, mut contestants: Vec<Registration>) {
    loop {
        let number = shared.seasons_started.fetch_add(1, Ordering::AcqRel) + 1;
        info!(number, contestants = contestants.len(), "season started");

        {
            let mut season = lock(&shared.season);
            let Runner { tournament, sink } = &mut *season;
            let played = panic::catch_unwind(AssertUnwindSafe(|| {
                tournament.play_season(&contestants, &mut **sink)
            }));
            match played {
                Ok(Ok(summary)) => info!(number, ?summary, "season ended"),
                Ok(Err(e)) => error!(number, "season aborted: {e:#}"),
                // the lobby must leave `Running` whatever happened
                Err(payload) => {
                    let message = panic_message(&*payload);
                    error!(number, "season aborted: panicked: {message}");
                }
            }
        }

        match lock(&shared.lobby).finish_season() {
            Some(next) => contestants = next,
            None => {
                debug!("not enough contestants, waiting");
                return;
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

/// Cloneable view of a running [`Server`].
pub struct ServerHandle {
    shared: Arc<dyn Status + Send + Sync>,
}

impl Clone for ServerHandle {
    fn clone(&self) -> Self {
        ServerHandle {
            shared: self.shared.clone(),
        }
    }
}

trait Status {
    fn lobby(&self) -> MutexGuard<'_, Lobby>;
    fn seasons_started(&self) -> usize;
    fn shutdown(&self);
}

impl<T: Send> Status for Shared<T> {
    fn lobby(&self) -> MutexGuard<'_, Lobby> {
        lock(&self.lobby)
    }

    fn seasons_started(&self) -> usize {
        self.seasons_started.load(Ordering::Acquire)
    }

    fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

impl ServerHandle {
    /// Number of registered contestants.
    pub fn registered_count(&self) -> usize {
        self.shared.lobby().len()
    }

    /// True while a season is in flight.
    pub fn is_running(&self) -> bool {
        self.shared.lobby().phase() == Phase::Running
    }

    /// Seasons started since the server was bound.
    pub fn seasons_started(&self) -> usize {
        self.shared.seasons_started()
    }

    /// Stops the receive loop within one poll interval.
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }
}
