//! Identity of a contestant connected to the server.

use std::{
    fmt,
    hash::Hash,
    net::{IpAddr, SocketAddr},
};

/// A contestant registered over UDP.
///
/// Identity is the name plus the host it registered from: the same name from another host is a
/// different contestant, while a re-registration from the same host (even from a new port) is the
/// same one. `reply_to` is where datagrams for this contestant go.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Name given in `REGISTER;<name>`.
    pub name: String,
    /// Sender address of the latest registration.
    pub reply_to: SocketAddr,
}

impl PartialEq for Registration {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.host() == other.host()
    }
}

impl Eq for Registration {}

impl Hash for Registration {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.host().hash(state);
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.reply_to)
    }
}

impl Registration {
    /// A registration for `name` answered at `reply_to`.
    pub fn new(name: impl Into<String>, reply_to: SocketAddr) -> Registration {
        Registration {
            name: name.into(),
            reply_to,
        }
    }

    /// Origin host, the part of the address that identifies the contestant.
    pub fn host(&self) -> IpAddr {
        self.reply_to.ip()
    }
}
