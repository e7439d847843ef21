//! Text protocol spoken with contestants.
//!
//! One command per datagram, fields separated by `;`:
//!
//! | request            | reply                                              |
//! |--------------------|----------------------------------------------------|
//! | `REGISTER;<name>`  | `Welcome <name>`, `NO_NAME_GIVEN`, `NAME_TOO_LONG` |
//! | `UNREGISTER`       | `UNREGISTERED`, `NOT_REGISTERED`                   |
//! | anything else      | `UNKNOWN_COMMAND`                                  |

use std::fmt;

use thiserror::Error;

const FIELD_SEPARATOR: char = ';';
const REGISTER: &str = "REGISTER";
const UNREGISTER: &str = "UNREGISTER";

/// A well-formed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Join the league under `name`.
    Register {
        /// Already validated contestant name.
        name: String,
    },
    /// Leave the league.
    Unregister,
}

/// Rejected request. The `Display` output is the reply sent back.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// `REGISTER` without a usable name.
    #[error("NO_NAME_GIVEN")]
    NoNameGiven,
    /// `REGISTER` with a name over the configured maximum.
    #[error("NAME_TOO_LONG")]
    NameTooLong,
    /// Not a known command.
    #[error("UNKNOWN_COMMAND")]
    UnknownCommand,
}

/// Reply datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Registration accepted (possibly again).
    Welcome(String),
    /// Registration removed.
    Unregistered,
    /// `UNREGISTER` from an address holding no registration.
    NotRegistered,
    /// Malformed request.
    Rejected(ProtocolError),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Welcome(name) => write!(f, "Welcome {name}"),
            Reply::Unregistered => f.write_str("UNREGISTERED"),
            Reply::NotRegistered => f.write_str("NOT_REGISTERED"),
            Reply::Rejected(e) => write!(f, "{e}"),
        }
    }
}

impl From<ProtocolError> for Reply {
    fn from(e: ProtocolError) -> Self {
        Reply::Rejected(e)
    }
}

impl Command {
    /// Parses one datagram, checking the name length against `max_name_length` (in characters).
    ///
    /// Trailing line terminators are ignored, so is anything after the name field.
    pub fn parse(datagram: &[u8], max_name_length: usize) -> Result<Command, ProtocolError> {
        let text = std::str::from_utf8(datagram).map_err(|_| ProtocolError::UnknownCommand)?;
        let text = text.trim_end_matches(['\r', '\n']);
        let mut fields = text.split(FIELD_SEPARATOR);

        match fields.next().map(str::trim) {
            Some(REGISTER) => {
                let name = fields.next().map(str::trim).unwrap_or_default();
                if name.is_empty() {
                    Err(ProtocolError::NoNameGiven)
                } else if name.chars().count() > max_name_length {
                    Err(ProtocolError::NameTooLong)
                } else {
                    Ok(Command::Register {
                        name: name.to_owned(),
                    })
                }
            }
            Some(UNREGISTER) => Ok(Command::Unregister),
            _ => Err(ProtocolError::UnknownCommand),
        }
    }
}
