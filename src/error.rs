//! Unified error types for the relay node firmware.
//!
//! Three families:
//!
//! - [`CommandError`]: an operator sent something the interpreter will not
//!   apply.  Always answered with an `error` response; never mutates state.
//! - [`TransportError`]: the broker / socket is unreachable or refused a
//!   message.  Recovered by reconnecting; individual publish failures are
//!   logged and dropped.
//! - [`ConnectivityError`]: the Wi-Fi station could not be configured or
//!   could not associate.  Retried by the lifecycle like a broker failure.
//!
//! Boot-time failures funnel into [`Error`] so the binary's setup path can
//! use `?`.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Station credentials were rejected.
    Network(ConnectivityError),
    /// Peripheral or service initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Network(e)
    }
}

// ---------------------------------------------------------------------------
// Command validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Not a command this node understands; carries the full line verbatim.
    UnknownCommand(String),
    /// A setter was sent without its `:<value>` part.
    MissingArgument(&'static str),
    /// A bare command was sent with a `:<value>` part.
    UnexpectedArgument(&'static str),
    /// Argument failed strict parsing or the range check.
    InvalidValue { command: &'static str, value: String },
    /// Device name empty, too long, or containing topic metacharacters.
    InvalidName(String),
    /// Inbound line does not fit the command buffer.
    LineTooLong(usize),
    /// Inbound queue is saturated; the line was not accepted.
    QueueFull,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(text) => write!(f, "Unknown command: {text}"),
            Self::MissingArgument(cmd) => write!(f, "Missing value for {cmd}"),
            Self::UnexpectedArgument(cmd) => write!(f, "{cmd} takes no value"),
            Self::InvalidValue { command, value } => {
                write!(f, "Invalid {command} value: {value}")
            }
            Self::InvalidName(name) => write!(f, "Invalid GHAFEER_NAME: '{name}'"),
            Self::LineTooLong(len) => write!(f, "Command too long ({len} bytes)"),
            Self::QueueFull => write!(f, "Command queue full"),
        }
    }
}

impl core::error::Error for CommandError {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Operation requires an established session.
    NotConnected,
    /// Broker / socket could not be reached.
    ConnectFailed,
    /// The message was refused or could not be queued.
    PublishFailed,
    /// Topic (un)subscription was refused.
    SubscribeFailed,
    /// Underlying socket I/O error.
    Io,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// Wi-Fi station errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl core::error::Error for ConnectivityError {}
