//! Inbound operator commands.
//!
//! One command per line, either a bare token (`REL_ON`) or `TOKEN:ARGUMENT`
//! split on the first colon.  Parsing is all-or-nothing: an argument that
//! is not exactly what the command expects rejects the whole line, so a
//! typo can never silently become `0`.

use crate::config::{DeviceName, MAX_PIR_INTERVAL_MS, RELAY_MAX_ON_LIMIT_MS, RELAY_MIN_ON_MS};
use crate::error::CommandError;

/// A fully validated command, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RelayOn,
    RelayOff,
    RelayStatus,
    PirInterval(u32),
    RelayMaxOnDuration(u32),
    SkipLocalRelay(bool),
    SkipLocalPir(bool),
    Debug(bool),
    DeviceName(DeviceName),
    Status,
    Help,
    Restart,
}

/// `(syntax, description)` pairs reported by `HELP`.
pub const HELP: &[(&str, &str)] = &[
    ("REL_ON", "Turn relay ON"),
    ("REL_OFF", "Turn relay OFF"),
    ("REL_STATUS", "Get relay status"),
    ("PIR_INTERVAL:<ms>", "Set PIR sensing interval"),
    ("RELAY_MAX_ON_DURATION:<ms>", "Set relay max ON duration"),
    ("SKIP_LOCAL_RELAY:<true/false>", "Bypass local relay control"),
    ("SKIP_LOCAL_PIR:<true/false>", "Ignore the local PIR sensor"),
    ("DEBUG:<true/false>", "Enable/disable debug"),
    ("GHAFEER_NAME:<name>", "Set device name"),
    ("STATUS", "Get full device status"),
    ("HELP", "Show this help message"),
    ("RESTART/REBOOT", "Restart device"),
];

impl Command {
    /// Parse one inbound line.  Surrounding whitespace is ignored, as is
    /// whitespace around the argument.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (name, arg) = match line.split_once(':') {
            Some((name, arg)) => (name, Some(arg.trim())),
            None => (line, None),
        };

        match name {
            "REL_ON" => bare(Self::RelayOn, "REL_ON", arg),
            "REL_OFF" => bare(Self::RelayOff, "REL_OFF", arg),
            "REL_STATUS" => bare(Self::RelayStatus, "REL_STATUS", arg),
            "STATUS" => bare(Self::Status, "STATUS", arg),
            "HELP" => bare(Self::Help, "HELP", arg),
            "RESTART" => bare(Self::Restart, "RESTART", arg),
            "REBOOT" => bare(Self::Restart, "REBOOT", arg),

            "PIR_INTERVAL" => {
                let v = required(arg, "PIR_INTERVAL")?;
                bounded(v, 0, MAX_PIR_INTERVAL_MS)
                    .map(Self::PirInterval)
                    .ok_or_else(|| invalid("PIR_INTERVAL", v))
            }
            "RELAY_MAX_ON_DURATION" => {
                let v = required(arg, "RELAY_MAX_ON_DURATION")?;
                bounded(v, RELAY_MIN_ON_MS, RELAY_MAX_ON_LIMIT_MS)
                    .map(Self::RelayMaxOnDuration)
                    .ok_or_else(|| invalid("RELAY_MAX_ON_DURATION", v))
            }
            "SKIP_LOCAL_RELAY" => flag(arg, "SKIP_LOCAL_RELAY").map(Self::SkipLocalRelay),
            "SKIP_LOCAL_PIR" => flag(arg, "SKIP_LOCAL_PIR").map(Self::SkipLocalPir),
            "DEBUG" => flag(arg, "DEBUG").map(Self::Debug),
            "GHAFEER_NAME" => {
                let v = required(arg, "GHAFEER_NAME")?;
                DeviceName::new(v).map(Self::DeviceName)
            }

            _ => Err(CommandError::UnknownCommand(line.to_owned())),
        }
    }
}

// ── Argument parsers ──────────────────────────────────────────

/// Strict integer: optional leading `+`/`-`, then one or more ASCII digits,
/// nothing else.  Out-of-range for `i64` is a rejection, not a wrap.
pub fn parse_int(arg: &str) -> Option<i64> {
    let digits = arg.strip_prefix(['+', '-']).unwrap_or(arg);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    arg.parse().ok()
}

/// `true`/`1` and `false`/`0`, case-insensitive.
pub fn parse_bool(arg: &str) -> Option<bool> {
    let v = arg.trim();
    if v.eq_ignore_ascii_case("true") || v == "1" {
        Some(true)
    } else if v.eq_ignore_ascii_case("false") || v == "0" {
        Some(false)
    } else {
        None
    }
}

fn bounded(arg: &str, min: u32, max: u32) -> Option<u32> {
    let v = parse_int(arg)?;
    if v < i64::from(min) || v > i64::from(max) {
        return None;
    }
    u32::try_from(v).ok()
}

fn bare(cmd: Command, name: &'static str, arg: Option<&str>) -> Result<Command, CommandError> {
    match arg {
        None => Ok(cmd),
        Some(_) => Err(CommandError::UnexpectedArgument(name)),
    }
}

fn required<'a>(arg: Option<&'a str>, name: &'static str) -> Result<&'a str, CommandError> {
    arg.ok_or(CommandError::MissingArgument(name))
}

fn flag(arg: Option<&str>, name: &'static str) -> Result<bool, CommandError> {
    let v = required(arg, name)?;
    parse_bool(v).ok_or_else(|| invalid(name, v))
}

fn invalid(command: &'static str, value: &str) -> CommandError {
    CommandError::InvalidValue {
        command,
        value: value.to_owned(),
    }
}
