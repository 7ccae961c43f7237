//! Fuzz target: one inbound line through the whole command path.
//!
//! Arbitrary bytes go through the inbox (length and UTF-8 checks), the
//! parser and the service.  Every line that reaches the service must be
//! answered with exactly one response, and a rejected line must leave the
//! configuration untouched.
//!
//! cargo fuzz run fuzz_command_line

#![no_main]

use ghafeer::app::events::AppEvent;
use ghafeer::app::ports::RelayPort;
use ghafeer::app::service::NodeService;
use ghafeer::config::NodeConfig;
use ghafeer::control::relay::Polarity;
use ghafeer::events::Inbox;
use libfuzzer_sys::fuzz_target;

struct Pin(bool);

impl RelayPort for Pin {
    fn set_level(&mut self, high: bool) {
        self.0 = high;
    }
    fn level(&mut self) -> bool {
        self.0
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let mut inbox = Inbox::new();
    if inbox.push(text).is_err() {
        return;
    }
    let Some(line) = inbox.pop() else {
        return;
    };

    let mut svc = NodeService::new(NodeConfig::default(), Polarity::ActiveHigh, "AABBCCDDEEFF");
    let mut pin = Pin(false);
    let mut events: Vec<AppEvent> = Vec::new();
    let before = svc.config().clone();

    svc.handle_line(&line, 0, &mut pin, &mut events);

    let responses: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Response(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(responses.len(), 1, "exactly one response per line");
    if !responses[0].is_ok() {
        assert_eq!(svc.config(), &before, "rejected line mutated config");
    }
    assert!(!responses[0].to_json().is_empty());
});
