//! PIR motion debouncer.
//!
//! Separates two decisions that the sketches used to tangle together:
//!
//! 1. *Should this sample start an activation cycle?*  Yes whenever the PIR
//!    is HIGH and no cycle is currently being timed.
//! 2. *Should the cycle be announced?*  Only if the previous announcement is
//!    at least `cooldown_ms` old.
//!
//! The relay therefore answers every qualifying edge while outbound messages
//! stay rate-limited.  Cooldown tracking is independent of the relay: a
//! `REL_OFF` does not reset it.

/// Result of feeding one PIR sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionDecision {
    /// Sample arrived before `pir_interval_ms` elapsed; nothing recorded.
    NotDue,
    /// Sample taken, PIR LOW.
    Quiet,
    /// PIR HIGH but an activation cycle is already running.
    Busy,
    /// New activation cycle.  `notify` is `false` inside the cooldown window.
    Triggered { notify: bool },
}

#[derive(Debug, Clone, Default)]
pub struct MotionDebouncer {
    last_sample_at: Option<u64>,
    last_trigger_at: Option<u64>,
}

impl MotionDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once `pir_interval_ms` has passed since the last accepted sample.
    pub fn sample_due(&self, now_ms: u64, pir_interval_ms: u32) -> bool {
        self.last_sample_at
            .is_none_or(|at| now_ms.saturating_sub(at) >= u64::from(pir_interval_ms))
    }

    /// Feed one PIR sample.
    ///
    /// * `cycle_active`: the relay controller is timing an activation.
    /// * `cooldown_ms`: minimum gap between two announced triggers.
    pub fn on_sample(
        &mut self,
        now_ms: u64,
        signal_high: bool,
        cycle_active: bool,
        pir_interval_ms: u32,
        cooldown_ms: u32,
    ) -> MotionDecision {
        if !self.sample_due(now_ms, pir_interval_ms) {
            return MotionDecision::NotDue;
        }
        self.last_sample_at = Some(now_ms);

        if !signal_high {
            return MotionDecision::Quiet;
        }
        if cycle_active {
            return MotionDecision::Busy;
        }
        MotionDecision::Triggered {
            notify: self.record_trigger(now_ms, cooldown_ms),
        }
    }

    /// Register a trigger that did not come from sampling (deep-sleep wake).
    /// Returns whether it falls outside the cooldown and should be announced.
    pub fn record_trigger(&mut self, now_ms: u64, cooldown_ms: u32) -> bool {
        let notify = self
            .last_trigger_at
            .is_none_or(|at| now_ms.saturating_sub(at) >= u64::from(cooldown_ms));
        if notify {
            self.last_trigger_at = Some(now_ms);
        }
        notify
    }

    pub fn last_trigger_at(&self) -> Option<u64> {
        self.last_trigger_at
    }
}
