//! Radio event reporting
//!
//! The stack calls [`EventReporter`] from its own context whenever an uplink
//! went out, a downlink arrived or a confirmed uplink ran out of retries. The
//! reporter logs the statistics of the last exchange and raises the [`RxFlag`]
//! the uplink loop uses to tell an acknowledgement from silence.

use core::fmt::Write;
use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::blocking::delay::DelayMs;
use heapless::String;

use crate::led::{Flash, RgbLed, SharedLed, Signaler};
use crate::region::spreading_factor;
use crate::stack::{EventHandler, EventSource, Events, Stats};

/// Capacity of a composed statistics line
pub const REPORT_LINE_SIZE: usize = 128;

/// Set by the event callback when an acknowledgement or downlink was seen
///
/// Single writer (the callback), single reader (the uplink loop).
#[derive(Debug, Default)]
pub struct RxFlag(AtomicBool);

impl RxFlag {
    /// Create a lowered flag
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Raise the flag
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Lower the flag
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Check whether the flag is raised
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What a batch of events amounts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Statistics line, if any TX or RX event was pending
    pub line: Option<String<REPORT_LINE_SIZE>>,
    /// An acknowledgement or downlink is expected or was received
    pub received: bool,
    /// Attempts made before a confirmed uplink was given up
    pub failed_after: Option<u8>,
}

/// Build the report for `events`
///
/// With `ack` set every transmitted uplink is confirmed, so a TX event also
/// carries the statistics of the acknowledgement.
pub fn compose(events: Events, stats: &Stats, ack: bool) -> Report {
    let mut line: String<REPORT_LINE_SIZE> = String::new();
    let tx = events.contains(Events::TX_PACKET);
    let received = (tx && ack) || events.contains(Events::RX_PACKET);

    if tx {
        write!(
            line,
            "LoRa stats: TX[sf={}, airtime={}ms, count={}, retries={}]",
            spreading_factor(stats.sf_tx),
            stats.tx_time_on_air,
            stats.tx_counter,
            stats.tx_trials
        )
        .ok();
    }
    if received {
        let prefix = if tx { " " } else { "LoRa stats: " };
        write!(
            line,
            "{}RX[sf={}, rssi={}dBm, snr={}dB]",
            prefix,
            spreading_factor(stats.sf_rx),
            stats.rssi,
            stats.snr
        )
        .ok();
    }

    Report {
        line: if line.is_empty() { None } else { Some(line) },
        received,
        failed_after: events
            .contains(Events::TX_FAILED)
            .then_some(stats.tx_trials),
    }
}

/// Event callback: logs statistics, raises the flag and blinks pink
pub struct EventReporter<'a, L, D> {
    flag: &'a RxFlag,
    signaler: Signaler<'a, L, D>,
    ack: bool,
}

impl<'a, L: RgbLed, D: DelayMs<u32>> EventReporter<'a, L, D> {
    /// Create a reporter; `delay` must not be shared with the uplink loop
    pub fn new(flag: &'a RxFlag, led: &'a SharedLed<L>, delay: D, ack: bool) -> Self {
        Self {
            flag,
            signaler: Signaler::new(led, delay),
            ack,
        }
    }

    /// Release the delay provider
    pub fn free(self) -> D {
        self.signaler.free()
    }
}

impl<'a, L: RgbLed, D: DelayMs<u32>> EventHandler for EventReporter<'a, L, D> {
    fn on_events(&mut self, source: &mut dyn EventSource) {
        let events = source.events();
        if events.is_empty() {
            return;
        }

        let report = compose(events, &source.stats(), self.ack);
        if report.received {
            self.flag.raise();
            self.signaler.flash(Flash::RECEIVED);
        }
        if let Some(line) = &report.line {
            log::info!("{}", line);
        }
        if let Some(attempts) = report.failed_after {
            log::warn!("Warning: no ACK after {} attempts", attempts);
        }
    }
}
