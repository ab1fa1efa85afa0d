//! Uplink/downlink loop
//!
//! Each cycle sends the counter as a one byte payload, reads whatever
//! downlink the stack has queued and classifies the exchange. The counter
//! wraps at 256 since it is the payload.

use embedded_hal::blocking::delay::DelayMs;
use heapless::Vec;

use crate::config::{CheckConfig, RX_BUFFER_SIZE};
use crate::led::{Flash, RgbLed, Signaler};
use crate::report::RxFlag;
use crate::stack::{LoRaStack, SendError};

/// Uplink sequence counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter(u8);

impl Counter {
    /// Counter before the first uplink
    pub const fn new() -> Self {
        Self(0)
    }

    /// Increment and return the value for the next uplink
    pub fn advance(&mut self) -> u8 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }

    /// Value of the last uplink
    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Result of one uplink/downlink exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The gateway acknowledged the uplink without payload
    Acked,
    /// A downlink with payload arrived
    DownlinkReceived {
        /// FPort of the downlink
        port: u8,
        /// Downlink payload
        payload: Vec<u8, RX_BUFFER_SIZE>,
    },
    /// Nothing came back
    NoDownlink,
}

/// Classify an exchange from the callback flag and the receive result
///
/// An empty read counts as an acknowledgement only if the callback reported
/// one; a payload always counts as a downlink.
pub fn classify(flag_raised: bool, downlink: Option<(u8, &[u8])>) -> Outcome {
    match downlink {
        Some((port, payload)) if !payload.is_empty() => {
            let len = payload.len().min(RX_BUFFER_SIZE);
            Outcome::DownlinkReceived {
                port,
                payload: Vec::from_slice(&payload[..len]).unwrap_or_default(),
            }
        }
        _ if flag_raised => Outcome::Acked,
        _ => Outcome::NoDownlink,
    }
}

/// Summary of one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Payload byte that was sent
    pub sequence: u8,
    /// The blocking send hit its timeout
    pub send_timed_out: bool,
    /// Classification of the exchange
    pub outcome: Outcome,
}

/// Periodic uplink loop
pub struct UplinkLoop<'a, L, D> {
    config: &'a CheckConfig,
    flag: &'a RxFlag,
    signaler: Signaler<'a, L, D>,
    counter: Counter,
}

impl<'a, L: RgbLed, D: DelayMs<u32>> UplinkLoop<'a, L, D> {
    /// Create a loop reading the acknowledgement flag raised by the event callback
    pub fn new(config: &'a CheckConfig, flag: &'a RxFlag, signaler: Signaler<'a, L, D>) -> Self {
        Self {
            config,
            flag,
            signaler,
            counter: Counter::new(),
        }
    }

    /// Payload byte of the last uplink
    pub fn counter(&self) -> u8 {
        self.counter.value()
    }

    /// Run cycles for as long as the device stays joined
    ///
    /// Returns the number of completed cycles.
    pub fn run<'h, S: LoRaStack<'h>>(&mut self, stack: &mut S) -> Result<u32, S::Error> {
        let mut cycles = 0u32;
        while stack.has_joined()? {
            self.cycle(stack)?;
            cycles = cycles.wrapping_add(1);
        }
        Ok(cycles)
    }

    /// Send one uplink, check for a downlink and wait for the next slot
    pub fn cycle<'h, S: LoRaStack<'h>>(&mut self, stack: &mut S) -> Result<CycleReport, S::Error> {
        let sequence = self.counter.advance();
        self.flag.clear();

        log::info!(
            "Sending uplink packet {} with SF{}{}...",
            sequence,
            self.config.data_rate.spreading_factor(),
            if self.config.ack { " asking for ACK" } else { "" }
        );
        self.signaler.flash(Flash::SENDING);
        let send_timed_out = match stack.send(&[sequence], self.config.send_timeout) {
            Ok(()) => {
                log::info!("OK.");
                false
            }
            Err(SendError::Timeout) => {
                self.signaler.flash(Flash::SEND_TIMEOUT);
                log::warn!("Timeout!");
                true
            }
            Err(SendError::Stack(error)) => return Err(error),
        };

        let mut buffer = [0u8; RX_BUFFER_SIZE];
        let downlink = match stack.receive(&mut buffer) {
            Ok(downlink) => Some(downlink),
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(error)) => return Err(error),
        };
        let outcome = classify(
            self.flag.is_raised(),
            downlink.map(|d| (d.port, &buffer[..d.len.min(RX_BUFFER_SIZE)])),
        );

        match &outcome {
            Outcome::Acked => log::info!("ACK received."),
            Outcome::DownlinkReceived { port, payload } => {
                log::info!("Received downlink packet on port {}: {:02X?}", port, payload.as_slice())
            }
            Outcome::NoDownlink => log::info!("No downlink packet received."),
        }

        // Give the event callback time to land before the next cycle.
        self.signaler.sleep(self.config.settle_delay);
        let idle = Flash::idle(self.config.idle_blinks);
        log::info!(
            "Waiting {} seconds...",
            (self.config.settle_delay + idle.duration()).as_secs()
        );
        self.signaler.flash(idle);

        Ok(CycleReport {
            sequence,
            send_timed_out,
            outcome,
        })
    }

    /// Release the signaler
    pub fn free(self) -> Signaler<'a, L, D> {
        self.signaler
    }
}
