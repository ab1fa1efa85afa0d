//! Host-side simulation of a board
//!
//! A scripted LoRaWAN stack plus std based clock, delay and LED, so
//! the check can run on a development machine without radio hardware.

use std::thread;
use std::time::{Duration, Instant};
use std::vec::Vec;

use embedded_hal::blocking::delay::DelayMs;

use crate::clock::Clock;
use crate::config::Eui64;
use crate::led::{Color, RgbLed};
use crate::region::{Channel, DataRate, Region};
use crate::stack::{
    Activation, Downlink, EventHandler, EventSource, Events, LoRaStack, Platform, SendError, Stats,
};

/// Approximate airtime of a minimal uplink in ms, indexed by DR
const AIRTIME_MS: [u32; 6] = [991, 495, 247, 144, 72, 41];

/// Simulated stack error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// Channel index already used by a default channel
    ReservedChannel(u8),
    /// Operation needs a joined device
    NotJoined,
}

/// Behaviour of the simulated network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Script {
    /// Polls of `has_joined` before an OTAA join completes; `None` never joins
    pub join_after_polls: Option<u32>,
    /// Number of uplinks before the session is dropped; `None` keeps it
    pub session_uplinks: Option<u32>,
    /// Every n-th uplink times out
    pub timeout_every: u32,
    /// Every n-th uplink gets a downlink with payload
    pub downlink_every: u32,
    /// Every n-th confirmed uplink is never acknowledged
    pub unacked_every: u32,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            join_after_polls: Some(4),
            session_uplinks: None,
            timeout_every: 7,
            downlink_every: 5,
            unacked_every: 6,
        }
    }
}

#[derive(Debug)]
struct SimRadio {
    pending: Events,
    stats: Stats,
}

impl EventSource for SimRadio {
    fn events(&mut self) -> Events {
        core::mem::replace(&mut self.pending, Events::empty())
    }

    fn stats(&self) -> Stats {
        self.stats
    }
}

/// Scripted LoRaWAN stack
pub struct SimStack<'h> {
    script: Script,
    dev_eui: Eui64,
    channels: Vec<Channel>,
    joined: bool,
    join_polls: u32,
    otaa_pending: bool,
    data_rate: DataRate,
    confirmed: bool,
    uplinks: u32,
    queued: Option<(u8, Vec<u8>)>,
    radio: SimRadio,
    trigger: Events,
    handler: Option<&'h mut dyn EventHandler>,
}

impl<'h> SimStack<'h> {
    /// Create a stack with the region's default channels
    pub fn new<REG: Region>(region: &REG, dev_eui: Eui64, script: Script) -> Self {
        Self {
            script,
            dev_eui,
            channels: region.default_channels().to_vec(),
            joined: false,
            join_polls: 0,
            otaa_pending: false,
            data_rate: DataRate::SF12BW125,
            confirmed: false,
            uplinks: 0,
            queued: None,
            radio: SimRadio {
                pending: Events::empty(),
                stats: Stats::default(),
            },
            trigger: Events::empty(),
            handler: None,
        }
    }

    /// Channels currently in use
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    fn every(n: u32, count: u32) -> bool {
        n != 0 && count % n == 0
    }

    fn raise(&mut self, events: Events) {
        self.radio.pending |= events;
        if self.radio.pending.intersects(self.trigger) {
            if let Some(handler) = self.handler.as_mut() {
                handler.on_events(&mut self.radio);
            }
        }
    }
}

impl<'h> LoRaStack<'h> for SimStack<'h> {
    type Error = SimError;

    fn platform(&self) -> Platform<'_> {
        Platform {
            sysname: "SimBoard",
            release: env!("CARGO_PKG_VERSION"),
        }
    }

    fn dev_eui(&self) -> Eui64 {
        self.dev_eui
    }

    fn join(&mut self, activation: &Activation, data_rate: DataRate) -> Result<(), Self::Error> {
        self.data_rate = data_rate;
        match activation {
            Activation::Otaa { .. } => self.otaa_pending = true,
            Activation::Abp { .. } => self.joined = true,
        }
        Ok(())
    }

    fn has_joined(&mut self) -> Result<bool, Self::Error> {
        if self.otaa_pending && !self.joined {
            self.join_polls += 1;
            if let Some(after) = self.script.join_after_polls {
                if self.join_polls > after {
                    self.joined = true;
                    self.otaa_pending = false;
                }
            }
        }
        Ok(self.joined)
    }

    fn add_channel(&mut self, channel: &Channel) -> Result<(), Self::Error> {
        if self.channels.iter().any(|c| c.index == channel.index) {
            return Err(SimError::ReservedChannel(channel.index));
        }
        self.channels.push(*channel);
        Ok(())
    }

    fn configure_socket(&mut self, data_rate: DataRate, confirmed: bool) -> Result<(), Self::Error> {
        self.data_rate = data_rate;
        self.confirmed = confirmed;
        Ok(())
    }

    fn send(&mut self, payload: &[u8], _timeout: Duration) -> Result<(), SendError<Self::Error>> {
        if !self.joined {
            return Err(SendError::Stack(SimError::NotJoined));
        }

        self.uplinks += 1;
        let count = self.uplinks;
        if Self::every(self.script.session_uplinks.unwrap_or(0), count) {
            self.joined = false;
        }
        if Self::every(self.script.timeout_every, count) {
            return Err(SendError::Timeout);
        }

        let dr = self.data_rate.index();
        let channel = self.channels[count as usize % self.channels.len()];
        let mut trials = 1;
        let mut events = Events::TX_PACKET;
        if self.confirmed && Self::every(self.script.unacked_every, count) {
            trials = 8;
            events |= Events::TX_FAILED;
        }
        if Self::every(self.script.downlink_every, count) {
            self.queued = Some((1, payload.iter().rev().copied().collect()));
            events |= Events::RX_PACKET;
        }

        self.radio.stats = Stats {
            rx_timestamp: count.wrapping_mul(30_000_000),
            rssi: -97 - (count % 9) as i16,
            snr: 7 - (count % 5) as i8,
            sf_rx: dr,
            sf_tx: dr,
            tx_trials: trials,
            tx_power: 14,
            tx_time_on_air: AIRTIME_MS[dr as usize],
            tx_counter: count,
            tx_frequency: channel.frequency,
        };
        self.raise(events);
        Ok(())
    }

    fn receive(&mut self, buffer: &mut [u8]) -> nb::Result<Downlink, Self::Error> {
        let Some((port, payload)) = self.queued.take() else {
            return Err(nb::Error::WouldBlock);
        };
        let len = payload.len().min(buffer.len());
        buffer[..len].copy_from_slice(&payload[..len]);
        Ok(Downlink { len, port })
    }

    fn set_callback(&mut self, trigger: Events, handler: &'h mut dyn EventHandler) {
        self.trigger = trigger;
        self.handler = Some(handler);
    }
}

/// Wall clock, optionally running faster than real time
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: Instant,
    speedup: u32,
}

impl StdClock {
    /// Create a clock; `speedup` must match the delays used alongside it
    pub fn new(speedup: u32) -> Self {
        Self {
            start: Instant::now(),
            speedup: speedup.max(1),
        }
    }
}

impl Clock for StdClock {
    fn now_ms(&mut self) -> u64 {
        let elapsed = self.start.elapsed().as_millis() as u64;
        elapsed.saturating_mul(u64::from(self.speedup))
    }
}

/// Thread sleep delay, optionally shortened by a speed-up factor
#[derive(Debug, Clone, Copy)]
pub struct StdDelay {
    speedup: u32,
}

impl StdDelay {
    /// Create a delay; every requested delay is divided by `speedup`
    pub fn new(speedup: u32) -> Self {
        Self {
            speedup: speedup.max(1),
        }
    }
}

impl DelayMs<u32> for StdDelay {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms / self.speedup)));
    }
}

/// LED that traces colour changes to the log
#[derive(Debug, Default)]
pub struct ConsoleLed {
    last: Option<Color>,
}

impl RgbLed for ConsoleLed {
    fn set_color(&mut self, color: Color) {
        if self.last != Some(color) {
            log::trace!("LED #{:02X}{:02X}{:02X}", color.red, color.green, color.blue);
            self.last = Some(color);
        }
    }
}
