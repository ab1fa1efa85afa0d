//! Connectivity check driver
//!
//! Wires the pieces together in the order a board runs them: identify the
//! stack, join, configure the uplink socket, register the event callback and
//! loop for as long as the device stays joined.

use core::fmt;

use embedded_hal::blocking::delay::DelayMs;

use crate::clock::Clock;
use crate::config::CheckConfig;
use crate::join::{JoinState, Joiner};
use crate::led::{Color, RgbLed, SharedLed, Signaler};
use crate::region::Region;
use crate::report::RxFlag;
use crate::stack::{EventHandler, Events, LoRaStack};
use crate::uplink::UplinkLoop;

/// Connectivity check error type
#[derive(Debug, PartialEq, Eq)]
pub enum CheckError<E> {
    /// Stack error
    Stack(E),
    /// The network could not be joined; no uplink was sent
    JoinFailed,
}

impl<E> From<E> for CheckError<E> {
    fn from(error: E) -> Self {
        CheckError::Stack(error)
    }
}

/// Upper-case hex rendering of an identifier
pub struct HexId<'a>(pub &'a [u8]);

impl fmt::Display for HexId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = [0u8; 16];
        for chunk in self.0.chunks(buffer.len() / 2) {
            let text = &mut buffer[..chunk.len() * 2];
            hex::encode_to_slice(chunk, text).map_err(|_| fmt::Error)?;
            text.make_ascii_uppercase();
            f.write_str(core::str::from_utf8(text).map_err(|_| fmt::Error)?)?;
        }
        Ok(())
    }
}

/// Connectivity check for one device
pub struct ConnectivityCheck<'a, REG, L> {
    config: &'a CheckConfig,
    region: REG,
    led: &'a SharedLed<L>,
    flag: &'a RxFlag,
}

impl<'a, REG: Region, L: RgbLed> ConnectivityCheck<'a, REG, L> {
    /// Create a check; `flag` must be the one the event handler raises
    pub fn new(config: &'a CheckConfig, region: REG, led: &'a SharedLed<L>, flag: &'a RxFlag) -> Self {
        Self {
            config,
            region,
            led,
            flag,
        }
    }

    /// Join and run the uplink loop
    ///
    /// Returns the number of completed cycles once the stack reports the
    /// device as no longer joined. The LED is left red whenever this returns.
    pub fn run<'h, S, C, D>(
        self,
        stack: &mut S,
        clock: &mut C,
        delay: D,
        handler: &'h mut dyn EventHandler,
    ) -> Result<u32, CheckError<S::Error>>
    where
        S: LoRaStack<'h>,
        C: Clock,
        D: DelayMs<u32>,
    {
        let platform = stack.platform();
        log::info!(
            "Init LoRaWAN stack on {} running {} ({})...",
            platform.sysname,
            platform.release,
            self.region.name()
        );
        log::info!("LoRa DevEUI: {}", HexId(&stack.dev_eui()));

        let led = self.led;
        let result = self.join_and_loop(stack, clock, delay, handler);
        led.set(Color::RED);
        result
    }

    fn join_and_loop<'h, S, C, D>(
        self,
        stack: &mut S,
        clock: &mut C,
        delay: D,
        handler: &'h mut dyn EventHandler,
    ) -> Result<u32, CheckError<S::Error>>
    where
        S: LoRaStack<'h>,
        C: Clock,
        D: DelayMs<u32>,
    {
        let mut signaler = Signaler::new(self.led, delay);
        let mut joiner = Joiner::new(self.config, self.region);
        let state = joiner.join(stack, clock, &mut signaler)?;

        stack.configure_socket(self.config.data_rate, self.config.ack)?;
        stack.set_callback(Events::TX_PACKET | Events::RX_PACKET, handler);

        if state != JoinState::Joined {
            return Err(CheckError::JoinFailed);
        }

        let mut uplink = UplinkLoop::new(self.config, self.flag, signaler);
        Ok(uplink.run(stack)?)
    }
}
