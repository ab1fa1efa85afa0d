//! Network activation
//!
//! Joins the network once at startup:
//! - OTAA: hands the application EUI and key to the stack, then polls for the
//!   join accept until the configured timeout
//! - ABP: hands over the pre-shared session keys and registers the extra
//!   uplink channels an OTAA device would have learned from the join accept

use embedded_hal::blocking::delay::DelayMs;

use crate::clock::Clock;
use crate::config::CheckConfig;
use crate::led::{Flash, RgbLed, Signaler};
use crate::region::Region;
use crate::stack::{Activation, LoRaStack};

/// Join state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JoinState {
    /// No join attempted yet
    Unjoined,
    /// Join request submitted, waiting for the accept
    Joining,
    /// Device is part of the network
    Joined,
    /// No join accept before the timeout
    JoinFailed,
}

impl JoinState {
    /// Whether the state can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(self, JoinState::Joined | JoinState::JoinFailed)
    }
}

/// One-shot network joiner
pub struct Joiner<'c, REG: Region> {
    config: &'c CheckConfig,
    region: REG,
    state: JoinState,
}

impl<'c, REG: Region> Joiner<'c, REG> {
    /// Create a joiner for `config` in `region`
    pub fn new(config: &'c CheckConfig, region: REG) -> Self {
        Self {
            config,
            region,
            state: JoinState::Unjoined,
        }
    }

    /// Current join state
    pub fn state(&self) -> JoinState {
        self.state
    }

    /// Join the network, blocking until joined or timed out
    ///
    /// Only stack errors are returned; a join timeout is reported as
    /// [`JoinState::JoinFailed`].
    pub fn join<'h, S, C, L, D>(
        &mut self,
        stack: &mut S,
        clock: &mut C,
        signaler: &mut Signaler<'_, L, D>,
    ) -> Result<JoinState, S::Error>
    where
        S: LoRaStack<'h>,
        C: Clock,
        L: RgbLed,
        D: DelayMs<u32>,
    {
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        let activation = Activation::from(&self.config.credentials);
        if self.config.credentials.is_otaa() {
            self.join_otaa(stack, &activation, clock, signaler)
        } else {
            self.join_abp(stack, &activation)
        }
    }

    fn join_otaa<'h, S, C, L, D>(
        &mut self,
        stack: &mut S,
        activation: &Activation,
        clock: &mut C,
        signaler: &mut Signaler<'_, L, D>,
    ) -> Result<JoinState, S::Error>
    where
        S: LoRaStack<'h>,
        C: Clock,
        L: RgbLed,
        D: DelayMs<u32>,
    {
        stack.join(activation, self.config.join_data_rate)?;
        self.state = JoinState::Joining;
        log::info!("Starting OTAA join...");

        let start = clock.now_ms();
        let mut reported_secs = 0;
        let joined = loop {
            if stack.has_joined()? {
                break true;
            }
            let elapsed = clock.elapsed_since(start);
            if elapsed >= self.config.join_timeout {
                break false;
            }
            if elapsed.as_secs() > reported_secs {
                reported_secs = elapsed.as_secs();
                log::info!("Joining... {}s", reported_secs);
            }
            signaler.flash(Flash::JOIN_POLL);
        };

        if joined {
            log::info!("OTAA join OK.");
            signaler.flash(Flash::JOINED);
            self.state = JoinState::Joined;
        } else {
            log::warn!("OTAA join timeout, failed!");
            signaler.flash(Flash::JOIN_FAILED);
            self.state = JoinState::JoinFailed;
        }
        Ok(self.state)
    }

    fn join_abp<'h, S>(&mut self, stack: &mut S, activation: &Activation) -> Result<JoinState, S::Error>
    where
        S: LoRaStack<'h>,
    {
        log::info!("ABP mode with preshared keys");
        stack.join(activation, self.config.join_data_rate)?;

        for channel in self.region.abp_channels() {
            log::debug!(
                "Adding channel {} at {} Hz (DR{}-DR{})",
                channel.index,
                channel.frequency,
                channel.min_dr.index(),
                channel.max_dr.index()
            );
            stack.add_channel(channel)?;
        }

        self.state = JoinState::Joined;
        Ok(self.state)
    }
}
