//! Run configuration
//!
//! Everything the check needs to know is fixed before the first radio call:
//! - Activation credentials (OTAA or ABP)
//! - Join and uplink data rates
//! - Acknowledgement requests
//! - Timeouts and the uplink cadence

use core::time::Duration;

use crate::region::DataRate;

/// Activation credentials
pub mod credentials;

pub use credentials::{AesKey, ConfigError, Credentials, DevAddr, Eui64, Field};

/// Default uplink and join data rate (DR2, SF10)
pub const DEFAULT_DATA_RATE: DataRate = DataRate::SF10BW125;
/// Default OTAA join timeout
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(30);
/// Default blocking send timeout
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);
/// Time given to the event callback after each uplink
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);
/// Number of one second idle blinks between uplinks
pub const DEFAULT_IDLE_BLINKS: u16 = 29;
/// Largest downlink payload read per cycle
pub const RX_BUFFER_SIZE: usize = 64;

/// Immutable configuration of a connectivity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    /// Activation credentials, selecting OTAA or ABP
    pub credentials: Credentials,
    /// Data rate used for uplinks
    pub data_rate: DataRate,
    /// Data rate used for the join request
    pub join_data_rate: DataRate,
    /// Request an acknowledgement for every uplink
    pub ack: bool,
    /// How long to wait for an OTAA join to complete
    pub join_timeout: Duration,
    /// Timeout of the blocking send
    pub send_timeout: Duration,
    /// Pause after each cycle before the idle blinks start
    pub settle_delay: Duration,
    /// Number of idle blinks (one second each) between uplinks
    pub idle_blinks: u16,
}

impl CheckConfig {
    /// Create a configuration with default timings
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            data_rate: DEFAULT_DATA_RATE,
            join_data_rate: DEFAULT_DATA_RATE,
            ack: true,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            idle_blinks: DEFAULT_IDLE_BLINKS,
        }
    }

    /// Create an OTAA configuration
    pub fn otaa(app_eui: Eui64, app_key: AesKey) -> Self {
        Self::new(Credentials::new_otaa(app_eui, app_key))
    }

    /// Create an ABP configuration
    pub fn abp(dev_addr: DevAddr, nwk_skey: AesKey, app_skey: AesKey) -> Self {
        Self::new(Credentials::new_abp(dev_addr, nwk_skey, app_skey))
    }

    /// Set the uplink data rate
    pub fn with_data_rate(mut self, data_rate: DataRate) -> Self {
        self.data_rate = data_rate;
        self
    }

    /// Set the join data rate
    pub fn with_join_data_rate(mut self, data_rate: DataRate) -> Self {
        self.join_data_rate = data_rate;
        self
    }

    /// Set the OTAA join timeout
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Enable or disable acknowledgement requests
    pub fn with_ack(mut self, ack: bool) -> Self {
        self.ack = ack;
        self
    }

    /// Set the pacing between uplinks
    pub fn with_cadence(mut self, settle_delay: Duration, idle_blinks: u16) -> Self {
        self.settle_delay = settle_delay;
        self.idle_blinks = idle_blinks;
        self
    }
}
