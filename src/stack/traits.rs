use core::time::Duration;

use crate::config::{AesKey, DevAddr, Eui64};
use crate::region::{Channel, DataRate};

bitflags::bitflags! {
    /// Radio events raised by the stack
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Events: u8 {
        /// An uplink was transmitted
        const TX_PACKET = 0x01;
        /// A downlink was received
        const RX_PACKET = 0x02;
        /// A confirmed uplink got no acknowledgement after all retries
        const TX_FAILED = 0x04;
    }
}

/// Statistics of the last transmission and reception
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stats {
    /// Timestamp of the last reception in microseconds
    pub rx_timestamp: u32,
    /// RSSI of the last received packet in dBm
    pub rssi: i16,
    /// SNR of the last received packet in dB
    pub snr: i8,
    /// Data rate index of the last received packet
    pub sf_rx: u8,
    /// Data rate index of the last transmitted packet
    pub sf_tx: u8,
    /// Transmission attempts of the last uplink
    pub tx_trials: u8,
    /// Transmit power of the last uplink in dBm
    pub tx_power: i8,
    /// Airtime of the last uplink in milliseconds
    pub tx_time_on_air: u32,
    /// Total number of uplinks sent
    pub tx_counter: u32,
    /// Frequency of the last uplink in Hz
    pub tx_frequency: u32,
}

/// Network activation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Activation {
    /// Over-the-air activation
    Otaa {
        /// Application EUI
        app_eui: Eui64,
        /// Application key
        app_key: AesKey,
    },
    /// Activation by personalization
    Abp {
        /// Device address
        dev_addr: DevAddr,
        /// Network session key
        nwk_skey: AesKey,
        /// Application session key
        app_skey: AesKey,
    },
}

/// Metadata of a received downlink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Downlink {
    /// Number of payload bytes written to the buffer
    pub len: usize,
    /// FPort the downlink arrived on
    pub port: u8,
}

/// Error of a blocking send
#[derive(Debug, PartialEq, Eq)]
pub enum SendError<E> {
    /// The send did not complete within the timeout
    Timeout,
    /// Stack error
    Stack(E),
}

impl<E> From<E> for SendError<E> {
    fn from(error: E) -> Self {
        SendError::Stack(error)
    }
}

/// Board and firmware identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform<'a> {
    /// Board or system name
    pub sysname: &'a str,
    /// Firmware release
    pub release: &'a str,
}

/// Pending events and statistics, as seen from inside the event callback
pub trait EventSource {
    /// Read and clear the pending events
    fn events(&mut self) -> Events;

    /// Statistics of the last transmission and reception
    fn stats(&self) -> Stats;
}

/// Callback invoked by the stack whenever events are pending
pub trait EventHandler {
    /// Handle pending events
    fn on_events(&mut self, source: &mut dyn EventSource);
}

/// LoRaWAN stack interface
///
/// MAC layer, duty cycling, encryption and retransmissions all live behind this
/// trait. `'h` is the lifetime of the registered event handler.
pub trait LoRaStack<'h> {
    /// Error type for stack operations
    type Error;

    /// Board and firmware identification
    fn platform(&self) -> Platform<'_>;

    /// Hardware derived device EUI
    fn dev_eui(&self) -> Eui64;

    /// Start joining the network
    ///
    /// OTAA joins return immediately and complete in the background with
    /// stack-managed retries; poll [`LoRaStack::has_joined`]. ABP joins are
    /// local and complete before returning.
    fn join(&mut self, activation: &Activation, data_rate: DataRate) -> Result<(), Self::Error>;

    /// Check whether the device has joined
    fn has_joined(&mut self) -> Result<bool, Self::Error>;

    /// Add an uplink channel
    fn add_channel(&mut self, channel: &Channel) -> Result<(), Self::Error>;

    /// Set the uplink data rate and whether uplinks are confirmed
    fn configure_socket(&mut self, data_rate: DataRate, confirmed: bool) -> Result<(), Self::Error>;

    /// Transmit a payload, blocking for at most `timeout`
    fn send(&mut self, payload: &[u8], timeout: Duration) -> Result<(), SendError<Self::Error>>;

    /// Read a pending downlink without blocking
    ///
    /// Returns `WouldBlock` if nothing has been received.
    fn receive(&mut self, buffer: &mut [u8]) -> nb::Result<Downlink, Self::Error>;

    /// Register the handler to call when any of `trigger` is raised
    fn set_callback(&mut self, trigger: Events, handler: &'h mut dyn EventHandler);
}
