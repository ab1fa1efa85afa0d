//! LoRaWAN connectivity check
//!
//! This crate joins a LoRaWAN network, sends a one byte counter every 30
//! seconds and reports what came back through an RGB LED and the log. It is a
//! field tool for verifying gateway coverage and network server configuration
//! with a single device.
//!
//! The LoRaWAN MAC, radio timing, encryption and retransmissions are provided
//! by the board's radio stack through the [`stack::LoRaStack`] trait.
//!
//! # Features
//! - OTAA and ABP activation
//! - Optional acknowledgement request for every uplink
//! - Per-uplink statistics (spreading factor, airtime, RSSI, SNR, retries)
//! - LED colour codes for join, send, receive and failures
//! - `std` feature with a simulated stack for running on a host
//!
//! # Example
//! ```ignore
//! use lorawan_check::{
//!     config::{CheckConfig, Credentials},
//!     device::ConnectivityCheck,
//!     led::SharedLed,
//!     region::EU868,
//!     report::{EventReporter, RxFlag},
//! };
//!
//! let credentials = Credentials::otaa_from_hex(
//!     "70B3D57ED002FFFF",
//!     "F32ADC1EDD72A50C42CE8942B3FFFFFF",
//! ).unwrap();
//! let config = CheckConfig::new(credentials);
//!
//! // Board specific: radio stack, clock, two delays and the RGB LED
//! let (mut stack, mut clock, loop_delay, callback_delay, led) = board();
//! let led = SharedLed::new(led);
//! let flag = RxFlag::new();
//! let mut reporter = EventReporter::new(&flag, &led, callback_delay, config.ack);
//!
//! let check = ConnectivityCheck::new(&config, EU868::new(), &led, &flag);
//! let _ = check.run(&mut stack, &mut clock, loop_delay, &mut reporter);
//! ```

#![warn(missing_docs)]
#![no_std]

#[cfg(feature = "std")]
extern crate std;

/// Monotonic time source
pub mod clock;

/// Run configuration and credentials
pub mod config;

/// Connectivity check driver
pub mod device;

/// Network activation
pub mod join;

/// RGB status LED
pub mod led;

/// Regional parameters
pub mod region;

/// Radio event reporting
pub mod report;

/// Radio stack abstraction
pub mod stack;

/// Uplink/downlink loop
pub mod uplink;

/// Host-side board simulation
#[cfg(feature = "std")]
pub mod sim;
