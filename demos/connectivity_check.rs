//! Connectivity check against a simulated EU868 network
//!
//! Runs the full join/uplink sequence on the host with the scripted stack from
//! `lorawan_check::sim`, 30 times faster than real time. Switch `USE_OTAA` to
//! try ABP, or `ACK` to send unconfirmed uplinks. `RUST_LOG=trace` also shows
//! the LED colour changes.

use log::LevelFilter;
use lorawan_check::{
    config::{CheckConfig, ConfigError, Credentials},
    device::{CheckError, ConnectivityCheck},
    led::SharedLed,
    region::{DataRate, EU868},
    report::{EventReporter, RxFlag},
    sim::{ConsoleLed, Script, SimStack, StdClock, StdDelay},
};

// LoRa data rate (0 = SF12 to 5 = SF7)
const DATA_RATE: u8 = 2;
const JOIN_DATA_RATE: u8 = 2;

// Request an acknowledgement for every uplink
const ACK: bool = true;

// Use OTAA or ABP
const USE_OTAA: bool = true;

// OTAA keys, as shown by the network server console
const OTAA_APP_EUI: &str = "70B3D57ED002FFFF";
const OTAA_APP_KEY: &str = "F32ADC1EDD72A50C42CE8942B3FFFFFF";

// ABP keys, as shown by the network server console
const ABP_DEV_ADDR: &str = "26010000";
const ABP_NWK_SKEY: &str = "07966421204E8FAB6C0835079EFFFFFF";
const ABP_APP_SKEY: &str = "A87CC988EB3BD948A7FBDF7423FFFFFF";

const DEV_EUI: [u8; 8] = [0x70, 0xB3, 0xD5, 0x49, 0x9A, 0x0C, 0x1E, 0x42];
const SPEEDUP: u32 = 30;

fn config() -> Result<CheckConfig, ConfigError> {
    let credentials = if USE_OTAA {
        Credentials::otaa_from_hex(OTAA_APP_EUI, OTAA_APP_KEY)?
    } else {
        Credentials::abp_from_hex(ABP_DEV_ADDR, ABP_NWK_SKEY, ABP_APP_SKEY)?
    };

    Ok(CheckConfig::new(credentials)
        .with_data_rate(DataRate::try_from(DATA_RATE)?)
        .with_join_data_rate(DataRate::try_from(JOIN_DATA_RATE)?)
        .with_ack(ACK))
}

fn main() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .format_target(false)
        .parse_default_env()
        .init();
    let config = config().expect("invalid configuration");

    let region = EU868::new();
    let led = SharedLed::new(ConsoleLed::default());
    let flag = RxFlag::new();
    let mut reporter = EventReporter::new(&flag, &led, StdDelay::new(SPEEDUP), config.ack);

    let script = Script {
        session_uplinks: Some(12),
        ..Script::default()
    };
    let mut stack = SimStack::new(&region, DEV_EUI, script);
    let mut clock = StdClock::new(SPEEDUP);

    let check = ConnectivityCheck::new(&config, region, &led, &flag);
    match check.run(&mut stack, &mut clock, StdDelay::new(SPEEDUP), &mut reporter) {
        Ok(cycles) => log::info!("Session ended after {} uplinks", cycles),
        Err(CheckError::JoinFailed) => log::error!("Could not join, no uplinks sent"),
        Err(CheckError::Stack(error)) => log::error!("Stack error: {:?}", error),
    }
}
