use core::time::Duration;

use embedded_hal::PwmPin;
use log::Level;
use lorawan_check::{
    config::{CheckConfig, ConfigError, Credentials, DevAddr, Field, DEFAULT_JOIN_TIMEOUT},
    led::{Color, Flash, PwmRgbLed, RgbLed, SharedLed, Signaler},
    region::{spreading_factor, DataRate, Region, EU868},
    report::{compose, EventReporter, RxFlag},
    stack::{Activation, EventHandler, Events, Stats},
    uplink::{classify, Counter, Outcome},
};

use mock::{MockLed, MockRadio, SimTime};

fn stats() -> Stats {
    Stats {
        rssi: -104,
        snr: 6,
        sf_rx: 2,
        sf_tx: 2,
        tx_trials: 3,
        tx_time_on_air: 247,
        tx_counter: 17,
        ..Stats::default()
    }
}

#[test]
fn test_otaa_credentials_from_hex() {
    let credentials =
        Credentials::otaa_from_hex("70B3D57ED002FFFF", "F32ADC1EDD72A50C42CE8942B3FFFFFF").unwrap();

    assert!(credentials.is_otaa());
    match credentials {
        Credentials::Otaa { app_eui, app_key } => {
            assert_eq!(app_eui, [0x70, 0xB3, 0xD5, 0x7E, 0xD0, 0x02, 0xFF, 0xFF]);
            assert_eq!(app_key[0], 0xF3);
            assert_eq!(app_key[15], 0xFF);
        }
        _ => panic!("expected OTAA credentials"),
    }
}

#[test]
fn test_abp_credentials_from_hex() {
    let credentials = Credentials::abp_from_hex(
        "26010000",
        "07966421204E8FAB6C0835079EFFFFFF",
        "a87cc988eb3bd948a7fbdf7423ffffff",
    )
    .unwrap();

    assert!(!credentials.is_otaa());
    match credentials {
        Credentials::Abp {
            dev_addr,
            nwk_skey,
            app_skey,
        } => {
            assert_eq!(dev_addr, DevAddr::new([0x26, 0x01, 0x00, 0x00]));
            assert_eq!(dev_addr.to_u32(), 0x2601_0000);
            assert_eq!(nwk_skey[0], 0x07);
            assert_eq!(app_skey[0], 0xA8);
        }
        _ => panic!("expected ABP credentials"),
    }
}

#[test]
fn test_malformed_credentials() {
    assert_eq!(
        Credentials::otaa_from_hex("70B3D57ED002FF", "F32ADC1EDD72A50C42CE8942B3FFFFFF"),
        Err(ConfigError::InvalidLength {
            field: Field::AppEui,
            expected: 8,
        })
    );
    assert_eq!(
        Credentials::otaa_from_hex("70B3D57ED002FFFF", "X32ADC1EDD72A50C42CE8942B3FFFFFF"),
        Err(ConfigError::InvalidHex(Field::AppKey))
    );
    assert_eq!(
        Credentials::abp_from_hex(
            "260100",
            "07966421204E8FAB6C0835079EFFFFFF",
            "A87CC988EB3BD948A7FBDF7423FFFFFF"
        ),
        Err(ConfigError::InvalidLength {
            field: Field::DevAddr,
            expected: 4,
        })
    );
}

#[test]
fn test_config_defaults_and_builder() {
    let config = CheckConfig::otaa([0x01; 8], [0x02; 16]);
    assert_eq!(config.data_rate, DataRate::SF10BW125);
    assert_eq!(config.join_data_rate, DataRate::SF10BW125);
    assert!(config.ack);
    assert_eq!(config.join_timeout, DEFAULT_JOIN_TIMEOUT);
    assert_eq!(config.send_timeout, Duration::from_secs(10));
    assert_eq!(config.idle_blinks, 29);

    let config = config
        .with_data_rate(DataRate::SF7BW125)
        .with_join_data_rate(DataRate::SF12BW125)
        .with_join_timeout(Duration::from_secs(5))
        .with_ack(false);
    assert_eq!(config.data_rate.spreading_factor(), 7);
    assert_eq!(config.join_data_rate.spreading_factor(), 12);
    assert_eq!(config.join_timeout, Duration::from_secs(5));
    assert!(!config.ack);
}

#[test]
fn test_credentials_to_activation() {
    let config = CheckConfig::abp(DevAddr::new([0x26, 0x01, 0x00, 0x01]), [0x03; 16], [0x04; 16]);
    let activation = Activation::from(&config.credentials);

    assert_eq!(
        activation,
        Activation::Abp {
            dev_addr: DevAddr::new([0x26, 0x01, 0x00, 0x01]),
            nwk_skey: [0x03; 16],
            app_skey: [0x04; 16],
        }
    );
}

#[test]
fn test_data_rate_table() {
    assert_eq!(DataRate::try_from(0u8), Ok(DataRate::SF12BW125));
    assert_eq!(DataRate::try_from(5u8), Ok(DataRate::SF7BW125));
    assert_eq!(DataRate::try_from(6u8), Err(ConfigError::InvalidDataRate(6)));

    for index in 0..=5u8 {
        let dr = DataRate::try_from(index).unwrap();
        assert_eq!(dr.index(), index);
        assert_eq!(dr.spreading_factor(), 12 - index);
        assert_eq!(dr.bandwidth(), 125_000);
    }
    assert_eq!(spreading_factor(2), 10);
}

#[test]
fn test_eu868_abp_channels() {
    let region = EU868::new();
    let channels = region.abp_channels();

    assert_eq!(region.name(), "EU868");
    assert_eq!(region.default_channels().len(), 3);
    assert_eq!(channels.len(), 5);
    for (i, channel) in channels.iter().enumerate() {
        assert_eq!(channel.index, 3 + i as u8);
        assert_eq!(channel.frequency, 867_100_000 + i as u32 * 200_000);
        assert_eq!(channel.min_dr, DataRate::SF12BW125);
        assert_eq!(channel.max_dr, DataRate::SF7BW125);
    }
}

#[test]
fn test_counter_wraps_after_256_cycles() {
    let mut counter = Counter::new();
    assert_eq!(counter.value(), 0);

    for expected in 1..=255u8 {
        assert_eq!(counter.advance(), expected);
    }
    assert_eq!(counter.advance(), 0);
    assert_eq!(counter.advance(), 1);
}

#[test]
fn test_classify() {
    assert_eq!(classify(true, None), Outcome::Acked);
    assert_eq!(classify(true, Some((1, &[][..]))), Outcome::Acked);
    assert_eq!(classify(false, None), Outcome::NoDownlink);
    assert_eq!(classify(false, Some((1, &[][..]))), Outcome::NoDownlink);

    for flag in [false, true] {
        match classify(flag, Some((42, &[0xCA, 0xFE][..]))) {
            Outcome::DownlinkReceived { port, payload } => {
                assert_eq!(port, 42);
                assert_eq!(payload.as_slice(), &[0xCA, 0xFE]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}

#[test]
fn test_compose_without_events() {
    let report = compose(Events::empty(), &stats(), true);

    assert!(report.line.is_none());
    assert!(!report.received);
    assert!(report.failed_after.is_none());
}

#[test]
fn test_compose_tx_without_ack() {
    let report = compose(Events::TX_PACKET, &stats(), false);

    assert_eq!(
        report.line.as_deref(),
        Some("LoRa stats: TX[sf=10, airtime=247ms, count=17, retries=3]")
    );
    assert!(!report.received);
}

#[test]
fn test_compose_tx_with_ack() {
    let report = compose(Events::TX_PACKET, &stats(), true);

    assert_eq!(
        report.line.as_deref(),
        Some("LoRa stats: TX[sf=10, airtime=247ms, count=17, retries=3] RX[sf=10, rssi=-104dBm, snr=6dB]")
    );
    assert!(report.received);
}

#[test]
fn test_compose_rx_only_and_failed() {
    let report = compose(Events::RX_PACKET, &stats(), false);
    assert_eq!(
        report.line.as_deref(),
        Some("LoRa stats: RX[sf=10, rssi=-104dBm, snr=6dB]")
    );
    assert!(report.received);

    let report = compose(Events::TX_PACKET | Events::TX_FAILED, &stats(), true);
    assert!(report.line.is_some());
    assert_eq!(report.failed_after, Some(3));

    let report = compose(Events::TX_FAILED, &stats(), true);
    assert!(report.line.is_none());
    assert_eq!(report.failed_after, Some(3));
}

#[test]
fn test_reporter_ignores_empty_events() {
    let time = SimTime::new();
    let led = SharedLed::new(MockLed::default());
    let flag = RxFlag::new();
    let mut reporter = EventReporter::new(&flag, &led, time.delay(), true);
    let mut radio = MockRadio {
        pending: Events::empty(),
        stats: stats(),
    };

    reporter.on_events(&mut radio);

    assert!(!flag.is_raised());
    assert!(led.with(|l| l.history.is_empty()));
    assert_eq!(time.now_ms(), 0);
}

#[test]
fn test_reporter_tx_without_ack_does_not_flash() {
    let time = SimTime::new();
    let led = SharedLed::new(MockLed::default());
    let flag = RxFlag::new();
    let mut reporter = EventReporter::new(&flag, &led, time.delay(), false);
    let mut radio = MockRadio {
        pending: Events::TX_PACKET,
        stats: stats(),
    };

    reporter.on_events(&mut radio);

    assert!(!flag.is_raised());
    assert!(led.with(|l| l.history.is_empty()));
    assert_eq!(radio.pending, Events::empty());
}

#[test]
fn test_reporter_ack_raises_flag_and_double_flashes() {
    let time = SimTime::new();
    let led = SharedLed::new(MockLed::default());
    let flag = RxFlag::new();
    let mut reporter = EventReporter::new(&flag, &led, time.delay(), true);
    let mut radio = MockRadio {
        pending: Events::TX_PACKET,
        stats: stats(),
    };

    reporter.on_events(&mut radio);

    assert!(flag.is_raised());
    assert_eq!(
        led.into_inner().history,
        vec![Color::PINK, Color::OFF, Color::PINK, Color::OFF]
    );
    assert_eq!(time.now_ms(), 800);
}

#[test]
fn test_reporter_log_output() {
    testing_logger::setup();
    let time = SimTime::new();
    let led = SharedLed::new(MockLed::default());
    let flag = RxFlag::new();
    let tx_line = "LoRa stats: TX[sf=10, airtime=247ms, count=17, retries=3]";
    let rx_line = " RX[sf=10, rssi=-104dBm, snr=6dB]";

    let mut unconfirmed = EventReporter::new(&flag, &led, time.delay(), false);
    let mut radio = MockRadio {
        pending: Events::empty(),
        stats: stats(),
    };
    unconfirmed.on_events(&mut radio);
    testing_logger::validate(|logs| assert!(logs.is_empty()));

    radio.pending = Events::TX_PACKET;
    unconfirmed.on_events(&mut radio);
    testing_logger::validate(|logs| {
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, Level::Info);
        assert_eq!(logs[0].body, tx_line);
    });

    let mut confirmed = EventReporter::new(&flag, &led, time.delay(), true);
    radio.pending = Events::TX_PACKET;
    confirmed.on_events(&mut radio);
    testing_logger::validate(|logs| {
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, Level::Info);
        assert_eq!(logs[0].body, format!("{}{}", tx_line, rx_line));
    });

    radio.pending = Events::TX_PACKET | Events::TX_FAILED;
    confirmed.on_events(&mut radio);
    testing_logger::validate(|logs| {
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].level, Level::Info);
        assert_eq!(logs[1].level, Level::Warn);
        assert_eq!(logs[1].body, "Warning: no ACK after 3 attempts");
    });
}

#[test]
fn test_rx_flag() {
    let flag = RxFlag::new();
    assert!(!flag.is_raised());
    flag.raise();
    assert!(flag.is_raised());
    flag.clear();
    assert!(!flag.is_raised());
}

#[test]
fn test_signaler_flash_sequence() {
    let time = SimTime::new();
    let led = SharedLed::new(MockLed::default());
    let mut signaler = Signaler::new(&led, time.delay());

    signaler.flash(Flash::SEND_TIMEOUT);
    assert_eq!(time.now_ms(), 4000);

    signaler.flash(Flash::new(Color::GREEN, 10, 20, 0));
    assert_eq!(time.now_ms(), 4000);

    signaler.sleep(Duration::from_millis(1500));
    assert_eq!(time.now_ms(), 5500);

    assert_eq!(
        led.into_inner().history,
        vec![Color::RED, Color::OFF, Color::RED, Color::OFF]
    );
}

#[test]
fn test_flash_durations() {
    assert_eq!(Flash::JOIN_POLL.duration(), Duration::from_secs(1));
    assert_eq!(Flash::RECEIVED.duration(), Duration::from_millis(800));
    assert_eq!(Flash::idle(29).duration(), Duration::from_secs(29));
    assert_eq!(Flash::idle(29).color, Color::YELLOW);
}

#[test]
fn test_color_from_rgb() {
    assert_eq!(
        Color::PINK,
        Color {
            red: 0xFF,
            green: 0x00,
            blue: 0x88
        }
    );
    assert_eq!(Color::from_rgb(0x7f7f00), Color::YELLOW);
}

/// PWM channel recording its duty cycle
#[derive(Debug, Default)]
struct MockPwm {
    duty: u16,
    enabled: bool,
}

impl PwmPin for MockPwm {
    type Duty = u16;

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn get_duty(&self) -> u16 {
        self.duty
    }

    fn get_max_duty(&self) -> u16 {
        1000
    }

    fn set_duty(&mut self, duty: u16) {
        self.duty = duty;
    }
}

#[test]
fn test_pwm_led_scales_duty() {
    let mut led = PwmRgbLed::new(MockPwm::default(), MockPwm::default(), MockPwm::default());
    led.set_color(Color::PINK);

    let (red, green, blue) = led.free();
    assert!(red.enabled && green.enabled && blue.enabled);
    assert_eq!(red.get_duty(), 1000);
    assert_eq!(green.get_duty(), 0);
    assert_eq!(blue.get_duty(), 533);
}
