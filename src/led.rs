//! RGB status LED
//!
//! The LED is the only feedback channel on a headless board, so every step of
//! the check maps to a colour pattern:
//! - blue: joining (short blinks), joined (one long flash)
//! - green: uplink on its way
//! - pink: acknowledgement or downlink received
//! - red: join failed or send timed out
//! - yellow: idle between uplinks

use core::cell::RefCell;
use core::time::Duration;

use critical_section::Mutex;
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::PwmPin;

/// 24-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color {
    /// Red intensity
    pub red: u8,
    /// Green intensity
    pub green: u8,
    /// Blue intensity
    pub blue: u8,
}

impl Color {
    /// LED off
    pub const OFF: Color = Color::from_rgb(0x000000);
    /// Join in progress
    pub const BLUE: Color = Color::from_rgb(0x0000ff);
    /// Uplink
    pub const GREEN: Color = Color::from_rgb(0x00ff00);
    /// Failure
    pub const RED: Color = Color::from_rgb(0xff0000);
    /// Idle
    pub const YELLOW: Color = Color::from_rgb(0x7f7f00);
    /// Acknowledgement or downlink
    pub const PINK: Color = Color::from_rgb(0xff0088);

    /// Colour from a packed `0xRRGGBB` value
    pub const fn from_rgb(rgb: u32) -> Self {
        Self {
            red: (rgb >> 16) as u8,
            green: (rgb >> 8) as u8,
            blue: rgb as u8,
        }
    }
}

/// Tri-colour LED
pub trait RgbLed {
    /// Show a colour; `Color::OFF` turns the LED off
    fn set_color(&mut self, color: Color);
}

/// RGB LED driven by three PWM channels
pub struct PwmRgbLed<R, G, B> {
    red: R,
    green: G,
    blue: B,
}

impl<R, G, B> PwmRgbLed<R, G, B>
where
    R: PwmPin<Duty = u16>,
    G: PwmPin<Duty = u16>,
    B: PwmPin<Duty = u16>,
{
    /// Take the three channels, enable them and switch the LED off
    pub fn new(mut red: R, mut green: G, mut blue: B) -> Self {
        set_level(&mut red, 0);
        set_level(&mut green, 0);
        set_level(&mut blue, 0);
        red.enable();
        green.enable();
        blue.enable();
        Self { red, green, blue }
    }

    /// Release the PWM channels
    pub fn free(self) -> (R, G, B) {
        (self.red, self.green, self.blue)
    }
}

impl<R, G, B> RgbLed for PwmRgbLed<R, G, B>
where
    R: PwmPin<Duty = u16>,
    G: PwmPin<Duty = u16>,
    B: PwmPin<Duty = u16>,
{
    fn set_color(&mut self, color: Color) {
        set_level(&mut self.red, color.red);
        set_level(&mut self.green, color.green);
        set_level(&mut self.blue, color.blue);
    }
}

// Scale an 8-bit level to the channel's duty range.
fn set_level<P: PwmPin<Duty = u16>>(pin: &mut P, level: u8) {
    let max = u32::from(pin.get_max_duty());
    let duty = max * u32::from(level) / 255;
    pin.set_duty(duty as u16);
}

/// LED shared between the main loop and the event callback
///
/// The lock is only held while a single colour is written.
pub struct SharedLed<L> {
    led: Mutex<RefCell<L>>,
}

impl<L: RgbLed> SharedLed<L> {
    /// Wrap an LED
    pub const fn new(led: L) -> Self {
        Self {
            led: Mutex::new(RefCell::new(led)),
        }
    }

    /// Show a colour
    pub fn set(&self, color: Color) {
        critical_section::with(|cs| self.led.borrow_ref_mut(cs).set_color(color));
    }

    /// Run `f` with exclusive access to the LED
    pub fn with<T>(&self, f: impl FnOnce(&mut L) -> T) -> T {
        critical_section::with(|cs| f(&mut *self.led.borrow_ref_mut(cs)))
    }

    /// Unwrap the LED
    pub fn into_inner(self) -> L {
        self.led.into_inner().into_inner()
    }
}

/// Blink pattern: `repeat` times colour for `on_ms`, then dark for `pause_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Flash {
    /// Colour while on
    pub color: Color,
    /// On time in milliseconds
    pub on_ms: u32,
    /// Off time in milliseconds
    pub pause_ms: u32,
    /// Number of on/off cycles
    pub repeat: u16,
}

impl Flash {
    /// One join poll, roughly a second
    pub const JOIN_POLL: Flash = Flash::new(Color::BLUE, 100, 900, 1);
    /// Join succeeded
    pub const JOINED: Flash = Flash::new(Color::BLUE, 1000, 1000, 1);
    /// Join timed out
    pub const JOIN_FAILED: Flash = Flash::new(Color::RED, 1000, 1000, 1);
    /// Uplink about to be sent
    pub const SENDING: Flash = Flash::new(Color::GREEN, 100, 300, 2);
    /// Blocking send timed out
    pub const SEND_TIMEOUT: Flash = Flash::new(Color::RED, 1000, 1000, 2);
    /// Acknowledgement or downlink reported by the stack
    pub const RECEIVED: Flash = Flash::new(Color::PINK, 100, 300, 2);

    /// Create a pattern
    pub const fn new(color: Color, on_ms: u32, pause_ms: u32, repeat: u16) -> Self {
        Self {
            color,
            on_ms,
            pause_ms,
            repeat,
        }
    }

    /// Low intensity blinking between uplinks, one second per blink
    pub const fn idle(blinks: u16) -> Self {
        Flash::new(Color::YELLOW, 200, 800, blinks)
    }

    /// Total time the pattern blocks its caller
    pub fn duration(&self) -> Duration {
        let cycle = u64::from(self.on_ms) + u64::from(self.pause_ms);
        Duration::from_millis(cycle * u64::from(self.repeat))
    }
}

/// Drives the shared LED through blocking blink patterns
pub struct Signaler<'a, L, D> {
    led: &'a SharedLed<L>,
    delay: D,
}

impl<'a, L: RgbLed, D: DelayMs<u32>> Signaler<'a, L, D> {
    /// Create a signaler with its own delay provider
    pub fn new(led: &'a SharedLed<L>, delay: D) -> Self {
        Self { led, delay }
    }

    /// Play a pattern, blocking until it finishes
    pub fn flash(&mut self, flash: Flash) {
        for _ in 0..flash.repeat {
            self.led.set(flash.color);
            self.delay.delay_ms(flash.on_ms);
            self.led.set(Color::OFF);
            self.delay.delay_ms(flash.pause_ms);
        }
    }

    /// Block without touching the LED
    pub fn sleep(&mut self, duration: Duration) {
        let ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        self.delay.delay_ms(ms);
    }

    /// Release the delay provider
    pub fn free(self) -> D {
        self.delay
    }
}
