//! Status indicator shared between tasks
//!
//! The logical color is written by the UDP service (keyword commands) and
//! the dashboard (link transitions) and read by the heartbeat, which blinks
//! it. Every read-modify-write, including driving the pins, happens inside
//! one critical section so a blink can never show a half-applied color.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::digital::{OutputPin, PinState};
use lumen_protocol::Color;

/// Something that can display a color
pub trait IndicatorOutput {
    fn drive(&mut self, color: Color);
}

/// Three-channel LED on plain GPIOs
pub struct RgbLed<R, G, B> {
    red: R,
    green: G,
    blue: B,
    active_low: bool,
}

impl<R: OutputPin, G: OutputPin, B: OutputPin> RgbLed<R, G, B> {
    pub fn new(red: R, green: G, blue: B, active_low: bool) -> Self {
        Self {
            red,
            green,
            blue,
            active_low,
        }
    }

    fn level(&self, on: bool) -> PinState {
        PinState::from(on != self.active_low)
    }
}

impl<R: OutputPin, G: OutputPin, B: OutputPin> IndicatorOutput for RgbLed<R, G, B> {
    fn drive(&mut self, color: Color) {
        let (r, g, b) = color.channels();
        let (r, g, b) = (self.level(r), self.level(g), self.level(b));
        // GPIO writes on the boards we target are infallible
        let _ = self.red.set_state(r);
        let _ = self.green.set_state(g);
        let _ = self.blue.set_state(b);
    }
}

struct State<O> {
    color: Color,
    lit: bool,
    driven: Color,
    output: O,
}

impl<O: IndicatorOutput> State<O> {
    fn apply(&mut self) {
        let shown = if self.lit { self.color } else { Color::Off };
        self.output.drive(shown);
        self.driven = shown;
    }
}

/// The shared indicator
pub struct StatusIndicator<O> {
    state: Mutex<CriticalSectionRawMutex, RefCell<State<O>>>,
}

impl<O: IndicatorOutput> StatusIndicator<O> {
    /// Take ownership of the output and switch it off
    pub fn new(mut output: O) -> Self {
        output.drive(Color::Off);
        Self {
            state: Mutex::new(RefCell::new(State {
                color: Color::Off,
                lit: true,
                driven: Color::Off,
                output,
            })),
        }
    }

    /// Replace the logical color and show it immediately
    pub fn set(&self, color: Color) {
        self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            state.color = color;
            state.lit = true;
            state.apply();
        });
    }

    /// Flip the blink phase without touching the logical color
    pub fn toggle(&self) {
        self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            state.lit = !state.lit;
            state.apply();
        });
    }

    /// Logical color
    pub fn color(&self) -> Color {
        self.state.lock(|cell| cell.borrow().color)
    }

    /// Color currently on the output (off during the dark blink phase)
    pub fn driven(&self) -> Color {
        self.state.lock(|cell| cell.borrow().driven)
    }
}
