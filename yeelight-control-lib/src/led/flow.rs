use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use serde::Serialize;

use crate::led::led_color::Rgb;

/// Bulbs reject flow steps shorter than this.
pub const MIN_STEP_DURATION: Duration = Duration::from_millis(50);

/// Brightness value telling the bulb to keep its current brightness for a step.
pub const KEEP_BRIGHTNESS: i32 = -1;

/// What a single color flow step changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowMode {
    /// Transition to an RGB color.
    Color(Rgb),
    /// Transition to a color temperature in Kelvin.
    ColorTemperature(u32),
    /// Hold the current state.
    Sleep,
}

impl FlowMode {
    fn code(&self) -> u8 {
        match self {
            FlowMode::Color(_) => 1,
            FlowMode::ColorTemperature(_) => 2,
            FlowMode::Sleep => 7,
        }
    }

    fn value(&self) -> u32 {
        match self {
            FlowMode::Color(rgb) => rgb.to_packed(),
            FlowMode::ColorTemperature(kelvin) => *kelvin,
            FlowMode::Sleep => 0,
        }
    }
}

/// One `duration,mode,value,brightness` tuple of a color flow expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowStep {
    pub duration: Duration,
    pub mode: FlowMode,
    /// 1..=100, or [`KEEP_BRIGHTNESS`].
    pub brightness: i32,
}

impl FlowStep {
    pub fn color(duration: Duration, rgb: Rgb, brightness: i32) -> Self {
        FlowStep {
            duration,
            mode: FlowMode::Color(rgb),
            brightness,
        }
    }

    pub fn color_temperature(duration: Duration, kelvin: u32, brightness: i32) -> Self {
        FlowStep {
            duration,
            mode: FlowMode::ColorTemperature(kelvin),
            brightness,
        }
    }

    pub fn sleep(duration: Duration) -> Self {
        FlowStep {
            duration,
            mode: FlowMode::Sleep,
            brightness: KEEP_BRIGHTNESS,
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let duration = self.duration.max(MIN_STEP_DURATION).as_millis();
        let brightness = if self.brightness == KEEP_BRIGHTNESS {
            KEEP_BRIGHTNESS
        } else {
            self.brightness.clamp(1, 100)
        };
        write!(
            f,
            "{},{},{},{}",
            duration,
            self.mode.code(),
            self.mode.value(),
            brightness
        )
    }
}

/// An ordered series of flow steps, rendered as the comma separated
/// expression accepted by `start_cf` and the `cf` scene.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowExpression {
    steps: Vec<FlowStep>,
}

impl FlowExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: FlowStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Number of steps, which is also the `count` that runs the flow exactly once.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl From<Vec<FlowStep>> for FlowExpression {
    fn from(steps: Vec<FlowStep>) -> Self {
        FlowExpression { steps }
    }
}

impl fmt::Display for FlowExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.steps.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join(","))
    }
}

/// What the bulb does once a color flow ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlowAction {
    /// Return to the state before the flow started.
    Recover,
    /// Stay at the last state of the flow.
    Stay,
    /// Turn the bulb off.
    TurnOff,
}

impl Serialize for FlowAction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let code = match self {
            FlowAction::Recover => 0,
            FlowAction::Stay => 1,
            FlowAction::TurnOff => 2,
        };
        serializer.serialize_u8(code)
    }
}
