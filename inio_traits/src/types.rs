//! Plain value types shared by every crate in the workspace.

use std::fmt;

/// The control vector: brightness percentage and color temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Temperature {
    /// 0..=100
    pub brightness: u8,
    /// 2700..=6500
    pub kelvin: u16,
}

impl Temperature {
    #[inline]
    pub const fn new(brightness: u8, kelvin: u16) -> Self {
        Self { brightness, kelvin }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%@{}K", self.brightness, self.kelvin)
    }
}

/// Two-channel duty reading reported by the lamp.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PowerReading {
    pub cold: f64,
    pub warm: f64,
}

impl PowerReading {
    #[inline]
    pub const fn new(cold: f64, warm: f64) -> Self {
        Self { cold, warm }
    }
}

impl fmt::Display for PowerReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cold={} warm={}", self.cold, self.warm)
    }
}

/// Operating mode as reported by the lamp's status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mode {
    Off,
    Connected,
    Scenario,
    Static,
    /// Anything the firmware reports that we do not know about.
    Unknown(String),
}

impl Mode {
    /// The closed set of modes the transition table must cover.
    pub const KNOWN: [Mode; 4] = [Mode::Off, Mode::Connected, Mode::Scenario, Mode::Static];

    /// Parse the firmware's upper-case mode name.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "OFF" => Mode::Off,
            "CONNECTED" => Mode::Connected,
            "SCENARIO" => Mode::Scenario,
            "STATIC" => Mode::Static,
            other => Mode::Unknown(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            Mode::Off => "OFF",
            Mode::Connected => "CONNECTED",
            Mode::Scenario => "SCENARIO",
            Mode::Static => "STATIC",
            Mode::Unknown(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Physical buttons exposed by the lamp's interface API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Short press on the "connect" button.
    Connect,
    /// Short press on the "manual" button.
    Manual,
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Button::Connect => f.write_str("connect"),
            Button::Manual => f.write_str("manual"),
        }
    }
}
