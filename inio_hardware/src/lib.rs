pub mod error;
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpLamp;

use std::collections::HashMap;

use inio_traits::{Button, DeviceError, Lamp, Mode, ModeSwitch, PowerReading, Temperature};

use crate::error::HwError;

/// Full-scale PWM duty of one channel.
pub const DUTY_FULL_SCALE: f64 = 255.0;

/// Duty the simulated lamp settles on for a given setting.
///
/// Total duty scales with brightness; kelvin splits it between the warm
/// (2700 K) and cold (6500 K) channels.
pub fn simulated_duty(t: Temperature) -> PowerReading {
    let level = f64::from(t.brightness.min(100)) / 100.0 * DUTY_FULL_SCALE;
    let frac = (f64::from(t.kelvin.clamp(2700, 6500)) - 2700.0) / 3800.0;
    PowerReading::new(round3(level * frac), round3(level * (1.0 - frac)))
}

#[inline]
fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Simulated lamp implementation
///
/// Ramps linearly from the previous duty to the new one over `lag` reads
/// after every `set_color`, then holds steady. Faults and a never-settling
/// mode can be injected for tests.
#[derive(Debug)]
pub struct SimulatedLamp {
    mode: Mode,
    start: PowerReading,
    current: PowerReading,
    target: PowerReading,
    lag: u32,
    ramp_left: u32,
    never_settle: bool,
    flip: bool,
    faults: HashMap<Temperature, u32>,
    last_color: Option<Temperature>,
    set_calls: usize,
    power_calls: usize,
    presses: Vec<Button>,
}

impl Default for SimulatedLamp {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedLamp {
    pub fn new() -> Self {
        Self {
            mode: Mode::Connected,
            start: PowerReading::default(),
            current: PowerReading::default(),
            target: PowerReading::default(),
            lag: 0,
            ramp_left: 0,
            never_settle: false,
            flip: false,
            faults: HashMap::new(),
            last_color: None,
            set_calls: 0,
            power_calls: 0,
            presses: Vec::new(),
        }
    }

    /// Number of reads a new setting takes to reach its final duty.
    pub fn with_lag(mut self, reads: u32) -> Self {
        self.lag = reads;
        self
    }

    /// Readings alternate forever and never repeat.
    pub fn never_settle(mut self) -> Self {
        self.never_settle = true;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Make the next `times` `set_color` calls for `at` fail.
    pub fn fail_times(mut self, at: Temperature, times: u32) -> Self {
        self.faults.insert(at, times);
        self
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn last_color(&self) -> Option<Temperature> {
        self.last_color
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls
    }

    pub fn power_calls(&self) -> usize {
        self.power_calls
    }

    pub fn presses(&self) -> &[Button] {
        &self.presses
    }
}

impl Lamp for SimulatedLamp {
    fn power(&mut self) -> Result<PowerReading, DeviceError> {
        self.power_calls += 1;
        if self.mode == Mode::Off {
            return Ok(PowerReading::default());
        }
        if self.never_settle {
            self.flip = !self.flip;
            let bump = if self.flip { 0.5 } else { 0.0 };
            return Ok(PowerReading::new(self.target.cold + bump, self.target.warm));
        }
        if self.ramp_left > 0 {
            self.ramp_left -= 1;
            let done = f64::from(self.lag - self.ramp_left) / f64::from(self.lag);
            self.current = PowerReading::new(
                round3(self.start.cold + (self.target.cold - self.start.cold) * done),
                round3(self.start.warm + (self.target.warm - self.start.warm) * done),
            );
        } else {
            self.current = self.target;
        }
        tracing::trace!(cold = self.current.cold, warm = self.current.warm, "simulated duty");
        Ok(self.current)
    }

    fn set_color(&mut self, to: Temperature) -> Result<(), DeviceError> {
        self.set_calls += 1;
        if let Some(left) = self.faults.get_mut(&to)
            && *left > 0
        {
            *left -= 1;
            return Err(HwError::Simulated(format!("set_color {to} rejected")).into());
        }
        self.last_color = Some(to);
        self.start = self.current;
        self.target = simulated_duty(to);
        self.ramp_left = self.lag;
        Ok(())
    }
}

impl ModeSwitch for SimulatedLamp {
    fn status(&mut self) -> Result<Mode, DeviceError> {
        Ok(self.mode.clone())
    }

    fn press(&mut self, button: Button) -> Result<(), DeviceError> {
        self.presses.push(button);
        self.mode = match (button, &self.mode) {
            (Button::Manual, Mode::Off) => Mode::Static,
            (Button::Manual, _) => Mode::Off,
            (Button::Connect, Mode::Scenario | Mode::Static) => Mode::Connected,
            (Button::Connect, other) => other.clone(),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_model_corners() {
        assert_eq!(
            simulated_duty(Temperature::new(100, 6500)),
            PowerReading::new(255.0, 0.0)
        );
        assert_eq!(
            simulated_duty(Temperature::new(100, 2700)),
            PowerReading::new(0.0, 255.0)
        );
        assert_eq!(
            simulated_duty(Temperature::new(0, 4000)),
            PowerReading::new(0.0, 0.0)
        );
    }

    #[test]
    fn test_simulated_lamp_ramps_then_holds() {
        let mut lamp = SimulatedLamp::new().with_lag(2);
        lamp.set_color(Temperature::new(100, 6500)).unwrap();
        let r1 = lamp.power().unwrap();
        let r2 = lamp.power().unwrap();
        let r3 = lamp.power().unwrap();
        assert_eq!(r1, PowerReading::new(127.5, 0.0));
        assert_eq!(r2, PowerReading::new(255.0, 0.0));
        assert_eq!(r2, r3);
    }

    #[test]
    fn test_injected_fault_is_transient() {
        let t = Temperature::new(10, 3000);
        let mut lamp = SimulatedLamp::new().fail_times(t, 1);
        assert!(lamp.set_color(t).is_err());
        assert!(lamp.set_color(t).is_ok());
        assert_eq!(lamp.set_calls(), 2);
        assert_eq!(lamp.last_color(), Some(t));
    }

    #[test]
    fn test_buttons_walk_modes() {
        let mut lamp = SimulatedLamp::new().with_mode(Mode::Off);
        lamp.press(Button::Connect).unwrap();
        assert_eq!(lamp.mode(), &Mode::Off);
        lamp.press(Button::Manual).unwrap();
        assert_eq!(lamp.mode(), &Mode::Static);
        lamp.press(Button::Connect).unwrap();
        assert_eq!(lamp.mode(), &Mode::Connected);
        lamp.press(Button::Manual).unwrap();
        assert_eq!(lamp.mode(), &Mode::Off);
        assert_eq!(lamp.power().unwrap(), PowerReading::default());
    }
}
