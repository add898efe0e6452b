//! Home-automation facing adapter.
//!
//! Exposes the lamp as On/Off, Brightness and Color Temperature
//! characteristics plus a connected/disconnected mode switch. Reads go
//! through the settle detector and the estimator; writes go to the device.
//!
//! Getters return errors to the caller. Setters log failures and return
//! normally, since a failed home-automation write must not take the bridge
//! down; the `try_` variants surface the error instead.

use std::sync::Arc;

use inio_traits::{Lamp, Mode, ModeSwitch, Temperature};
use tracing::{debug, error, info};

use crate::error::InioError;
use crate::estimator::Estimator;
use crate::grid::{self, BRIGHTNESS_MAX, KELVIN_MAX, KELVIN_MIN};
use crate::hw_error::map_device_error;
use crate::settle::SettleDetector;
use crate::transitions::{Goal, TransitionTable};

/// Color temperature in mireds for a kelvin value, rounded to the nearest integer.
pub fn kelvin_to_mireds(kelvin: u16) -> u32 {
    if kelvin == 0 {
        return u32::MAX;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let m = (1_000_000.0 / f64::from(kelvin)).round() as u32;
    m
}

/// Kelvin for a mired value, clamped to the lamp's range and snapped to the grid step.
pub fn mireds_to_kelvin(mireds: u32) -> u16 {
    if mireds == 0 {
        return KELVIN_MAX;
    }
    grid::snap_kelvin(1_000_000.0 / f64::from(mireds))
}

/// Coolest setting, in mireds.
pub const MIN_MIREDS: u32 = 154;
/// Warmest setting, in mireds.
pub const MAX_MIREDS: u32 = 370;

pub struct Accessory<D> {
    device: D,
    estimator: Arc<Estimator>,
    settle: SettleDetector,
    table: TransitionTable,
}

impl<D> std::fmt::Debug for Accessory<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessory")
            .field("samples", &self.estimator.len())
            .field("settle", &self.settle)
            .finish_non_exhaustive()
    }
}

impl<D: Lamp + ModeSwitch> Accessory<D> {
    pub fn new(device: D, estimator: Arc<Estimator>, settle: SettleDetector) -> Self {
        Self {
            device,
            estimator,
            settle,
            table: TransitionTable::standard(),
        }
    }

    pub fn with_table(mut self, table: TransitionTable) -> Self {
        self.table = table;
        self
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    pub fn status(&mut self) -> Result<Mode, InioError> {
        self.device.status().map_err(|e| map_device_error(&*e))
    }

    /// Settled reading inverted through the calibration map.
    pub fn current(&mut self) -> Result<Temperature, InioError> {
        let reading = self.settle.read_stable(&mut self.device)?;
        let t = self.estimator.estimate(reading);
        debug!(%reading, estimate = %t, "current setting");
        Ok(t)
    }

    /// Press the buttons that take the lamp from its current mode to `goal`.
    pub fn transition(&mut self, goal: Goal) -> Result<(), InioError> {
        let mode = self.status()?;
        let presses = self.table.presses(&mode, goal)?.to_vec();
        info!(%mode, %goal, presses = presses.len(), "mode transition");
        for button in presses {
            self.device
                .press(button)
                .map_err(|e| map_device_error(&*e))?;
        }
        Ok(())
    }

    // ── Mode ────────────────────────────────────────────────────────────────

    pub fn mode_get(&mut self) -> Result<bool, InioError> {
        Ok(self.status()? == Mode::Connected)
    }

    pub fn try_mode_set(&mut self, connected: bool) -> Result<(), InioError> {
        self.transition(if connected {
            Goal::Connected
        } else {
            Goal::Disconnected
        })
    }

    pub fn mode_set(&mut self, connected: bool) {
        if let Err(e) = self.try_mode_set(connected) {
            error!(connected, error = %e, "mode set failed");
        }
    }

    // ── On/Off ──────────────────────────────────────────────────────────────

    pub fn on_get(&mut self) -> Result<bool, InioError> {
        Ok(self.status()? != Mode::Off)
    }

    pub fn try_on_set(&mut self, on: bool) -> Result<(), InioError> {
        self.transition(if on { Goal::LightOn } else { Goal::LightOff })
    }

    pub fn on_set(&mut self, on: bool) {
        if let Err(e) = self.try_on_set(on) {
            error!(on, error = %e, "on set failed");
        }
    }

    // ── Brightness ──────────────────────────────────────────────────────────

    pub fn brightness_get(&mut self) -> Result<u8, InioError> {
        Ok(self.current()?.brightness)
    }

    /// `0` switches the lamp off; anything else switches it on if needed and
    /// keeps the current color temperature.
    pub fn try_brightness_set(&mut self, value: u8) -> Result<(), InioError> {
        if value == 0 {
            return self.transition(Goal::LightOff);
        }
        if self.status()? == Mode::Off {
            self.transition(Goal::LightOn)?;
        }
        let kelvin = self.current()?.kelvin;
        let to = Temperature::new(value.min(BRIGHTNESS_MAX), kelvin);
        self.device
            .set_color(to)
            .map_err(|e| map_device_error(&*e))
    }

    pub fn brightness_set(&mut self, value: u8) {
        if let Err(e) = self.try_brightness_set(value) {
            error!(value, error = %e, "brightness set failed");
        }
    }

    // ── Color temperature ───────────────────────────────────────────────────

    pub fn color_temperature_get(&mut self) -> Result<u32, InioError> {
        Ok(kelvin_to_mireds(self.current()?.kelvin))
    }

    pub fn try_color_temperature_set(&mut self, mireds: u32) -> Result<(), InioError> {
        let kelvin = mireds_to_kelvin(mireds);
        debug_assert!((KELVIN_MIN..=KELVIN_MAX).contains(&kelvin));
        let brightness = self.current()?.brightness;
        self.device
            .set_color(Temperature::new(brightness, kelvin))
            .map_err(|e| map_device_error(&*e))
    }

    pub fn color_temperature_set(&mut self, mireds: u32) {
        if let Err(e) = self.try_color_temperature_set(mireds) {
            error!(mireds, error = %e, "color temperature set failed");
        }
    }
}
