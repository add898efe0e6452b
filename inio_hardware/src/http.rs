//! Blocking HTTP client for the lamp's local REST API.

use std::time::Duration;

use inio_traits::{Button, DeviceError, Lamp, Mode, ModeSwitch, PowerReading, Temperature};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{HwError, Result};

const PWM_DUTY: &str = "/api/app/pwm_duty_get";
const LIGHT_COLOR: &str = "/api/app/light_color";
const STATUS: &str = "/api/app/status";
const BTN_CONNECT: &str = "/api/interface/btn_short_connect";
const BTN_MANUAL: &str = "/api/interface/btn_short_manual";

#[derive(Debug, Deserialize)]
struct DutyWire {
    cold: f64,
    warm: f64,
}

#[derive(Debug, Serialize)]
struct ColorWire {
    brightness: u8,
    kelvin: u16,
}

#[derive(Debug, Deserialize)]
struct StatusWire {
    mode: String,
}

pub struct HttpLamp {
    client: reqwest::blocking::Client,
    base: String,
}

impl HttpLamp {
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self> {
        let base = normalize_base(url)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| HwError::Transport(e.to_string()))?;
        debug!(base = %base, timeout_ms = request_timeout.as_millis() as u64, "http lamp ready");
        Ok(Self { client, base })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &'static str) -> Result<T> {
        let resp = self
            .client
            .get(self.endpoint(path))
            .send()
            .map_err(|e| transport_error(path, &e))?;
        check_status(path, resp)?
            .json::<T>()
            .map_err(|e| HwError::Decode {
                path,
                reason: e.to_string(),
            })
    }

    fn post_json<B: Serialize>(&self, path: &'static str, body: &B) -> Result<()> {
        let resp = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .map_err(|e| transport_error(path, &e))?;
        check_status(path, resp).map(|_| ())
    }

    fn put(&self, path: &'static str) -> Result<()> {
        let resp = self
            .client
            .put(self.endpoint(path))
            .send()
            .map_err(|e| transport_error(path, &e))?;
        check_status(path, resp).map(|_| ())
    }
}

impl Lamp for HttpLamp {
    fn power(&mut self) -> std::result::Result<PowerReading, DeviceError> {
        let duty: DutyWire = self.get_json(PWM_DUTY)?;
        if !(duty.cold.is_finite() && duty.warm.is_finite()) || duty.cold < 0.0 || duty.warm < 0.0
        {
            return Err(HwError::Decode {
                path: PWM_DUTY,
                reason: format!("duty out of range: cold={} warm={}", duty.cold, duty.warm),
            }
            .into());
        }
        trace!(cold = duty.cold, warm = duty.warm, "pwm duty");
        Ok(PowerReading::new(duty.cold, duty.warm))
    }

    fn set_color(&mut self, to: Temperature) -> std::result::Result<(), DeviceError> {
        trace!(brightness = to.brightness, kelvin = to.kelvin, "light color");
        self.post_json(
            LIGHT_COLOR,
            &ColorWire {
                brightness: to.brightness,
                kelvin: to.kelvin,
            },
        )?;
        Ok(())
    }
}

impl ModeSwitch for HttpLamp {
    fn status(&mut self) -> std::result::Result<Mode, DeviceError> {
        let status: StatusWire = self.get_json(STATUS)?;
        Ok(Mode::from_wire(&status.mode))
    }

    fn press(&mut self, button: Button) -> std::result::Result<(), DeviceError> {
        let path = match button {
            Button::Connect => BTN_CONNECT,
            Button::Manual => BTN_MANUAL,
        };
        debug!(%button, "button press");
        self.put(path)?;
        Ok(())
    }
}

fn transport_error(path: &'static str, e: &reqwest::Error) -> HwError {
    if e.is_timeout() {
        HwError::Timeout { path }
    } else {
        HwError::Transport(e.to_string())
    }
}

fn check_status(
    path: &'static str,
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(HwError::Status {
            path,
            status: status.as_u16(),
        })
    }
}

/// Strip whitespace and trailing slashes; require an http(s) scheme.
pub fn normalize_base(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(HwError::InvalidUrl(url.to_string()));
    }
    Ok(trimmed.to_string())
}
