//! Settle detection: wait until the lamp's duty stops changing.
//!
//! After a command the PWM outputs ramp for a while; reading during the ramp
//! would record a transient. The detector polls until two consecutive
//! readings are identical, but gives up after `max_polls` follow-up polls.

use std::sync::Arc;

use inio_traits::clock::{Clock, MonotonicClock};
use inio_traits::{Lamp, PowerReading};
use tracing::{trace, warn};

use crate::config::SettleCfg;
use crate::error::InioError;
use crate::hw_error::map_device_error;

enum SettleState {
    Polling { last: PowerReading, polls: u32 },
    Settled(PowerReading),
}

#[derive(Clone)]
pub struct SettleDetector {
    cfg: SettleCfg,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl std::fmt::Debug for SettleDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettleDetector")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl SettleDetector {
    pub fn new(cfg: SettleCfg) -> Self {
        Self::with_clock(cfg, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(cfg: SettleCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { cfg, clock }
    }

    pub fn cfg(&self) -> &SettleCfg {
        &self.cfg
    }

    /// Read the lamp until two consecutive readings agree and return the last one.
    pub fn read_stable<L: Lamp + ?Sized>(&self, lamp: &mut L) -> Result<PowerReading, InioError> {
        let mut state = SettleState::Polling {
            last: read(lamp)?,
            polls: 0,
        };
        loop {
            state = match state {
                SettleState::Settled(reading) => {
                    trace!(cold = reading.cold, warm = reading.warm, "settled");
                    return Ok(reading);
                }
                SettleState::Polling { last, polls } => {
                    if polls >= self.cfg.max_polls {
                        warn!(polls, %last, "power reading did not settle");
                        return Err(InioError::DidNotSettle { polls, last });
                    }
                    self.clock.sleep(self.cfg.poll_interval);
                    let next = read(lamp)?;
                    if next == last {
                        SettleState::Settled(next)
                    } else {
                        SettleState::Polling {
                            last: next,
                            polls: polls + 1,
                        }
                    }
                }
            };
        }
    }
}

fn read<L: Lamp + ?Sized>(lamp: &mut L) -> Result<PowerReading, InioError> {
    lamp.power().map_err(|e| map_device_error(&*e))
}
