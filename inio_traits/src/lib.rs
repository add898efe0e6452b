pub mod clock;
pub mod types;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use types::{Button, Mode, PowerReading, Temperature};

/// Error type used at the device trait boundary.
pub type DeviceError = Box<dyn std::error::Error + Send + Sync>;

/// The two things the calibration core can do with a lamp: command a
/// setting and read back the electrical signal.
pub trait Lamp {
    fn power(&mut self) -> Result<PowerReading, DeviceError>;
    fn set_color(&mut self, to: Temperature) -> Result<(), DeviceError>;
}

/// Mode handling, consumed by the accessory adapter only.
pub trait ModeSwitch {
    fn status(&mut self) -> Result<Mode, DeviceError>;
    fn press(&mut self, button: Button) -> Result<(), DeviceError>;
}

impl<T: Lamp + ?Sized> Lamp for &mut T {
    fn power(&mut self) -> Result<PowerReading, DeviceError> {
        (**self).power()
    }
    fn set_color(&mut self, to: Temperature) -> Result<(), DeviceError> {
        (**self).set_color(to)
    }
}

impl<T: Lamp + ?Sized> Lamp for Box<T> {
    fn power(&mut self) -> Result<PowerReading, DeviceError> {
        (**self).power()
    }
    fn set_color(&mut self, to: Temperature) -> Result<(), DeviceError> {
        (**self).set_color(to)
    }
}

impl<T: ModeSwitch + ?Sized> ModeSwitch for &mut T {
    fn status(&mut self) -> Result<Mode, DeviceError> {
        (**self).status()
    }
    fn press(&mut self, button: Button) -> Result<(), DeviceError> {
        (**self).press(button)
    }
}

impl<T: ModeSwitch + ?Sized> ModeSwitch for Box<T> {
    fn status(&mut self) -> Result<Mode, DeviceError> {
        (**self).status()
    }
    fn press(&mut self, button: Button) -> Result<(), DeviceError> {
        (**self).press(button)
    }
}
