//! The discrete (brightness, kelvin) control domain swept during calibration.

use inio_traits::Temperature;

pub const BRIGHTNESS_MIN: u8 = 0;
pub const BRIGHTNESS_MAX: u8 = 100;
pub const KELVIN_MIN: u16 = 2700;
pub const KELVIN_MAX: u16 = 6500;
pub const KELVIN_STEP: u16 = 10;

/// 101 brightness levels.
pub const BRIGHTNESS_LEVELS: usize = (BRIGHTNESS_MAX - BRIGHTNESS_MIN) as usize + 1;
/// 381 kelvin levels.
pub const KELVIN_LEVELS: usize = ((KELVIN_MAX - KELVIN_MIN) / KELVIN_STEP) as usize + 1;
/// 38,481 grid points.
pub const GRID_POINTS: usize = BRIGHTNESS_LEVELS * KELVIN_LEVELS;

/// Brightness values in sweep order (outer loop).
pub fn brightness_rows() -> impl Iterator<Item = u8> {
    BRIGHTNESS_MIN..=BRIGHTNESS_MAX
}

/// Kelvin values in sweep order (inner loop).
pub fn kelvin_steps() -> impl Iterator<Item = u16> {
    (KELVIN_MIN..=KELVIN_MAX).step_by(usize::from(KELVIN_STEP))
}

/// All grid points of one brightness row, in sweep order.
pub fn row(brightness: u8) -> impl Iterator<Item = Temperature> {
    kelvin_steps().map(move |k| Temperature::new(brightness, k))
}

/// Every grid point in sweep order.
pub fn points() -> impl Iterator<Item = Temperature> {
    brightness_rows().flat_map(row)
}

pub fn is_grid_point(t: Temperature) -> bool {
    t.brightness <= BRIGHTNESS_MAX
        && (KELVIN_MIN..=KELVIN_MAX).contains(&t.kelvin)
        && (t.kelvin - KELVIN_MIN) % KELVIN_STEP == 0
}

/// Clamp an arbitrary kelvin value into range and snap it to the nearest step.
pub fn snap_kelvin(kelvin: f64) -> u16 {
    if kelvin.is_nan() {
        return KELVIN_MIN;
    }
    let clamped = kelvin.clamp(f64::from(KELVIN_MIN), f64::from(KELVIN_MAX));
    let steps = ((clamped - f64::from(KELVIN_MIN)) / f64::from(KELVIN_STEP)).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let snapped = KELVIN_MIN + (steps as u16) * KELVIN_STEP;
    snapped.min(KELVIN_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn grid_has_expected_size_and_order() {
        assert_eq!(BRIGHTNESS_LEVELS, 101);
        assert_eq!(KELVIN_LEVELS, 381);
        assert_eq!(GRID_POINTS, 38_481);
        let pts: Vec<_> = points().collect();
        assert_eq!(pts.len(), GRID_POINTS);
        assert_eq!(pts[0], Temperature::new(0, 2700));
        assert_eq!(pts[1], Temperature::new(0, 2710));
        assert_eq!(pts[KELVIN_LEVELS], Temperature::new(1, 2700));
        assert_eq!(pts[GRID_POINTS - 1], Temperature::new(100, 6500));
        assert!(pts.iter().all(|t| is_grid_point(*t)));
    }

    #[rstest]
    #[case(Temperature::new(101, 2700), false)]
    #[case(Temperature::new(50, 2690), false)]
    #[case(Temperature::new(50, 6510), false)]
    #[case(Temperature::new(50, 2705), false)]
    #[case(Temperature::new(50, 4000), true)]
    fn grid_membership(#[case] t: Temperature, #[case] expected: bool) {
        assert_eq!(is_grid_point(t), expected);
    }

    #[rstest]
    #[case(1000.0, 2700)]
    #[case(9000.0, 6500)]
    #[case(4004.9, 4000)]
    #[case(4005.0, 4010)]
    #[case(f64::NAN, 2700)]
    fn snapping(#[case] k: f64, #[case] expected: u16) {
        assert_eq!(snap_kelvin(k), expected);
    }
}
