//! Physical orientation from a single accelerometer sample.

use crate::rotation::Rotation;
use crate::{FLAT_THRESHOLD_MG, TILT_THRESHOLD_MG};

/// Which edge of the display points up.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Orientation {
    /// Classify a 3-axis acceleration sample given in g.
    ///
    /// Lying flat, or any reading that is not clearly tilted along one axis,
    /// classifies as [`Orientation::Up`]. Pure: the same sample always gives the
    /// same answer.
    #[must_use]
    pub fn classify(acceleration: [f32; 3]) -> Self {
        let [x, y, z] = acceleration.map(to_milli_g);
        let (ax, ay, az) = (x.saturating_abs(), y.saturating_abs(), z.saturating_abs());

        if ax < FLAT_THRESHOLD_MG && az < FLAT_THRESHOLD_MG && ay > TILT_THRESHOLD_MG {
            if y > 0 { Self::Up } else { Self::Down }
        } else if ay < FLAT_THRESHOLD_MG && az < FLAT_THRESHOLD_MG && ax > TILT_THRESHOLD_MG {
            if x > 0 { Self::Right } else { Self::Left }
        } else {
            Self::Up
        }
    }

    /// Clockwise rotation that renders glyphs upright in this orientation.
    #[must_use]
    pub const fn rotation(self) -> Rotation {
        match self {
            Self::Up => Rotation::Deg0,
            Self::Right => Rotation::Deg90,
            Self::Down => Rotation::Deg180,
            Self::Left => Rotation::Deg270,
        }
    }

    const fn from_rotation(rotation: Rotation) -> Self {
        match rotation {
            Rotation::Deg0 => Self::Up,
            Rotation::Deg90 => Self::Right,
            Rotation::Deg180 => Self::Down,
            Rotation::Deg270 => Self::Left,
        }
    }

    /// Correct for an IMU mounted rotated relative to the display.
    #[must_use]
    pub const fn with_offset(self, offset: Rotation) -> Self {
        Self::from_rotation(self.rotation().then(offset))
    }
}

// Saturating float-to-int conversion; NaN becomes 0.
#[allow(clippy::cast_possible_truncation, reason = "saturating conversion is intended")]
fn to_milli_g(g: f32) -> i32 {
    (g * 1000.0) as i32
}

/// A source of acceleration samples, in g.
pub trait Accelerometer {
    type Error;

    /// # Errors
    ///
    /// Returns the sensor's error when the sample cannot be read.
    fn acceleration(&mut self) -> Result<[f32; 3], Self::Error>;
}

/// Sample `imu` once and classify it. A failed read counts as [`Orientation::Up`].
pub fn read_orientation<A: Accelerometer>(imu: &mut A, offset: Rotation) -> Orientation {
    let Ok(sample) = imu.acceleration() else {
        warn!("IMU read failed, assuming upright");
        return Orientation::Up;
    };
    let orientation = Orientation::classify(sample).with_offset(offset);
    debug!("Orientation: {:?}", orientation);
    orientation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilts_classify_by_dominant_axis() {
        assert_eq!(Orientation::classify([0.0, 1.0, 0.1]), Orientation::Up);
        assert_eq!(Orientation::classify([0.0, -0.98, 0.2]), Orientation::Down);
        assert_eq!(Orientation::classify([0.7, 0.1, 0.1]), Orientation::Right);
        assert_eq!(Orientation::classify([-0.7, 0.1, -0.1]), Orientation::Left);
    }

    #[test]
    fn flat_and_ambiguous_default_to_up() {
        assert_eq!(Orientation::classify([0.0, 0.0, 1.0]), Orientation::Up);
        assert_eq!(Orientation::classify([0.0, 0.0, -1.0]), Orientation::Up);
        // Strong on both X and Y.
        assert_eq!(Orientation::classify([-0.95, -0.95, 0.0]), Orientation::Up);
        assert_eq!(Orientation::classify([f32::NEG_INFINITY, 0.0, 0.0]), Orientation::Left);
        assert_eq!(Orientation::classify([f32::NAN, 0.0, 0.0]), Orientation::Up);
    }

    #[test]
    fn offset_rotates_clockwise() {
        assert_eq!(Orientation::Up.with_offset(Rotation::Deg90), Orientation::Right);
        assert_eq!(Orientation::Left.with_offset(Rotation::Deg180), Orientation::Right);
        assert_eq!(Orientation::Down.with_offset(Rotation::Deg0), Orientation::Down);
    }
}
