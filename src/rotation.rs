//! Orientation lookup tables for rotating glyphs onto a physically rotated pixel grid.
//!
//! A lookup table (LUT) maps each canonical pixel index `row * width + col` to the
//! physical index that pixel lands on after the panel is rotated clockwise by a
//! multiple of 90 degrees. Every table is a permutation of `0..width * height`.
//!
//! ```text
//! 3×2 canonical      90° (addressed as 2×3)
//!   0  1  2            3  0
//!   3  4  5            4  1
//!                      5  2
//! ```
//!
//! Non-square panels can only take a 90°/270° table when their wiring allows the
//! width and height to be swapped for addressing. See [`DisplayGeometry::transposable`].

use crate::{Error, Result};

/// Clockwise rotation in quarter turns.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Self; 4] = [Self::Deg0, Self::Deg90, Self::Deg180, Self::Deg270];

    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 1,
            Self::Deg180 => 2,
            Self::Deg270 => 3,
        }
    }

    #[must_use]
    pub const fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Self::Deg0,
            1 => Self::Deg90,
            2 => Self::Deg180,
            _ => Self::Deg270,
        }
    }

    /// The rotation equivalent to applying `self` and then `other`.
    #[must_use]
    pub const fn then(self, other: Self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + other.quarter_turns())
    }

    /// The rotation that undoes `self`.
    #[must_use]
    pub const fn inverse(self) -> Self {
        Self::from_quarter_turns(4 - self.quarter_turns())
    }

    /// True for the rotations that swap the addressed width and height.
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Pixel dimensions of a display and whether its addressing may be transposed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayGeometry {
    pub width: u16,
    pub height: u16,
    /// The panel can be driven with width and height swapped. Square panels always can.
    pub transposable: bool,
}

impl DisplayGeometry {
    /// A square `side`×`side` panel.
    #[must_use]
    pub const fn square(side: u16) -> Self {
        Self {
            width: side,
            height: side,
            transposable: true,
        }
    }

    /// A `width`×`height` panel that can only be driven in its native addressing.
    #[must_use]
    pub const fn fixed(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            transposable: false,
        }
    }

    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[must_use]
    pub const fn supports(&self, rotation: Rotation) -> bool {
        !rotation.swaps_axes() || self.width == self.height || self.transposable
    }
}

/// Physical index of canonical pixel `index` on a `width`×`height` panel under `rotation`.
///
/// The caller guarantees `index < width * height`.
#[must_use]
pub const fn destination(width: usize, height: usize, rotation: Rotation, index: usize) -> usize {
    let row = index / width;
    let col = index % width;
    match rotation {
        Rotation::Deg0 => index,
        // Addressed as a height-wide, width-tall grid.
        Rotation::Deg90 => col * height + (height - 1 - row),
        Rotation::Deg180 => (height - 1 - row) * width + (width - 1 - col),
        Rotation::Deg270 => (width - 1 - col) * height + row,
    }
}

/// Fill `lut` with the permutation for `geometry` under `rotation`.
///
/// # Errors
///
/// [`Error::RotationUnsupported`] if the geometry cannot take a 90°/270° rotation and
/// [`Error::GeometryMismatch`] if `lut` is not exactly `width * height` long.
pub fn build_lut(geometry: DisplayGeometry, rotation: Rotation, lut: &mut [u16]) -> Result<()> {
    if !geometry.supports(rotation) {
        return Err(Error::RotationUnsupported);
    }
    let count = geometry.pixel_count();
    if count == 0 || lut.len() != count || count > usize::from(u16::MAX) + 1 {
        return Err(Error::GeometryMismatch(geometry.width, geometry.height));
    }
    let (width, height) = (usize::from(geometry.width), usize::from(geometry.height));
    for (index, slot) in lut.iter_mut().enumerate() {
        #[allow(clippy::cast_possible_truncation, reason = "count was checked against u16 range")]
        let physical = destination(width, height, rotation, index) as u16;
        *slot = physical;
    }
    Ok(())
}

/// A fixed-size orientation table for an `N`-pixel display.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OrientationLut<const N: usize> {
    rotation: Rotation,
    map: [u16; N],
}

impl<const N: usize> OrientationLut<N> {
    /// Identity table. Always valid.
    #[must_use]
    pub const fn identity() -> Self {
        let mut map = [0u16; N];
        let mut i = 0;
        while i < N {
            #[allow(clippy::cast_possible_truncation, reason = "N fits the u16 index space")]
            let index = i as u16;
            map[i] = index;
            i += 1;
        }
        Self {
            rotation: Rotation::Deg0,
            map,
        }
    }

    /// Build the table for `geometry` under `rotation`.
    ///
    /// # Errors
    ///
    /// See [`build_lut`].
    pub fn try_new(geometry: DisplayGeometry, rotation: Rotation) -> Result<Self> {
        let mut map = [0u16; N];
        build_lut(geometry, rotation, &mut map)?;
        Ok(Self { rotation, map })
    }

    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    #[must_use]
    pub const fn as_slice(&self) -> &[u16; N] {
        &self.map
    }

    /// Physical index of canonical pixel `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<usize> {
        self.map.get(index).map(|&physical| usize::from(physical))
    }

    /// The table mapping physical indexes back to canonical ones.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut map = [0u16; N];
        for (canonical, &physical) in self.map.iter().enumerate() {
            if let Some(slot) = map.get_mut(usize::from(physical)) {
                #[allow(clippy::cast_possible_truncation, reason = "N fits the u16 index space")]
                let index = canonical as u16;
                *slot = index;
            }
        }
        Self {
            rotation: self.rotation.inverse(),
            map,
        }
    }

    /// Rotate a canonical bitmap: `rotated[lut[i]] = canonical[i]`.
    #[must_use]
    pub fn rotate<T: Copy + Default>(&self, canonical: &[T; N]) -> [T; N] {
        let mut rotated = [T::default(); N];
        for (&value, &physical) in canonical.iter().zip(self.map.iter()) {
            if let Some(slot) = rotated.get_mut(usize::from(physical)) {
                *slot = value;
            }
        }
        rotated
    }
}

/// Rotate a canonical bitmap through `lut`. Convenience for [`OrientationLut::rotate`].
#[must_use]
pub fn rotate_glyph<T: Copy + Default, const N: usize>(
    canonical: &[T; N],
    lut: &OrientationLut<N>,
) -> [T; N] {
    lut.rotate(canonical)
}

/// The four tables for one display geometry.
///
/// Tables for rotations the geometry cannot take are absent and asking for them
/// returns [`Error::RotationUnsupported`].
#[derive(Clone, Debug)]
pub struct LutSet<const N: usize> {
    geometry: DisplayGeometry,
    luts: [Option<OrientationLut<N>>; 4],
}

impl<const N: usize> LutSet<N> {
    /// Precompute every table `geometry` supports.
    ///
    /// # Errors
    ///
    /// [`Error::GeometryMismatch`] if `geometry` does not have `N` pixels.
    pub fn new(geometry: DisplayGeometry) -> Result<Self> {
        if geometry.pixel_count() != N {
            return Err(Error::GeometryMismatch(geometry.width, geometry.height));
        }
        let mut luts = [None; 4];
        for (slot, rotation) in luts.iter_mut().zip(Rotation::ALL) {
            *slot = match OrientationLut::try_new(geometry, rotation) {
                Ok(lut) => Some(lut),
                Err(Error::RotationUnsupported) => None,
                Err(err) => return Err(err),
            };
        }
        Ok(Self { geometry, luts })
    }

    #[must_use]
    pub const fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    /// The table for `rotation`.
    ///
    /// # Errors
    ///
    /// [`Error::RotationUnsupported`] if the geometry cannot take `rotation`.
    pub fn get(&self, rotation: Rotation) -> Result<&OrientationLut<N>> {
        self.luts
            .get(usize::from(rotation.quarter_turns()))
            .and_then(Option::as_ref)
            .ok_or(Error::RotationUnsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turn_on_3x2_swaps_addressing() {
        let geometry = DisplayGeometry {
            width: 3,
            height: 2,
            transposable: true,
        };
        let lut = OrientationLut::<6>::try_new(geometry, Rotation::Deg90).unwrap();
        // Canonical (0,0) goes to row 0, col 1 of the 2-wide result.
        assert_eq!(lut.as_slice(), &[1, 3, 5, 0, 2, 4]);
    }

    #[test]
    fn fixed_rectangle_rejects_quarter_turns() {
        let geometry = DisplayGeometry::fixed(4, 2);
        assert_eq!(
            OrientationLut::<8>::try_new(geometry, Rotation::Deg270),
            Err(Error::RotationUnsupported)
        );
        assert!(OrientationLut::<8>::try_new(geometry, Rotation::Deg180).is_ok());

        let set = LutSet::<8>::new(geometry).unwrap();
        assert!(set.get(Rotation::Deg0).is_ok());
        assert_eq!(set.get(Rotation::Deg90).err(), Some(Error::RotationUnsupported));
    }

    #[test]
    fn wrong_buffer_length_is_a_geometry_mismatch() {
        let mut lut = [0u16; 24];
        assert_eq!(
            build_lut(DisplayGeometry::square(5), Rotation::Deg0, &mut lut),
            Err(Error::GeometryMismatch(5, 5))
        );
    }

    #[test]
    fn rotation_arithmetic() {
        assert_eq!(Rotation::Deg90.then(Rotation::Deg270), Rotation::Deg0);
        assert_eq!(Rotation::Deg270.then(Rotation::Deg270), Rotation::Deg180);
        assert_eq!(Rotation::Deg90.inverse(), Rotation::Deg270);
        assert_eq!(Rotation::Deg0.inverse(), Rotation::Deg0);
    }
}
