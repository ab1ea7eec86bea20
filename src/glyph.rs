//! Canonical glyph bitmaps and the orientation-dependent rendered registry.
//!
//! Each glyph is a row-major bitmap of `0`/`1` pixels in the panel's unrotated
//! reference orientation. The canonical registries are immutable. A
//! [`RenderedGlyphs`] holds every glyph permuted for the current physical
//! orientation and is always rebuilt as a whole.
//!
//! Digits `0`-`9` sit at indexes `0`-`9` of every registry so numbers can be drawn
//! by position.

use crate::orientation::Orientation;
use crate::rotation::{DisplayGeometry, LutSet};
use crate::Result;

/// A `{0,1}` bitmap of `N` pixels, row-major.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Glyph<const N: usize>([u8; N]);

impl<const N: usize> Glyph<N> {
    pub const BLANK: Self = Self([0; N]);

    /// Build from `rows`, one byte per row, most significant of the low `width` bits
    /// on the left.
    ///
    /// Panics at compile time when `width * rows.len() != N`.
    #[must_use]
    pub const fn from_rows(width: usize, rows: &[u8]) -> Self {
        assert!(width * rows.len() == N, "rows do not cover the glyph");
        let mut pixels = [0u8; N];
        let mut row = 0;
        while row < rows.len() {
            let mut col = 0;
            while col < width {
                pixels[row * width + col] = (rows[row] >> (width - 1 - col)) & 1;
                col += 1;
            }
            row += 1;
        }
        Self(pixels)
    }

    #[must_use]
    pub const fn pixels(&self) -> &[u8; N] {
        &self.0
    }

    /// True when pixel `index` is foreground. Out-of-range indexes are background.
    #[must_use]
    pub fn is_lit(&self, index: usize) -> bool {
        self.0.get(index).is_some_and(|&pixel| pixel != 0)
    }
}

/// Every glyph, in registry order.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GlyphId {
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    LetterX,
    Wifi,
    SmartTally,
    LetterC,
    LetterT,
    RightArrow,
    LeftArrow,
    HappyFace,
    BigX,
    Frame,
    DottedFrame,
    QuestionMark,
    Checkerboard,
    Checkmark,
    EnSpace,
    EmSpace,
    Dot,
    ConfigRequired,
    LetterA,
    LetterS,
    LetterP,
    FirmwareUpdate,
    PowerOn,
    Corners,
}

/// Number of glyphs in every registry.
pub const GLYPH_COUNT: usize = 34;

const _: () = assert!(GlyphId::Corners as usize + 1 == GLYPH_COUNT);

impl GlyphId {
    const DIGITS: [Self; 10] = [
        Self::Digit0,
        Self::Digit1,
        Self::Digit2,
        Self::Digit3,
        Self::Digit4,
        Self::Digit5,
        Self::Digit6,
        Self::Digit7,
        Self::Digit8,
        Self::Digit9,
    ];

    /// Glyph for decimal digit `digit`, if it is a single digit.
    #[must_use]
    pub fn digit(digit: u8) -> Option<Self> {
        Self::DIGITS.get(usize::from(digit)).copied()
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// 5×5 glyphs (M5Stack ATOM Matrix).
pub static GLYPHS_5X5: [Glyph<25>; GLYPH_COUNT] = [
    Glyph::from_rows(5, &[0b00100, 0b01010, 0b01010, 0b01010, 0b00100]),
    Glyph::from_rows(5, &[0b00100, 0b01100, 0b00100, 0b00100, 0b01110]),
    Glyph::from_rows(5, &[0b01100, 0b00010, 0b00100, 0b01000, 0b01110]),
    Glyph::from_rows(5, &[0b01100, 0b00010, 0b00100, 0b00010, 0b01100]),
    Glyph::from_rows(5, &[0b01010, 0b01010, 0b00110, 0b00010, 0b00010]),
    Glyph::from_rows(5, &[0b01110, 0b01000, 0b00110, 0b00010, 0b01110]),
    Glyph::from_rows(5, &[0b00110, 0b01000, 0b01110, 0b01010, 0b01110]),
    Glyph::from_rows(5, &[0b01110, 0b00010, 0b00100, 0b01000, 0b01000]),
    Glyph::from_rows(5, &[0b01110, 0b01010, 0b01110, 0b01010, 0b01110]),
    Glyph::from_rows(5, &[0b01110, 0b01010, 0b01110, 0b00010, 0b01100]),
    Glyph::from_rows(5, &[0b01010, 0b01010, 0b00100, 0b01010, 0b01010]),
    Glyph::from_rows(5, &[0b00100, 0b01010, 0b10001, 0b00100, 0b01010]),
    Glyph::from_rows(5, &[0b11001, 0b11011, 0b11111, 0b11011, 0b11001]),
    Glyph::from_rows(5, &[0b00110, 0b01000, 0b01000, 0b01000, 0b00110]),
    Glyph::from_rows(5, &[0b01110, 0b00100, 0b00100, 0b00100, 0b00100]),
    Glyph::from_rows(5, &[0b00100, 0b00010, 0b11111, 0b00010, 0b00100]),
    Glyph::from_rows(5, &[0b00100, 0b01000, 0b11111, 0b01000, 0b00100]),
    Glyph::from_rows(5, &[0b01010, 0b00000, 0b10001, 0b10001, 0b01110]),
    Glyph::from_rows(5, &[0b10001, 0b01010, 0b00100, 0b01010, 0b10001]),
    Glyph::from_rows(5, &[0b11111, 0b10001, 0b10001, 0b10001, 0b11111]),
    Glyph::from_rows(5, &[0b10101, 0b00000, 0b10001, 0b00000, 0b10101]),
    Glyph::from_rows(5, &[0b01100, 0b00010, 0b00100, 0b00000, 0b00100]),
    Glyph::from_rows(5, &[0b10101, 0b01010, 0b10101, 0b01010, 0b10101]),
    Glyph::from_rows(5, &[0b00001, 0b00010, 0b10100, 0b01000, 0b00000]),
    Glyph::from_rows(5, &[0b01110, 0b01110, 0b01110, 0b01110, 0b01110]),
    Glyph::from_rows(5, &[0b11111, 0b11111, 0b11111, 0b11111, 0b11111]),
    Glyph::from_rows(5, &[0b00000, 0b01110, 0b01110, 0b01110, 0b00110]),
    Glyph::from_rows(5, &[0b00111, 0b00001, 0b10101, 0b10000, 0b11100]),
    Glyph::from_rows(5, &[0b00100, 0b01010, 0b01110, 0b01010, 0b01010]),
    Glyph::from_rows(5, &[0b00110, 0b01000, 0b00100, 0b00010, 0b01100]),
    Glyph::from_rows(5, &[0b01100, 0b01010, 0b01100, 0b01000, 0b01000]),
    Glyph::from_rows(5, &[0b10001, 0b01010, 0b00100, 0b01110, 0b01110]),
    Glyph::from_rows(5, &[0b00000, 0b00000, 0b00100, 0b00000, 0b00000]),
    Glyph::from_rows(5, &[0b10001, 0b00000, 0b00000, 0b00000, 0b10001]),
];

/// 8×8 glyphs (M5Stack AtomS3 and similar).
pub static GLYPHS_8X8: [Glyph<64>; GLYPH_COUNT] = [
    Glyph::from_rows(8, &[0x1c, 0x36, 0x67, 0x63, 0x73, 0x36, 0x1c, 0x00]),
    Glyph::from_rows(8, &[0x18, 0x38, 0x18, 0x18, 0x18, 0x18, 0x18, 0x00]),
    Glyph::from_rows(8, &[0x7c, 0x66, 0x06, 0x1c, 0x30, 0x60, 0x7e, 0x00]),
    Glyph::from_rows(8, &[0x7e, 0x66, 0x06, 0x1c, 0x06, 0x06, 0x7c, 0x00]),
    Glyph::from_rows(8, &[0x1e, 0x36, 0x36, 0x66, 0x7e, 0x06, 0x06, 0x00]),
    Glyph::from_rows(8, &[0x7e, 0x66, 0x60, 0x7c, 0x06, 0x06, 0x7c, 0x00]),
    Glyph::from_rows(8, &[0x1c, 0x30, 0x60, 0x7c, 0x66, 0x66, 0x3c, 0x00]),
    Glyph::from_rows(8, &[0x7e, 0x66, 0x06, 0x0c, 0x0c, 0x18, 0x18, 0x00]),
    Glyph::from_rows(8, &[0x3c, 0x66, 0x66, 0x3c, 0x66, 0x66, 0x3c, 0x00]),
    Glyph::from_rows(8, &[0x3c, 0x66, 0x66, 0x3e, 0x06, 0x0c, 0x38, 0x00]),
    // The 8×8 set draws X with the big X.
    Glyph::from_rows(8, &[0xc3, 0xe7, 0x66, 0x18, 0x18, 0x66, 0xe7, 0xc3]),
    Glyph::from_rows(8, &[0x18, 0x3c, 0x66, 0xc3, 0x18, 0x3c, 0x66, 0x00]),
    Glyph::from_rows(8, &[0xc3, 0xc3, 0xe7, 0xff, 0xff, 0xe7, 0xc3, 0xc3]),
    Glyph::from_rows(8, &[0x1e, 0x36, 0x60, 0x60, 0x60, 0x30, 0x1e, 0x00]),
    Glyph::from_rows(8, &[0x7e, 0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x00]),
    Glyph::from_rows(8, &[0x08, 0x0c, 0xfe, 0xff, 0xfe, 0x0c, 0x08, 0x00]),
    Glyph::from_rows(8, &[0x10, 0x30, 0x7f, 0xff, 0x7f, 0x30, 0x10, 0x00]),
    Glyph::from_rows(8, &[0x3c, 0x7e, 0xdb, 0xff, 0xff, 0xdb, 0x66, 0x3c]),
    Glyph::from_rows(8, &[0xc3, 0xe7, 0x66, 0x18, 0x18, 0x66, 0xe7, 0xc3]),
    Glyph::from_rows(8, &[0xff, 0xff, 0xc3, 0xc3, 0xc3, 0xc3, 0xff, 0xff]),
    Glyph::from_rows(8, &[0xdb, 0xdb, 0x00, 0xc3, 0xc3, 0x00, 0xdb, 0xdb]),
    Glyph::from_rows(8, &[0x7c, 0x66, 0x06, 0x1c, 0x00, 0x18, 0x18, 0x00]),
    Glyph::from_rows(8, &[0xaa, 0x55, 0xaa, 0x55, 0xaa, 0x55, 0xaa, 0x55]),
    Glyph::from_rows(8, &[0x00, 0x01, 0x03, 0x46, 0x6c, 0x38, 0x10, 0x00]),
    Glyph::from_rows(8, &[0x3c, 0x3c, 0x3c, 0x3c, 0x3c, 0x3c, 0x3c, 0x3c]),
    Glyph::from_rows(8, &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
    Glyph::from_rows(8, &[0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x06, 0x00]),
    Glyph::from_rows(8, &[0x1f, 0x07, 0x0f, 0x9d, 0xb9, 0xf0, 0xe0, 0xf8]),
    Glyph::from_rows(8, &[0x1e, 0x36, 0x36, 0x66, 0x7e, 0x66, 0x66, 0x00]),
    Glyph::from_rows(8, &[0x3e, 0x66, 0x60, 0x3c, 0x06, 0x06, 0x7c, 0x00]),
    Glyph::from_rows(8, &[0x7c, 0x66, 0x66, 0x7c, 0x60, 0x60, 0x60, 0x00]),
    Glyph::from_rows(8, &[0x01, 0x0a, 0x0c, 0x0e, 0xf0, 0x90, 0x90, 0xf0]),
    Glyph::from_rows(8, &[0x00, 0x00, 0x00, 0x18, 0x18, 0x00, 0x00, 0x00]),
    Glyph::from_rows(8, &[0x81, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x81]),
];

/// The canonical registry permuted for one physical orientation.
#[derive(Clone, Debug)]
pub struct RenderedGlyphs<const N: usize> {
    canonical: &'static [Glyph<N>; GLYPH_COUNT],
    luts: LutSet<N>,
    orientation: Orientation,
    rendered: [Glyph<N>; GLYPH_COUNT],
}

impl<const N: usize> RenderedGlyphs<N> {
    /// Render `canonical` for `orientation` on a panel of `geometry`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::GeometryMismatch`] if `geometry` does not have `N` pixels and
    /// [`crate::Error::RotationUnsupported`] if the panel cannot take the
    /// orientation's rotation.
    pub fn new(
        canonical: &'static [Glyph<N>; GLYPH_COUNT],
        geometry: DisplayGeometry,
        orientation: Orientation,
    ) -> Result<Self> {
        let luts = LutSet::new(geometry)?;
        let rendered = render_all(canonical, &luts, orientation)?;
        Ok(Self {
            canonical,
            luts,
            orientation,
            rendered,
        })
    }

    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Re-render every glyph for `orientation`. Returns whether anything changed.
    ///
    /// On error the previous rendering stays in place untouched.
    ///
    /// # Errors
    ///
    /// [`crate::Error::RotationUnsupported`] if the panel cannot take the rotation.
    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<bool> {
        if orientation == self.orientation {
            return Ok(false);
        }
        self.rendered = render_all(self.canonical, &self.luts, orientation)?;
        self.orientation = orientation;
        Ok(true)
    }

    #[must_use]
    #[allow(clippy::indexing_slicing, reason = "every GlyphId is below GLYPH_COUNT")]
    pub fn get(&self, id: GlyphId) -> &Glyph<N> {
        &self.rendered[id.index()]
    }

    /// Rendered glyph for decimal digit `digit`, `None` above 9.
    #[must_use]
    pub fn digit(&self, digit: u8) -> Option<&Glyph<N>> {
        GlyphId::digit(digit).map(|id| self.get(id))
    }

    #[must_use]
    pub const fn as_slice(&self) -> &[Glyph<N>; GLYPH_COUNT] {
        &self.rendered
    }
}

fn render_all<const N: usize>(
    canonical: &[Glyph<N>; GLYPH_COUNT],
    luts: &LutSet<N>,
    orientation: Orientation,
) -> Result<[Glyph<N>; GLYPH_COUNT]> {
    let lut = luts.get(orientation.rotation())?;
    let mut rendered = [Glyph::BLANK; GLYPH_COUNT];
    for (out, glyph) in rendered.iter_mut().zip(canonical.iter()) {
        *out = Glyph(lut.rotate(&glyph.0));
    }
    Ok(rendered)
}
