//! Drawing rendered glyphs on the LED panel.
//!
//! Glyphs are two-tone: each [`Palette`] role gives a background and a foreground
//! color. [`LedMatrix`] writes a frame to any `smart-leds` driver, scaled by one of
//! the operator brightness levels.

use smart_leds::{RGB8, SmartLedsWrite};

use crate::glyph::{Glyph, GlyphId, RenderedGlyphs};
use crate::provision::{Cue, Indicator};

/// RGB color re-exported from `smart_leds`.
pub type Rgb = RGB8;

const BLACK: Rgb = Rgb::new(0, 0, 0);
const RED: Rgb = Rgb::new(0xff, 0, 0);
const GREEN: Rgb = Rgb::new(0, 0xff, 0);
const ORANGE: Rgb = Rgb::new(0xff, 0x65, 0);
const PURPLE: Rgb = Rgb::new(0x80, 0, 0x80);

/// Panel brightness for each operator level. Level 0 is off.
pub const BRIGHTNESS_MAP: [u8; 7] = [0, 10, 20, 30, 40, 50, 60];
/// Highest operator brightness level.
#[allow(clippy::cast_possible_truncation, reason = "the map has seven entries")]
pub const MAX_BRIGHTNESS_LEVEL: u8 = (BRIGHTNESS_MAP.len() - 1) as u8;

/// Color roles for two-tone glyphs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Palette {
    /// Solid red: the channel is on air.
    Program,
    /// Solid green: the channel is in preview.
    Preview,
    Unselected,
    Good,
    Warning,
    Alert,
}

impl Palette {
    /// `(background, foreground)`.
    #[must_use]
    pub const fn colors(self) -> (Rgb, Rgb) {
        match self {
            Self::Program => (RED, RED),
            Self::Preview => (GREEN, GREEN),
            Self::Unselected => (BLACK, PURPLE),
            Self::Good => (BLACK, GREEN),
            Self::Warning => (BLACK, ORANGE),
            Self::Alert => (BLACK, RED),
        }
    }
}

/// A surface that can show one glyph at a time.
pub trait GlyphCanvas<const N: usize> {
    type Error;

    fn draw(&mut self, glyph: &Glyph<N>, palette: Palette) -> Result<(), Self::Error>;
}

/// An `N`-pixel addressable LED panel.
pub struct LedMatrix<W, const N: usize> {
    writer: W,
    brightness: u8,
}

impl<W, const N: usize> LedMatrix<W, N>
where
    W: SmartLedsWrite<Color = Rgb>,
{
    /// `level` is an operator brightness level, clamped to [`MAX_BRIGHTNESS_LEVEL`].
    #[must_use]
    pub fn new(writer: W, level: u8) -> Self {
        let mut matrix = Self {
            writer,
            brightness: 0,
        };
        matrix.set_brightness_level(level);
        matrix
    }

    pub fn set_brightness_level(&mut self, level: u8) {
        let level = level.min(MAX_BRIGHTNESS_LEVEL);
        self.brightness = BRIGHTNESS_MAP
            .get(usize::from(level))
            .copied()
            .unwrap_or(0);
    }

    /// Raw panel brightness, `0..=255`.
    #[must_use]
    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Turn every pixel off.
    ///
    /// # Errors
    ///
    /// The LED driver's write error.
    pub fn clear(&mut self) -> Result<(), W::Error> {
        self.writer.write(core::iter::repeat_n(BLACK, N))
    }
}

impl<W, const N: usize> GlyphCanvas<N> for LedMatrix<W, N>
where
    W: SmartLedsWrite<Color = Rgb>,
{
    type Error = W::Error;

    fn draw(&mut self, glyph: &Glyph<N>, palette: Palette) -> Result<(), W::Error> {
        let (background, foreground) = palette.colors();
        let background = scale(background, self.brightness);
        let foreground = scale(foreground, self.brightness);
        let frame = glyph
            .pixels()
            .iter()
            .map(|&pixel| if pixel == 0 { background } else { foreground });
        self.writer.write(frame)
    }
}

fn scale(color: Rgb, brightness: u8) -> Rgb {
    Rgb::new(
        scale_channel(color.r, brightness),
        scale_channel(color.g, brightness),
        scale_channel(color.b, brightness),
    )
}

#[inline]
#[allow(clippy::cast_possible_truncation, reason = "the quotient is at most 255")]
fn scale_channel(value: u8, brightness: u8) -> u8 {
    ((u16::from(value) * u16::from(brightness)) / 255) as u8
}

/// Shows provisioning cues as glyphs from the current rendered registry.
pub struct GlyphIndicator<'g, C, const N: usize> {
    canvas: C,
    glyphs: &'g RenderedGlyphs<N>,
}

impl<'g, C, const N: usize> GlyphIndicator<'g, C, N>
where
    C: GlyphCanvas<N>,
{
    #[must_use]
    pub const fn new(canvas: C, glyphs: &'g RenderedGlyphs<N>) -> Self {
        Self { canvas, glyphs }
    }

    /// Glyph and color shown for `cue`.
    #[must_use]
    pub const fn appearance(cue: Cue) -> (GlyphId, Palette) {
        match cue {
            Cue::ConfigurationRequired => (GlyphId::ConfigRequired, Palette::Alert),
            Cue::ReconfigurePending => (GlyphId::ConfigRequired, Palette::Warning),
            Cue::CredentialsReceived => (GlyphId::Checkmark, Palette::Good),
            Cue::FactoryReset => (GlyphId::BigX, Palette::Alert),
        }
    }

    pub fn into_canvas(self) -> C {
        self.canvas
    }
}

impl<C, const N: usize> Indicator for GlyphIndicator<'_, C, N>
where
    C: GlyphCanvas<N>,
{
    fn show(&mut self, cue: Cue) {
        let (id, palette) = Self::appearance(cue);
        if self.canvas.draw(self.glyphs.get(id), palette).is_err() {
            warn!("Could not draw {:?}", cue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_scales_each_channel() {
        assert_eq!(scale(ORANGE, 255), ORANGE);
        assert_eq!(scale(ORANGE, 60), Rgb::new(60, 23, 0));
        assert_eq!(scale(RED, 0), BLACK);
    }
}
