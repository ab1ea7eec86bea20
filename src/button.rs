//! The mode button, read once at boot to decide between normal start-up and reconfiguration.

use embassy_futures::select::{Either, select};
use embassy_time::Duration;
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;

/// A push button on one GPIO.
pub struct ModeButton<P> {
    pin: P,
    active_low: bool,
}

impl<P: InputPin + Wait> ModeButton<P> {
    /// `active_low` is true when a press pulls the pin to ground.
    #[must_use]
    pub const fn new(pin: P, active_low: bool) -> Self {
        Self { pin, active_low }
    }

    /// Sample the button. A pin read error counts as not pressed.
    pub fn is_pressed(&mut self) -> bool {
        let level = if self.active_low {
            self.pin.is_low()
        } else {
            self.pin.is_high()
        };
        level.unwrap_or_else(|_| {
            warn!("Mode button read failed");
            false
        })
    }

    /// Wait until the button is up.
    pub async fn wait_for_release(&mut self) {
        let waited = if self.active_low {
            self.pin.wait_for_high().await
        } else {
            self.pin.wait_for_low().await
        };
        if waited.is_err() {
            warn!("Mode button wait failed");
        }
    }

    /// With the button already down, race its release against `hold`.
    ///
    /// Returns [`PressDuration::Long`] if the button is still down when `hold` elapses.
    pub async fn hold_or_release<D: DelayNs>(
        &mut self,
        hold: Duration,
        delay: &mut D,
    ) -> PressDuration {
        let hold_ms = duration_ms(hold);
        let press_duration = match select(self.wait_for_release(), delay.delay_ms(hold_ms)).await {
            Either::First(()) => PressDuration::Short,
            Either::Second(()) => PressDuration::Long,
        };
        info!("Press duration: {:?}", press_duration);
        press_duration
    }
}

// A short or long press rather than a bare `bool`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressDuration {
    #[default]
    Short,
    Long,
}

#[allow(clippy::cast_possible_truncation, reason = "button timings are well under u32 ms")]
const fn duration_ms(duration: Duration) -> u32 {
    duration.as_millis() as u32
}
