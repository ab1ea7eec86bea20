mod common;

use common::{FakeButtonPin, RecordingDelay};
use embassy_futures::block_on;
use stac::RECONFIRM_HOLD;
use stac::button::{ModeButton, PressDuration};

#[test]
fn is_pressed_follows_the_active_level() {
    assert!(ModeButton::new(FakeButtonPin::held(), true).is_pressed());
    assert!(!ModeButton::new(FakeButtonPin::up(), true).is_pressed());
    // The same idle line reads as pressed on an active-high button.
    assert!(ModeButton::new(FakeButtonPin::up(), false).is_pressed());
}

#[test]
fn release_before_the_hold_is_short() {
    let mut button = ModeButton::new(FakeButtonPin::tapped(), true);
    let mut delay = RecordingDelay::default();
    let press = block_on(button.hold_or_release(RECONFIRM_HOLD, &mut delay));
    assert_eq!(press, PressDuration::Short);
    assert!(!button.is_pressed());
}

#[test]
fn holding_through_the_delay_is_long() {
    let mut button = ModeButton::new(FakeButtonPin::held(), true);
    let mut delay = RecordingDelay::default();
    let press = block_on(button.hold_or_release(RECONFIRM_HOLD, &mut delay));
    assert_eq!(press, PressDuration::Long);
    assert_eq!(delay.requested_ms, vec![2000]);
    assert!(button.is_pressed());
}
