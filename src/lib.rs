//! Provisioning and display core for the STAC tally light.
//!
//! The crate is `no_std` and hardware-agnostic: flash, radio, button, IMU and LED
//! drivers are injected through `embedded-hal`, `embedded-storage`,
//! `embedded-io-async` and `smart-leds` traits (or small traits defined here where no
//! ecosystem trait exists).
#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module below.
mod fmt;

pub mod button;
pub mod config;
pub mod display;
mod error;
pub mod glyph;
pub mod orientation;
pub mod portal;
pub mod provision;
pub mod rotation;
mod shared_constants;
pub mod store;
pub mod tally;

pub use error::{Error, FlashFault, FormError, Result};
pub use shared_constants::*;
