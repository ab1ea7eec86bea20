//! Smart Tally request and reply helpers for the operating-mode runtime.
//!
//! The switcher is polled with the short-form status request and answers with a
//! bare state word: `onair`, `selected` or `unselected`.

use core::fmt::Write as _;

use heapless::String;

use crate::display::Palette;
use crate::{Result, MAX_POLL_ERRORS};

/// Replies this long or longer are not a state word. One more than `unselected`
/// plus a line ending.
pub const MAX_REPLY_LEN: usize = 12;

/// Short-form status request for `channel`.
///
/// # Errors
///
/// [`crate::Error::FormatError`] never in practice; the buffer fits any `u8` channel.
pub fn status_request(channel: u8) -> Result<String<32>> {
    let mut request = String::new();
    write!(request, "GET /tally/{channel}/status\r\n\r\n")?;
    Ok(request)
}

/// What a status reply said.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TallyState {
    Program,
    Preview,
    Unselected,
    EmptyReply,
    InvalidReply,
    /// Sent by the debugging emulator when it stalls.
    NoneReply,
    Junk,
}

impl TallyState {
    /// Classify the raw bytes of one reply.
    #[must_use]
    pub fn from_reply(reply: &[u8]) -> Self {
        if reply.len() >= MAX_REPLY_LEN {
            return Self::InvalidReply;
        }
        let Ok(text) = core::str::from_utf8(reply) else {
            return Self::Junk;
        };
        match text.trim() {
            "" => Self::EmptyReply,
            "onair" => Self::Program,
            "selected" => Self::Preview,
            "unselected" => Self::Unselected,
            "None" => Self::NoneReply,
            _ => Self::Junk,
        }
    }

    /// True for the three real tally states.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Program | Self::Preview | Self::Unselected)
    }

    /// How a valid state is drawn. Talent mode shows unselected as a dark panel.
    #[must_use]
    pub const fn palette(self, camera_operator_mode: bool) -> Option<Palette> {
        match self {
            Self::Program => Some(Palette::Program),
            Self::Preview if camera_operator_mode => Some(Palette::Preview),
            Self::Unselected if camera_operator_mode => Some(Palette::Unselected),
            Self::Preview | Self::Unselected => Some(Palette::Unselected),
            _ => None,
        }
    }
}

/// Consecutive poll failures.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PollErrors(u8);

impl PollErrors {
    /// Count a failed poll. Returns `true` once the failure limit is reached.
    pub fn record_failure(&mut self) -> bool {
        self.0 = self.0.saturating_add(1);
        self.is_fault()
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    #[must_use]
    pub const fn is_fault(self) -> bool {
        self.0 >= MAX_POLL_ERRORS
    }

    #[must_use]
    pub const fn count(self) -> u8 {
        self.0
    }
}
