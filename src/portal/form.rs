//! Parsing of the submitted configuration form.

use core::net::Ipv4Addr;
use core::str::FromStr;

use heapless::{LinearMap, String, Vec};

use crate::FormError;

pub const FIELD_SSID: &str = "SSID";
pub const FIELD_PASSWORD: &str = "pwd";
pub const FIELD_TARGET_IP: &str = "stIP";
pub const FIELD_TARGET_PORT: &str = "stPort";
pub const FIELD_MAX_CHANNEL: &str = "stChan";
pub const FIELD_POLL_INTERVAL: &str = "pollTime";

/// Most `key=value` pairs kept from one submission.
const MAX_FIELDS: usize = 8;

pub const SSID_MAX_LEN: usize = 32;
pub const PASSWORD_MAX_LEN: usize = 64;

/// Configuration captured from one form submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvisioningRecord {
    pub ssid: String<SSID_MAX_LEN>,
    pub password: String<PASSWORD_MAX_LEN>,
    /// The target address as the operator typed it.
    pub target_address_text: String<15>,
    pub target_address: Ipv4Addr,
    pub target_port: u16,
    pub max_tally_channel: u8,
    pub poll_interval_ms: u32,
}

impl ProvisioningRecord {
    /// Parse the form fields out of a raw request.
    ///
    /// Only the last line of `request` is looked at, so any headers captured in front
    /// of the body are ignored.
    ///
    /// # Errors
    ///
    /// A [`FormError`] naming the first field that is missing or malformed.
    pub fn from_request(request: &str) -> Result<Self, FormError> {
        let body = last_line(request);
        if body.is_empty() {
            return Err(FormError::MissingBody);
        }
        let form = FormFields::parse(body);

        let ssid = url_decode::<SSID_MAX_LEN>(form.require(FIELD_SSID)?, FIELD_SSID)?;
        if ssid.is_empty() {
            return Err(FormError::MissingField(FIELD_SSID));
        }
        let password =
            url_decode::<PASSWORD_MAX_LEN>(form.require(FIELD_PASSWORD)?, FIELD_PASSWORD)?;

        let address_text = form.require(FIELD_TARGET_IP)?.trim();
        let target_address = Ipv4Addr::from_str(address_text)
            .map_err(|_| FormError::InvalidAddress(FIELD_TARGET_IP))?;
        let target_address_text =
            String::try_from(address_text).map_err(|()| FormError::TooLong(FIELD_TARGET_IP))?;

        let target_port = form.number::<u16>(FIELD_TARGET_PORT)?;
        let max_tally_channel = form.number::<u8>(FIELD_MAX_CHANNEL)?;
        if max_tally_channel == 0 {
            return Err(FormError::OutOfRange(FIELD_MAX_CHANNEL));
        }
        let poll_interval_ms = form.number::<u32>(FIELD_POLL_INTERVAL)?;

        Ok(Self {
            ssid,
            password,
            target_address_text,
            target_address,
            target_port,
            max_tally_channel,
            poll_interval_ms,
        })
    }
}

/// The last non-empty line of `text`, without its line ending or surrounding blanks.
#[must_use]
pub fn last_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or("")
}

/// Raw (still URL-encoded) values of an `&`-separated query string.
pub struct FormFields<'a> {
    fields: LinearMap<&'a str, &'a str, MAX_FIELDS>,
}

impl<'a> FormFields<'a> {
    /// Split `body` on `&` and each pair on its first `=`. A repeated key keeps its last
    /// value. Pairs beyond the capacity are dropped.
    #[must_use]
    pub fn parse(body: &'a str) -> Self {
        let mut fields = LinearMap::new();
        for pair in body.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if fields.insert(key, value).is_err() {
                warn!("Form has more than {} fields, ignoring {}", MAX_FIELDS, key);
            }
        }
        Self { fields }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.fields
            .iter()
            .find(|(stored, _)| **stored == key)
            .map(|(_, value)| *value)
    }

    fn require(&self, key: &'static str) -> Result<&'a str, FormError> {
        self.get(key).ok_or(FormError::MissingField(key))
    }

    fn number<T: FromStr>(&self, key: &'static str) -> Result<T, FormError> {
        self.require(key)?
            .trim()
            .parse()
            .map_err(|_| FormError::InvalidNumber(key))
    }
}

/// Decode a form-encoded value.
///
/// `%XX` with two hex digits becomes that byte and `+` becomes a space. Anything else,
/// including a `%` without two hex digits after it, is kept as is.
///
/// # Errors
///
/// [`FormError::TooLong`] if the result exceeds `N` bytes and
/// [`FormError::InvalidEncoding`] if the decoded bytes are not UTF-8. Both name `field`.
pub fn url_decode<const N: usize>(
    encoded: &str,
    field: &'static str,
) -> Result<String<N>, FormError> {
    let mut decoded = Vec::<u8, N>::new();
    let mut bytes = encoded.as_bytes();
    while let Some((&byte, rest)) = bytes.split_first() {
        let (out, rest) = match (byte, rest) {
            (b'%', [high, low, tail @ ..]) => match (hex_value(*high), hex_value(*low)) {
                (Some(high), Some(low)) => ((high << 4) | low, tail),
                _ => (byte, rest),
            },
            (b'+', _) => (b' ', rest),
            _ => (byte, rest),
        };
        decoded.push(out).map_err(|_| FormError::TooLong(field))?;
        bytes = rest;
    }
    String::from_utf8(decoded).map_err(|_| FormError::InvalidEncoding(field))
}

const fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_line_skips_headers_and_trailing_blank_lines() {
        let request = "POST / HTTP/1.1\r\nHost: 192.168.6.14\r\n\r\nSSID=a&pwd=b\r\n\r\n";
        assert_eq!(last_line(request), "SSID=a&pwd=b");
        assert_eq!(last_line(""), "");
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let form = FormFields::parse("a=1&b=2&a=3&flag");
        assert_eq!(form.get("a"), Some("3"));
        assert_eq!(form.get("flag"), Some(""));
        assert_eq!(form.get("missing"), None);
    }

    #[test]
    fn decode_keeps_non_hex_escape() {
        assert_eq!(url_decode::<16>("%zz%4", "t").unwrap().as_str(), "%zz%4");
        assert_eq!(url_decode::<16>("caf%C3%A9", "t").unwrap().as_str(), "café");
        assert_eq!(url_decode::<2>("abc", "t"), Err(FormError::TooLong("t")));
        assert_eq!(url_decode::<4>("%FF", "t"), Err(FormError::InvalidEncoding("t")));
    }
}
