//! Credential capture over a temporary access point.
//!
//! The device hosts an open-to-one-client WiFi network, serves a single HTML form on
//! port 80, and waits for the operator to post it back. Requests are read with a
//! best-effort drain (one blocking read, then whatever is already buffered) and
//! classified by plain substring search:
//!
//! | request contains | response |
//! |---|---|
//! | `GET / HTTP/` | `200` configuration form, keep listening |
//! | `POST /` | `200` acknowledgement and done, or `400` and keep listening if the form is malformed |
//! | anything else | `404`, keep listening |
//!
//! The radio and TCP stack are injected through [`AccessPoint`] and
//! [`PortalTransport`]. An `embassy-net` transport is available behind the
//! `embassy-net` feature.

use core::fmt::Write as _;
use core::net::Ipv4Addr;

use embedded_hal_async::delay::DelayNs;
use embedded_io_async::{Read, ReadReady, Write};
use heapless::String;

use crate::{
    Error, Result, AP_ADDRESS, AP_CHANNEL, AP_GATEWAY, AP_MAX_CONNECTIONS, AP_PASSPHRASE,
    AP_PREFIX_LEN, DEVICE_ID_PREFIX, FIRMWARE_VERSION, PORTAL_PORT, PORTAL_TEARDOWN_PAUSE,
};

#[cfg(feature = "embassy-net")]
pub mod embassy_net;
pub mod form;
pub mod pages;

pub use form::ProvisioningRecord;

/// Bytes of a single request kept for classification.
pub const REQUEST_CAPACITY: usize = 2048;

/// Settings for the provisioning access point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApConfig {
    pub ssid: String<32>,
    pub passphrase: &'static str,
    pub channel: u8,
    pub hidden: bool,
    pub max_connections: u8,
    pub address: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub prefix_len: u8,
    pub port: u16,
}

impl ApConfig {
    /// Standard AP for a unit with station MAC `mac`, named `STAC-XXYYZZ` from the
    /// last three MAC octets in reverse order.
    ///
    /// # Errors
    ///
    /// [`Error::FormatError`] if the name does not fit an SSID.
    pub fn for_device(mac: [u8; 6]) -> Result<Self> {
        let mut ssid = String::new();
        write!(
            ssid,
            "{}-{:02X}{:02X}{:02X}",
            DEVICE_ID_PREFIX, mac[5], mac[4], mac[3]
        )?;
        Ok(Self {
            ssid,
            passphrase: AP_PASSPHRASE,
            channel: AP_CHANNEL,
            hidden: false,
            max_connections: AP_MAX_CONNECTIONS,
            address: AP_ADDRESS,
            gateway: AP_GATEWAY,
            prefix_len: AP_PREFIX_LEN,
            port: PORTAL_PORT,
        })
    }

    /// Network mask for [`ApConfig::prefix_len`].
    #[must_use]
    pub fn netmask(&self) -> Ipv4Addr {
        let bits = u32::MAX
            .checked_shl(32 - u32::from(self.prefix_len.min(32)))
            .unwrap_or(0);
        Ipv4Addr::from(bits)
    }
}

/// The radio, switched into access-point mode for the duration of a capture.
#[allow(async_fn_in_trait, reason = "implementations are used from a single executor")]
pub trait AccessPoint {
    type Error;

    /// Bring the access point up with `config`.
    async fn start(&mut self, config: &ApConfig) -> core::result::Result<(), Self::Error>;

    /// Take the access point down.
    async fn stop(&mut self) -> core::result::Result<(), Self::Error>;
}

/// Accepts TCP connections on the access point.
#[allow(async_fn_in_trait, reason = "implementations are used from a single executor")]
pub trait PortalTransport {
    type Error;
    type Connection<'a>: Read + Write + ReadReady
    where
        Self: 'a;

    /// Wait for the next client on `port`.
    async fn accept(
        &mut self,
        port: u16,
    ) -> core::result::Result<Self::Connection<'_>, Self::Error>;
}

/// What the portal answered a request with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestKind {
    Form,
    Submission,
    NotFound,
}

impl RequestKind {
    /// Classify a raw request.
    #[must_use]
    pub fn classify(request: &str) -> Self {
        if request.contains("GET / HTTP/") {
            Self::Form
        } else if request.contains("POST /") {
            Self::Submission
        } else {
            Self::NotFound
        }
    }
}

/// Run the access point and HTTP exchange until a well-formed form arrives.
///
/// There is no timeout. Accept failures and bad requests are logged and the portal
/// keeps listening. The access point is stopped before returning the record.
///
/// # Errors
///
/// [`Error::AccessPoint`] if the radio cannot start or stop the access point, and
/// [`Error::FormatError`] if the form page cannot be rendered.
pub async fn capture_credentials<A, T, D>(
    access_point: &mut A,
    transport: &mut T,
    delay: &mut D,
    config: &ApConfig,
) -> Result<ProvisioningRecord>
where
    A: AccessPoint,
    T: PortalTransport,
    D: DelayNs,
{
    access_point.start(config).await.map_err(|_| {
        error!("Access point {} failed to start", config.ssid.as_str());
        Error::AccessPoint
    })?;
    info!(
        "Provisioning portal up: {} on port {}",
        config.ssid.as_str(),
        config.port
    );

    let form_page = pages::form_page(FIRMWARE_VERSION)?;
    let mut request = [0u8; REQUEST_CAPACITY];

    let record = loop {
        let Ok(mut connection) = transport.accept(config.port).await else {
            warn!("Portal accept failed");
            delay.delay_ms(500).await;
            continue;
        };

        let text = match drain(&mut connection, &mut request).await {
            Ok(len) => request
                .get(..len)
                .and_then(|bytes| core::str::from_utf8(bytes).ok())
                .unwrap_or(""),
            Err(DrainError::Overflow) => {
                warn!("Request larger than {} bytes", REQUEST_CAPACITY);
                respond(&mut connection, pages::BAD_REQUEST_PAGE).await;
                continue;
            }
            Err(DrainError::Io) => {
                warn!("Portal read failed");
                continue;
            }
        };

        let kind = RequestKind::classify(text);
        debug!("Portal request: {:?} ({} bytes)", kind, text.len());
        match kind {
            RequestKind::Form => respond(&mut connection, form_page.as_str()).await,
            RequestKind::NotFound => respond(&mut connection, pages::NOT_FOUND_PAGE).await,
            RequestKind::Submission => match ProvisioningRecord::from_request(text) {
                Ok(record) => {
                    respond(&mut connection, pages::ACK_PAGE).await;
                    info!("Configuration received for network {}", record.ssid.as_str());
                    break record;
                }
                Err(err) => {
                    warn!("Rejected configuration form: {}", err);
                    respond(&mut connection, pages::BAD_REQUEST_PAGE).await;
                }
            },
        }
    };

    delay.delay_ms(duration_ms(PORTAL_TEARDOWN_PAUSE)).await;
    access_point.stop().await.map_err(|_| {
        error!("Access point failed to stop");
        Error::AccessPoint
    })?;
    info!("Provisioning portal down");
    Ok(record)
}

enum DrainError {
    Overflow,
    Io,
}

/// One blocking read, then keep reading while the connection already has data.
///
/// This does not wait for a complete request. A sender that pauses mid-request is
/// classified on what has arrived so far.
async fn drain<C: Read + ReadReady>(
    connection: &mut C,
    buffer: &mut [u8; REQUEST_CAPACITY],
) -> core::result::Result<usize, DrainError> {
    let mut len = 0;
    loop {
        let free = buffer.get_mut(len..).ok_or(DrainError::Overflow)?;
        if free.is_empty() {
            return Err(DrainError::Overflow);
        }
        let read = connection.read(free).await.map_err(|_| DrainError::Io)?;
        if read == 0 {
            return Ok(len);
        }
        len = len.saturating_add(read);
        if !connection.read_ready().map_err(|_| DrainError::Io)? {
            return Ok(len);
        }
    }
}

async fn respond<C: Write>(connection: &mut C, response: &str) {
    if connection.write_all(response.as_bytes()).await.is_err() {
        warn!("Portal write failed");
        return;
    }
    if connection.flush().await.is_err() {
        warn!("Portal flush failed");
    }
}

#[allow(clippy::cast_possible_truncation, reason = "portal pauses are well under u32 ms")]
const fn duration_ms(duration: embassy_time::Duration) -> u32 {
    duration.as_millis() as u32
}
