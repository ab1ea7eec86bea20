use core::net::Ipv4Addr;

use embassy_time::Duration;

/// Firmware version written to `firmwareVersionAtLastBoot`.
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

// Persistent namespaces and the schema each one is expected to carry
pub const OPERATING_NAMESPACE: &str = "STCPrefs";
pub const PERIPHERAL_NAMESPACE: &str = "PModePrefs";
pub const OPERATING_SCHEMA_VERSION: u16 = 4;
pub const PERIPHERAL_SCHEMA_VERSION: u16 = 2;

/// How long the mode button must stay down at boot to confirm a factory reset.
pub const RECONFIRM_HOLD: Duration = Duration::from_millis(2000);
/// Pause between flushing the acknowledgement page and taking the AP down.
pub const PORTAL_TEARDOWN_PAUSE: Duration = Duration::from_millis(500);

// Provisioning access point
pub const DEVICE_ID_PREFIX: &str = "STAC";
pub const AP_PASSPHRASE: &str = "1234567890";
pub const AP_CHANNEL: u8 = 1;
pub const AP_MAX_CONNECTIONS: u8 = 1;
pub const AP_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 6, 14);
pub const AP_GATEWAY: Ipv4Addr = Ipv4Addr::new(192, 168, 6, 14);
pub const AP_PREFIX_LEN: u8 = 24;
pub const PORTAL_PORT: u16 = 80;

// Accelerometer thresholds in milli-g
pub const FLAT_THRESHOLD_MG: i32 = 900;
pub const TILT_THRESHOLD_MG: i32 = 500;

// Smart Tally polling
pub const MAX_POLL_ERRORS: u8 = 8;
