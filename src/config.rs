//! Typed views over the two persistent namespaces.
//!
//! The operating namespace (`STCPrefs`) holds network credentials, the Smart Tally
//! target and the operator's runtime choices. The peripheral namespace (`PModePrefs`)
//! holds the few settings used when the unit is driven over the peripheral-mode
//! cable. Each is versioned on its own and is never migrated: a schema mismatch
//! wipes the namespace and starts over from the defaults below.

use core::net::Ipv4Addr;

use embedded_storage::nor_flash::NorFlash;
use heapless::String;

use crate::portal::ProvisioningRecord;
use crate::store::{Access, Namespace, Preferences, MAX_STRING_LEN};
use crate::{
    Result, FIRMWARE_VERSION, OPERATING_NAMESPACE, OPERATING_SCHEMA_VERSION,
    PERIPHERAL_NAMESPACE, PERIPHERAL_SCHEMA_VERSION,
};

/// Key names, exactly as stored.
pub mod keys {
    pub const PROVISIONED: &str = "provisioned";
    pub const FIRMWARE_VERSION_AT_LAST_BOOT: &str = "firmwareVersionAtLastBoot";
    pub const SCHEMA_VERSION: &str = "schemaVersion";
    pub const POLL_INTERVAL_MS: &str = "pollIntervalMs";
    pub const NETWORK_SSID: &str = "networkSSID";
    pub const NETWORK_PASSWORD: &str = "networkPassword";
    pub const TARGET_IP_ADDRESS: &str = "targetIPAddress";
    pub const TARGET_PORT: &str = "targetPort";
    pub const ACTIVE_TALLY_CHANNEL: &str = "activeTallyChannel";
    pub const MAX_TALLY_CHANNEL: &str = "maxTallyChannel";
    pub const DISPLAY_BRIGHTNESS: &str = "displayBrightness";
    pub const CAMERA_OPERATOR_MODE: &str = "cameraOperatorMode";
    pub const AUTO_START_ENABLED: &str = "autoStartEnabled";

    pub const PM_BRIGHTNESS: &str = "pmBrightness";
    pub const PM_CAMERA_MODE: &str = "pmCameraMode";
    pub const PM_SCHEMA_VERSION: &str = "pmSchemaVersion";
}

/// A default value for one key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    Str(&'static str),
}

/// Factory defaults for every key of the operating namespace.
pub const OPERATING_DEFAULTS: [(&str, DefaultValue); 13] = [
    (keys::PROVISIONED, DefaultValue::Bool(false)),
    (keys::FIRMWARE_VERSION_AT_LAST_BOOT, DefaultValue::Str(FIRMWARE_VERSION)),
    (keys::SCHEMA_VERSION, DefaultValue::U16(OPERATING_SCHEMA_VERSION)),
    (keys::POLL_INTERVAL_MS, DefaultValue::U32(300)),
    (keys::NETWORK_SSID, DefaultValue::Str("")),
    (keys::NETWORK_PASSWORD, DefaultValue::Str("")),
    (keys::TARGET_IP_ADDRESS, DefaultValue::Str("")),
    (keys::TARGET_PORT, DefaultValue::U16(80)),
    (keys::ACTIVE_TALLY_CHANNEL, DefaultValue::U8(1)),
    (keys::MAX_TALLY_CHANNEL, DefaultValue::U8(6)),
    (keys::DISPLAY_BRIGHTNESS, DefaultValue::U8(1)),
    (keys::CAMERA_OPERATOR_MODE, DefaultValue::Bool(true)),
    (keys::AUTO_START_ENABLED, DefaultValue::Bool(false)),
];

/// Factory defaults for the peripheral namespace.
pub const PERIPHERAL_DEFAULTS: [(&str, DefaultValue); 3] = [
    (keys::PM_SCHEMA_VERSION, DefaultValue::U16(PERIPHERAL_SCHEMA_VERSION)),
    (keys::PM_CAMERA_MODE, DefaultValue::Bool(false)),
    (keys::PM_BRIGHTNESS, DefaultValue::U8(1)),
];

/// Write every entry of `defaults` into an open namespace.
///
/// # Errors
///
/// Any error from the namespace's `put_*` calls.
pub fn write_defaults<F: NorFlash>(
    namespace: &mut Namespace<'_, F>,
    defaults: &[(&str, DefaultValue)],
) -> Result<()> {
    for &(key, value) in defaults {
        match value {
            DefaultValue::Bool(value) => namespace.put_bool(key, value)?,
            DefaultValue::U8(value) => namespace.put_u8(key, value)?,
            DefaultValue::U16(value) => namespace.put_u16(key, value)?,
            DefaultValue::U32(value) => namespace.put_u32(key, value)?,
            DefaultValue::Str(value) => namespace.put_string(key, value)?,
        }
    }
    Ok(())
}

/// Store a captured provisioning record and mark the unit provisioned.
///
/// Keys not covered by the record keep their stored values. If the stored active
/// channel is above the new maximum it is reset to channel 1.
///
/// # Errors
///
/// Any error from the namespace's `put_*` calls.
pub fn store_record<F: NorFlash>(
    namespace: &mut Namespace<'_, F>,
    record: &ProvisioningRecord,
) -> Result<()> {
    namespace.put_string(keys::NETWORK_SSID, &record.ssid)?;
    namespace.put_string(keys::NETWORK_PASSWORD, &record.password)?;
    namespace.put_string(keys::TARGET_IP_ADDRESS, &record.target_address_text)?;
    namespace.put_u16(keys::TARGET_PORT, record.target_port)?;
    namespace.put_u32(keys::POLL_INTERVAL_MS, record.poll_interval_ms)?;
    namespace.put_u8(keys::MAX_TALLY_CHANNEL, record.max_tally_channel)?;

    let active = namespace.get_u8(keys::ACTIVE_TALLY_CHANNEL, 1);
    if active > record.max_tally_channel {
        info!(
            "Active channel {} is above the new maximum {}, resetting to 1",
            active, record.max_tally_channel
        );
        namespace.put_u8(keys::ACTIVE_TALLY_CHANNEL, 1)?;
    }

    namespace.put_bool(keys::PROVISIONED, true)
}

pub type ConfigString = String<MAX_STRING_LEN>;

/// Everything the operating-mode runtime needs, read once at the end of provisioning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatingConfig {
    pub poll_interval_ms: u32,
    pub display_brightness: u8,
    pub active_tally_channel: u8,
    pub max_tally_channel: u8,
    /// `true` for camera-operator mode, `false` for talent mode.
    pub camera_operator_mode: bool,
    pub auto_start_enabled: bool,
    pub network_ssid: ConfigString,
    pub network_password: ConfigString,
    /// `0.0.0.0` when the stored text is not a dotted quad.
    pub target_address: Ipv4Addr,
    pub target_port: u16,
    pub firmware_version_at_last_boot: ConfigString,
}

impl OperatingConfig {
    /// Read every runtime parameter, falling back to the factory default per key.
    #[must_use]
    pub fn from_namespace<F: NorFlash>(namespace: &Namespace<'_, F>) -> Self {
        let address_text = namespace.get_string(keys::TARGET_IP_ADDRESS, "");
        let target_address = address_text.parse().unwrap_or_else(|_| {
            warn!("Stored target address is not a dotted quad");
            Ipv4Addr::UNSPECIFIED
        });
        Self {
            poll_interval_ms: namespace.get_u32(keys::POLL_INTERVAL_MS, 300),
            display_brightness: namespace.get_u8(keys::DISPLAY_BRIGHTNESS, 1),
            active_tally_channel: namespace.get_u8(keys::ACTIVE_TALLY_CHANNEL, 1),
            max_tally_channel: namespace.get_u8(keys::MAX_TALLY_CHANNEL, 6),
            camera_operator_mode: namespace.get_bool(keys::CAMERA_OPERATOR_MODE, true),
            auto_start_enabled: namespace.get_bool(keys::AUTO_START_ENABLED, false),
            network_ssid: config_string(namespace.get_string(keys::NETWORK_SSID, "")),
            network_password: config_string(namespace.get_string(keys::NETWORK_PASSWORD, "")),
            target_address,
            target_port: namespace.get_u16(keys::TARGET_PORT, 80),
            firmware_version_at_last_boot: config_string(
                namespace.get_string(keys::FIRMWARE_VERSION_AT_LAST_BOOT, ""),
            ),
        }
    }

    /// Open the operating namespace read-only and load it.
    ///
    /// # Errors
    ///
    /// See [`Preferences::begin`].
    pub fn load<F: NorFlash>(prefs: &mut Preferences<F>) -> Result<Self> {
        let namespace = prefs.begin(OPERATING_NAMESPACE, Access::ReadOnly)?;
        Ok(Self::from_namespace(&namespace))
    }
}

/// Settings of the peripheral-mode namespace.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralConfig {
    pub brightness: u8,
    pub camera_operator_mode: bool,
}

impl PeripheralConfig {
    /// Load the peripheral settings, first wiping and re-seeding the namespace if its
    /// schema version is missing or stale.
    ///
    /// # Errors
    ///
    /// Any store error.
    pub fn load_or_reset<F: NorFlash>(prefs: &mut Preferences<F>) -> Result<Self> {
        let stored = {
            let namespace = prefs.begin(PERIPHERAL_NAMESPACE, Access::ReadOnly)?;
            namespace
                .is_key(keys::PM_SCHEMA_VERSION)
                .then(|| namespace.get_u16(keys::PM_SCHEMA_VERSION, 0))
        };
        if stored != Some(PERIPHERAL_SCHEMA_VERSION) {
            warn!("Peripheral settings missing or stale, restoring defaults");
            let mut namespace = prefs.begin(PERIPHERAL_NAMESPACE, Access::ReadWrite)?;
            namespace.clear()?;
            write_defaults(&mut namespace, &PERIPHERAL_DEFAULTS)?;
            namespace.end()?;
        }

        let namespace = prefs.begin(PERIPHERAL_NAMESPACE, Access::ReadOnly)?;
        Ok(Self {
            brightness: namespace.get_u8(keys::PM_BRIGHTNESS, 1),
            camera_operator_mode: namespace.get_bool(keys::PM_CAMERA_MODE, false),
        })
    }

    /// # Errors
    ///
    /// Any store error.
    pub fn save<F: NorFlash>(&self, prefs: &mut Preferences<F>) -> Result<()> {
        let mut namespace = prefs.begin(PERIPHERAL_NAMESPACE, Access::ReadWrite)?;
        namespace.put_u16(keys::PM_SCHEMA_VERSION, PERIPHERAL_SCHEMA_VERSION)?;
        namespace.put_bool(keys::PM_CAMERA_MODE, self.camera_operator_mode)?;
        namespace.put_u8(keys::PM_BRIGHTNESS, self.brightness)?;
        namespace.end()?;
        info!(
            "Peripheral settings saved: camera mode {}, brightness {}",
            self.camera_operator_mode, self.brightness
        );
        Ok(())
    }
}

fn config_string(value: &str) -> ConfigString {
    // Stored strings are bounded by the same length, so this never truncates.
    ConfigString::try_from(value).unwrap_or_default()
}

/// Bring `firmwareVersionAtLastBoot` up to date with the running firmware.
///
/// Returns `true` when the stored version differed.
///
/// # Errors
///
/// Any store error.
pub fn record_firmware_version<F: NorFlash>(prefs: &mut Preferences<F>) -> Result<bool> {
    let mut namespace = prefs.begin(OPERATING_NAMESPACE, Access::ReadWrite)?;
    if namespace.get_string(keys::FIRMWARE_VERSION_AT_LAST_BOOT, "") == FIRMWARE_VERSION {
        return Ok(false);
    }
    namespace.put_string(keys::FIRMWARE_VERSION_AT_LAST_BOOT, FIRMWARE_VERSION)?;
    namespace.end()?;
    info!("Firmware updated to {}", FIRMWARE_VERSION);
    Ok(true)
}

const _: () = assert!(FIRMWARE_VERSION.len() <= MAX_STRING_LEN);
