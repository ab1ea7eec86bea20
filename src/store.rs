//! Namespaced, typed key/value preferences in NOR flash.
//!
//! A [`Preferences`] store owns a flash driver and a fixed list of namespace names.
//! Each namespace lives in its own [`REGION_SIZE`] region, one after another from the
//! store's base offset, so wiping one namespace never touches another.
//!
//! # Storage Format
//!
//! Each region holds:
//! - Magic number (4 bytes): `0x5354_4350` ('STCP')
//! - Name hash (4 bytes): FNV-1a hash of the namespace name
//! - Payload length (2 bytes)
//! - Payload: postcard-serialized list of `(key, value)` entries
//! - CRC32 (4 bytes) over everything before it
//!
//! An erased region, or one written for a different name, reads as an empty
//! namespace. A region whose length or CRC does not check out is logged and also
//! treated as empty, so a damaged namespace degrades to "never provisioned".
//!
//! # Sessions
//!
//! [`Preferences::begin`] hands out a [`Namespace`] that mutably borrows the store, so
//! only one namespace can be open at a time. Changes are buffered in RAM and
//! written by [`Namespace::end`].
//!
//! ```ignore
//! let mut prefs = Preferences::new(flash, 0, &["STCPrefs", "PModePrefs"])?;
//! let mut ns = prefs.begin("STCPrefs", Access::ReadWrite)?;
//! ns.put_u16("pollIntervalMs", 300)?;
//! ns.end()?;
//! ```

use crc32fast::Hasher;
use embedded_storage::nor_flash::NorFlash;
use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::{Error, FlashFault, Result};

/// Bytes reserved in flash for each namespace.
pub const REGION_SIZE: usize = 4096;
/// Most entries a namespace can hold.
pub const MAX_ENTRIES: usize = 16;
pub const MAX_KEY_LEN: usize = 32;
/// Longest string value, in bytes.
pub const MAX_STRING_LEN: usize = 64;

const MAGIC: u32 = 0x5354_4350; // 'STCP'
const HEADER_SIZE: usize = 4 + 4 + 2; // Magic + NameHash + PayloadLen
const CRC_SIZE: usize = 4;
const MAX_PAYLOAD_SIZE: usize = REGION_SIZE - HEADER_SIZE - CRC_SIZE;

/// A stored value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    Str(String<MAX_STRING_LEN>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Entry {
    key: String<MAX_KEY_LEN>,
    value: Value,
}

type Entries = Vec<Entry, MAX_ENTRIES>;

/// How a namespace is opened.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// Typed preferences over a NOR flash device.
///
/// See the [module-level documentation](crate::store) for the on-flash layout.
pub struct Preferences<F: NorFlash> {
    flash: F,
    base: u32,
    namespaces: &'static [&'static str],
}

impl<F: NorFlash> Preferences<F> {
    /// Create a store whose first namespace starts at flash offset `base`.
    ///
    /// # Errors
    ///
    /// [`Error::Flash`] if `base` or [`REGION_SIZE`] is not a multiple of the erase
    /// size, or the namespaces do not fit in the device.
    pub fn new(flash: F, base: u32, namespaces: &'static [&'static str]) -> Result<Self> {
        let erase_size = F::ERASE_SIZE;
        if erase_size == 0
            || REGION_SIZE % erase_size != 0
            || base as usize % erase_size != 0
            || REGION_SIZE % F::READ_SIZE != 0
        {
            return Err(FlashFault::NotAligned.into());
        }
        let end = (base as usize).saturating_add(namespaces.len().saturating_mul(REGION_SIZE));
        if end > flash.capacity() {
            return Err(FlashFault::OutOfBounds.into());
        }
        info!(
            "Preferences: {} namespaces at offset {}",
            namespaces.len(),
            base
        );
        Ok(Self {
            flash,
            base,
            namespaces,
        })
    }

    /// Open namespace `name`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownNamespace`] if `name` was not registered, [`Error::Flash`] if the
    /// region cannot be read.
    pub fn begin(&mut self, name: &str, access: Access) -> Result<Namespace<'_, F>> {
        let (slot, name) = self
            .namespaces
            .iter()
            .enumerate()
            .find(|(_, registered)| **registered == name)
            .map(|(slot, registered)| (slot, *registered))
            .ok_or(Error::UnknownNamespace)?;

        let entries = match self.load(slot, name) {
            Ok(entries) => entries,
            Err(Error::StorageCorrupted) => {
                error!("Preferences: namespace {} is corrupted, starting empty", name);
                Entries::new()
            }
            Err(err) => return Err(err),
        };
        debug!(
            "Preferences: opened {} ({:?}) with {} keys",
            name,
            access,
            entries.len()
        );
        Ok(Namespace {
            store: self,
            slot,
            name,
            access,
            entries,
            dirty: false,
        })
    }

    /// Erase every key of namespace `name`.
    ///
    /// # Errors
    ///
    /// See [`Preferences::begin`] and [`Namespace::end`].
    pub fn wipe(&mut self, name: &str) -> Result<()> {
        let mut namespace = self.begin(name, Access::ReadWrite)?;
        namespace.clear()?;
        namespace.end()
    }

    /// Give back the flash driver.
    pub fn release(self) -> F {
        self.flash
    }

    fn region_offset(&self, slot: usize) -> u32 {
        // `new` checked that every region fits in the device.
        #[allow(clippy::cast_possible_truncation, reason = "offsets fit the flash capacity")]
        let region = (slot * REGION_SIZE) as u32;
        self.base.saturating_add(region)
    }

    fn load(&mut self, slot: usize, name: &str) -> Result<Entries> {
        let offset = self.region_offset(slot);
        let mut buffer = [0u8; REGION_SIZE];
        self.flash
            .read(offset, &mut buffer)
            .map_err(|err| Error::Flash(FlashFault::from_driver(&err)))?;
        decode(&buffer, name)
    }

    fn store(&mut self, slot: usize, name: &str, entries: &Entries) -> Result<()> {
        let offset = self.region_offset(slot);
        #[allow(clippy::cast_possible_truncation, reason = "REGION_SIZE fits u32")]
        let end = offset.saturating_add(REGION_SIZE as u32);
        self.flash
            .erase(offset, end)
            .map_err(|err| Error::Flash(FlashFault::from_driver(&err)))?;
        if entries.is_empty() {
            info!("Preferences: cleared namespace {}", name);
            return Ok(());
        }

        let mut buffer = [0xFFu8; REGION_SIZE];
        let used = encode(entries, name, &mut buffer)?;
        let write_len = round_up(used, F::WRITE_SIZE).min(REGION_SIZE);
        self.flash
            .write(offset, buffer.get(..write_len).ok_or(Error::ValueTooLong)?)
            .map_err(|err| Error::Flash(FlashFault::from_driver(&err)))?;
        info!(
            "Preferences: saved {} keys ({} bytes) to namespace {}",
            entries.len(),
            used,
            name
        );
        Ok(())
    }
}

/// An open namespace. See [`Preferences::begin`].
///
/// Getters never fail: a missing key, or a key stored with another type, yields the
/// supplied default. Changes reach flash only through [`Namespace::end`]; dropping a
/// namespace with unsaved changes discards them, so a failed update leaves the stored
/// namespace as it was.
pub struct Namespace<'a, F: NorFlash> {
    store: &'a mut Preferences<F>,
    slot: usize,
    name: &'static str,
    access: Access,
    entries: Entries,
    dirty: bool,
}

impl<F: NorFlash> Namespace<'_, F> {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Number of keys currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.find(key) {
            Some(Value::Bool(value)) => *value,
            _ => default,
        }
    }

    #[must_use]
    pub fn get_u8(&self, key: &str, default: u8) -> u8 {
        match self.find(key) {
            Some(Value::U8(value)) => *value,
            _ => default,
        }
    }

    #[must_use]
    pub fn get_u16(&self, key: &str, default: u16) -> u16 {
        match self.find(key) {
            Some(Value::U16(value)) => *value,
            _ => default,
        }
    }

    #[must_use]
    pub fn get_u32(&self, key: &str, default: u32) -> u32 {
        match self.find(key) {
            Some(Value::U32(value)) => *value,
            _ => default,
        }
    }

    #[must_use]
    pub fn get_string<'s>(&'s self, key: &str, default: &'s str) -> &'s str {
        match self.find(key) {
            Some(Value::Str(value)) => value.as_str(),
            _ => default,
        }
    }

    /// # Errors
    ///
    /// See [`Namespace::put`].
    pub fn put_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.put(key, Value::Bool(value))
    }

    /// # Errors
    ///
    /// See [`Namespace::put`].
    pub fn put_u8(&mut self, key: &str, value: u8) -> Result<()> {
        self.put(key, Value::U8(value))
    }

    /// # Errors
    ///
    /// See [`Namespace::put`].
    pub fn put_u16(&mut self, key: &str, value: u16) -> Result<()> {
        self.put(key, Value::U16(value))
    }

    /// # Errors
    ///
    /// See [`Namespace::put`].
    pub fn put_u32(&mut self, key: &str, value: u32) -> Result<()> {
        self.put(key, Value::U32(value))
    }

    /// # Errors
    ///
    /// [`Error::ValueTooLong`] if `value` exceeds [`MAX_STRING_LEN`] bytes, otherwise
    /// see [`Namespace::put`].
    pub fn put_string(&mut self, key: &str, value: &str) -> Result<()> {
        let value = String::try_from(value).map_err(|()| Error::ValueTooLong)?;
        self.put(key, Value::Str(value))
    }

    /// Insert or replace `key`.
    ///
    /// # Errors
    ///
    /// [`Error::NamespaceReadOnly`] when opened read-only, [`Error::ValueTooLong`] for an
    /// over-long key, [`Error::NamespaceFull`] when a new key does not fit.
    pub fn put(&mut self, key: &str, value: Value) -> Result<()> {
        self.check_writable()?;
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.key == key) {
            if entry.value != value {
                entry.value = value;
                self.dirty = true;
            }
            return Ok(());
        }
        let key = String::try_from(key).map_err(|()| Error::ValueTooLong)?;
        self.entries
            .push(Entry { key, value })
            .map_err(|_| Error::NamespaceFull)?;
        self.dirty = true;
        Ok(())
    }

    /// Remove `key`. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// [`Error::NamespaceReadOnly`] when opened read-only.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        self.check_writable()?;
        let Some(position) = self.entries.iter().position(|entry| entry.key == key) else {
            return Ok(false);
        };
        self.entries.remove(position);
        self.dirty = true;
        Ok(true)
    }

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// [`Error::NamespaceReadOnly`] when opened read-only.
    pub fn clear(&mut self) -> Result<()> {
        self.check_writable()?;
        self.entries.clear();
        self.dirty = true;
        Ok(())
    }

    /// Close the namespace, saving any changes.
    ///
    /// # Errors
    ///
    /// [`Error::Flash`] if writing fails or [`Error::FormatError`] if the entries do not
    /// serialize into a region.
    pub fn end(mut self) -> Result<()> {
        self.commit()
    }

    fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.dirty = false;
        self.store.store(self.slot, self.name, &self.entries)
    }

    /// Whether there are changes not yet saved by [`Namespace::end`].
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn find(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    const fn check_writable(&self) -> Result<()> {
        match self.access {
            Access::ReadWrite => Ok(()),
            Access::ReadOnly => Err(Error::NamespaceReadOnly),
        }
    }
}

impl<F: NorFlash> Drop for Namespace<'_, F> {
    fn drop(&mut self) {
        if self.dirty {
            warn!("Preferences: discarding unsaved changes to {}", self.name);
        }
    }
}

fn decode(buffer: &[u8; REGION_SIZE], name: &str) -> Result<Entries> {
    let magic = read_u32(buffer, 0);
    if magic != MAGIC {
        debug!("Preferences: no data for namespace {}", name);
        return Ok(Entries::new());
    }

    let stored_hash = read_u32(buffer, 4);
    if stored_hash != name_hash(name) {
        info!("Preferences: region holds another namespace, {} reads empty", name);
        return Ok(Entries::new());
    }

    let payload_len = usize::from(u16::from_le_bytes([buffer[8], buffer[9]]));
    if payload_len > MAX_PAYLOAD_SIZE {
        error!("Preferences: invalid payload length {} in {}", payload_len, name);
        return Err(Error::StorageCorrupted);
    }

    let crc_offset = HEADER_SIZE + payload_len;
    let stored_crc = read_u32(buffer, crc_offset);
    let computed_crc = compute_crc(buffer.get(..crc_offset).ok_or(Error::StorageCorrupted)?);
    if stored_crc != computed_crc {
        error!(
            "Preferences: CRC mismatch in {} (expected {}, found {})",
            name, computed_crc, stored_crc
        );
        return Err(Error::StorageCorrupted);
    }

    let payload = buffer
        .get(HEADER_SIZE..crc_offset)
        .ok_or(Error::StorageCorrupted)?;
    postcard::from_bytes(payload).map_err(|_| {
        error!("Preferences: deserialization failed in {}", name);
        Error::StorageCorrupted
    })
}

/// Serialize `entries` into `buffer`, returning the number of bytes used.
fn encode(entries: &Entries, name: &str, buffer: &mut [u8; REGION_SIZE]) -> Result<usize> {
    let (header, rest) = buffer.split_at_mut(HEADER_SIZE);
    let payload_len = postcard::to_slice(entries, &mut rest[..MAX_PAYLOAD_SIZE])
        .map_err(|_| {
            error!("Preferences: {} does not fit in {} bytes", name, MAX_PAYLOAD_SIZE);
            Error::FormatError
        })?
        .len();

    header[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    header[4..8].copy_from_slice(&name_hash(name).to_le_bytes());
    #[allow(clippy::cast_possible_truncation, reason = "bounded by MAX_PAYLOAD_SIZE")]
    header[8..10].copy_from_slice(&(payload_len as u16).to_le_bytes());

    let crc_offset = HEADER_SIZE + payload_len;
    let crc = compute_crc(&buffer[..crc_offset]);
    buffer[crc_offset..crc_offset + CRC_SIZE].copy_from_slice(&crc.to_le_bytes());
    Ok(crc_offset + CRC_SIZE)
}

fn read_u32(buffer: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    if let Some(source) = buffer.get(offset..offset + 4) {
        bytes.copy_from_slice(source);
    }
    u32::from_le_bytes(bytes)
}

const fn round_up(len: usize, align: usize) -> usize {
    if align <= 1 {
        len
    } else {
        len.div_ceil(align) * align
    }
}

/// FNV-1a hash of a namespace name.
fn name_hash(name: &str) -> u32 {
    const FNV_PRIME: u32 = 16_777_619;
    const FNV_OFFSET: u32 = 2_166_136_261;

    let mut hash = FNV_OFFSET;
    for byte in name.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
