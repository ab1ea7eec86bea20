use derive_more::derive::{Display, Error};
use embedded_storage::nor_flash::{NorFlashError, NorFlashErrorKind};

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Define a unified error type for this crate.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[display("Flash operation failed: {_0}")]
    Flash(#[error(not(source))] FlashFault),

    #[display("Preference storage is corrupted")]
    StorageCorrupted,

    #[display("Preference namespace is full")]
    NamespaceFull,

    #[display("Preference namespace was opened read-only")]
    NamespaceReadOnly,

    #[display("Unknown preference namespace")]
    UnknownNamespace,

    #[display("Value does not fit its buffer")]
    ValueTooLong,

    #[display("Format error")]
    FormatError,

    #[display("Display is {_0}x{_1} but the buffer holds a different number of pixels")]
    GeometryMismatch(#[error(not(source))] u16, #[error(not(source))] u16),

    #[display("A 90-degree rotation needs a square or transposable display")]
    RotationUnsupported,

    #[display("Malformed configuration form: {_0}")]
    MalformedForm(#[error(not(source))] FormError),

    #[display("Access point could not be started or stopped")]
    AccessPoint,
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Self::FormatError
    }
}

impl From<FormError> for Error {
    fn from(err: FormError) -> Self {
        Self::MalformedForm(err)
    }
}

/// Flash failures, reduced from the driver's own error to its
/// [`NorFlashErrorKind`] so the error stays `Copy` and driver-independent.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashFault {
    #[display("not aligned")]
    NotAligned,
    #[display("out of bounds")]
    OutOfBounds,
    #[display("driver error")]
    Other,
}

impl FlashFault {
    pub(crate) fn from_driver<E: NorFlashError>(err: &E) -> Self {
        match err.kind() {
            NorFlashErrorKind::NotAligned => Self::NotAligned,
            NorFlashErrorKind::OutOfBounds => Self::OutOfBounds,
            _ => Self::Other,
        }
    }
}

impl From<FlashFault> for Error {
    fn from(fault: FlashFault) -> Self {
        Self::Flash(fault)
    }
}

/// Ways a submitted configuration form can be rejected.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormError {
    #[display("no form body")]
    MissingBody,
    #[display("missing field `{_0}`")]
    MissingField(&'static str),
    #[display("field `{_0}` is too long")]
    TooLong(&'static str),
    #[display("field `{_0}` is not a number")]
    InvalidNumber(&'static str),
    #[display("field `{_0}` is out of range")]
    OutOfRange(&'static str),
    #[display("field `{_0}` is not a dotted-quad address")]
    InvalidAddress(&'static str),
    #[display("field `{_0}` does not decode to UTF-8")]
    InvalidEncoding(&'static str),
}
