use thiserror::Error;

use crate::Config;

/// Errors produced while negotiating a handshake.
///
/// Every variant belongs to one [`ErrorKind`] and maps to the TLS alert that a
/// handshake driver would send for it. Nothing in this crate tears down a
/// connection, the caller decides what to do with the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Decode error: {0}")]
    DecodeError(&'static str),

    #[error("Unexpected packet length: {0}")]
    UnexpectedPacketLength(&'static str),

    #[error("Received illegal parameter: {0}")]
    IllegalParameter(&'static str),

    #[error("Received illegal extension {0:#06x}: {1}")]
    IllegalExtension(u16, &'static str),

    #[error("Insufficient credentials")]
    InsufficientCredentials,

    #[error("Certificate required")]
    CertificateRequired,

    #[error("Certificate error: {0}")]
    CertificateError(String),

    #[error("Incompatible signature algorithm for the key")]
    IncompatibleSigWithKey,

    #[error("Unsupported signature algorithm {0:#06x}")]
    UnsupportedSignatureAlgorithm(u16),

    #[error("Unknown public key algorithm")]
    UnknownPkAlgorithm,

    #[error("Key usage violation in certificate")]
    KeyUsageViolation,

    #[error("Signature verification failed")]
    DecryptError,

    #[error("No common protocol version")]
    NoCommonVersion,

    #[error("No common group")]
    NoCommonGroup,

    #[error("Unsupported group {0:#06x}")]
    UnsupportedGroup(u16),

    #[error("DH prime of {0} bits is unacceptable")]
    DhPrimeUnacceptable(usize),

    #[error("Unknown PSK identity")]
    UnknownPskIdentity,

    #[error("Extension {0:#06x} is already registered")]
    AlreadyRegistered(u16),

    #[error("Extension {0:#06x} state holds another type")]
    ExtensionStateType(u16),

    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error("Config error: {0}")]
    Config(&'static str),

    #[error("Crypto error: {0}")]
    CryptoError(String),
}

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wire data could not be parsed.
    MalformedMessage,
    /// Well formed data that is not allowed here.
    IllegalParameter,
    /// No certificate, key or PSK could be used.
    NoUsableCredential,
    /// The peer and us share no usable algorithm.
    AlgorithmMismatch,
    /// Local policy refuses the parameters. Can be tolerated by config.
    PolicyRejection,
    /// Programming or primitive failure.
    Internal,
}

/// TLS alert descriptions (RFC 8446 6.2) used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDescription {
    HandshakeFailure,
    BadCertificate,
    ProtocolVersion,
    UnsupportedCertificate,
    IllegalParameter,
    DecodeError,
    DecryptError,
    InsufficientSecurity,
    InternalError,
    UnsupportedExtension,
    UnknownPskIdentity,
    CertificateRequired,
}

impl AlertDescription {
    pub fn as_u8(&self) -> u8 {
        match self {
            AlertDescription::HandshakeFailure => 40,
            AlertDescription::BadCertificate => 42,
            AlertDescription::UnsupportedCertificate => 43,
            AlertDescription::IllegalParameter => 47,
            AlertDescription::DecodeError => 50,
            AlertDescription::DecryptError => 51,
            AlertDescription::ProtocolVersion => 70,
            AlertDescription::InsufficientSecurity => 71,
            AlertDescription::InternalError => 80,
            AlertDescription::UnsupportedExtension => 110,
            AlertDescription::UnknownPskIdentity => 115,
            AlertDescription::CertificateRequired => 116,
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DecodeError(_) | Error::UnexpectedPacketLength(_) => ErrorKind::MalformedMessage,
            Error::IllegalParameter(_) | Error::IllegalExtension(_, _) => {
                ErrorKind::IllegalParameter
            }
            Error::InsufficientCredentials
            | Error::CertificateRequired
            | Error::CertificateError(_)
            | Error::KeyUsageViolation
            | Error::UnknownPskIdentity => ErrorKind::NoUsableCredential,
            Error::IncompatibleSigWithKey
            | Error::UnsupportedSignatureAlgorithm(_)
            | Error::UnknownPkAlgorithm
            | Error::NoCommonVersion
            | Error::NoCommonGroup
            | Error::UnsupportedGroup(_)
            | Error::DecryptError => ErrorKind::AlgorithmMismatch,
            Error::DhPrimeUnacceptable(_) => ErrorKind::PolicyRejection,
            Error::AlreadyRegistered(_)
            | Error::ExtensionStateType(_)
            | Error::InvalidState(_)
            | Error::Config(_)
            | Error::CryptoError(_) => ErrorKind::Internal,
        }
    }

    /// The alert a handshake driver sends for this error.
    pub fn alert(&self) -> AlertDescription {
        match self {
            Error::DecodeError(_) | Error::UnexpectedPacketLength(_) => {
                AlertDescription::DecodeError
            }
            Error::IllegalParameter(_) | Error::UnsupportedGroup(_) => {
                AlertDescription::IllegalParameter
            }
            Error::IllegalExtension(_, _) => AlertDescription::UnsupportedExtension,
            Error::CertificateRequired => AlertDescription::CertificateRequired,
            Error::CertificateError(_) | Error::KeyUsageViolation => {
                AlertDescription::BadCertificate
            }
            Error::UnknownPkAlgorithm => AlertDescription::UnsupportedCertificate,
            Error::DecryptError => AlertDescription::DecryptError,
            Error::DhPrimeUnacceptable(_) => AlertDescription::InsufficientSecurity,
            Error::NoCommonVersion => AlertDescription::ProtocolVersion,
            Error::UnknownPskIdentity => AlertDescription::UnknownPskIdentity,
            Error::InsufficientCredentials
            | Error::IncompatibleSigWithKey
            | Error::UnsupportedSignatureAlgorithm(_)
            | Error::NoCommonGroup => AlertDescription::HandshakeFailure,
            Error::AlreadyRegistered(_)
            | Error::ExtensionStateType(_)
            | Error::InvalidState(_)
            | Error::Config(_)
            | Error::CryptoError(_) => AlertDescription::InternalError,
        }
    }

    /// Whether the handshake must be aborted under `config`.
    ///
    /// Policy rejections are tolerated when the config asks for it, every
    /// other error is fatal.
    pub fn is_fatal(&self, config: &Config) -> bool {
        match self {
            Error::DhPrimeUnacceptable(_) => !config.tolerate_weak_dh(),
            _ => true,
        }
    }
}

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for Error {
    fn from(value: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        match value {
            nom::Err::Incomplete(_) => Error::UnexpectedPacketLength("incomplete input"),
            nom::Err::Error(e) | nom::Err::Failure(e) => match e.code {
                nom::error::ErrorKind::Eof => Error::UnexpectedPacketLength("truncated input"),
                _ => Error::DecodeError("malformed input"),
            },
        }
    }
}
