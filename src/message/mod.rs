//! Wire types for the handshake messages tlsnego reads and writes.
//!
//! Parsers are written with `nom` and return `IResult`. Callers convert
//! failures into [`crate::Error`] at the message boundary.

#[macro_use]
mod macros;

mod certificate_request;
mod client_key_exchange;
mod digitally_signed;
mod extension;
pub mod extensions;
mod named_group;
mod server_key_exchange;
mod wrapped;

use std::fmt;

pub use certificate_request::CertificateRequest;
pub use client_key_exchange::{ClientDhPublic, ClientEcdhPublic, EncryptedPreMasterSecret, PskIdentity};
pub use digitally_signed::DigitallySigned;
pub use extension::{Extension, ExtensionType};
pub use named_group::{CurveType, NamedGroup};
pub use server_key_exchange::{DhParams, EcdhParams, PskIdentityHint};
pub use wrapped::{Asn1Cert, DistinguishedName};

use nom::number::complete::be_u16;
use nom::IResult;

/// Which side of the handshake we are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// Stream (TLS) or datagram (DTLS) transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFamily {
    Tls,
    Dtls,
}

wire_enum! {
    #[allow(non_camel_case_types)]
    pub enum ProtocolVersion: u16 {
        SSL3_0 = 0x0300,
        TLS1_0 = 0x0301,
        TLS1_1 = 0x0302,
        TLS1_2 = 0x0303,
        TLS1_3 = 0x0304,
        DTLS1_0 = 0xfeff,
        DTLS1_2 = 0xfefd,
        DTLS1_3 = 0xfefc,
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

impl ProtocolVersion {
    pub fn family(&self) -> Option<ProtocolFamily> {
        match self {
            ProtocolVersion::SSL3_0
            | ProtocolVersion::TLS1_0
            | ProtocolVersion::TLS1_1
            | ProtocolVersion::TLS1_2
            | ProtocolVersion::TLS1_3 => Some(ProtocolFamily::Tls),
            ProtocolVersion::DTLS1_0 | ProtocolVersion::DTLS1_2 | ProtocolVersion::DTLS1_3 => {
                Some(ProtocolFamily::Dtls)
            }
            ProtocolVersion::Unknown(_) => None,
        }
    }

    /// Whether signatures carry an explicit (hash, signature) pair.
    ///
    /// True from TLS 1.2 and DTLS 1.2 onwards.
    pub fn has_selectable_sighash(&self) -> bool {
        matches!(
            self,
            ProtocolVersion::TLS1_2
                | ProtocolVersion::TLS1_3
                | ProtocolVersion::DTLS1_2
                | ProtocolVersion::DTLS1_3
        )
    }

    /// TLS 1.3 or DTLS 1.3.
    pub fn is_tls13(&self) -> bool {
        matches!(self, ProtocolVersion::TLS1_3 | ProtocolVersion::DTLS1_3)
    }

    /// SSL 3.0 sends the encrypted premaster without a length prefix.
    pub fn is_ssl3(&self) -> bool {
        matches!(self, ProtocolVersion::SSL3_0)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::SSL3_0 => write!(f, "SSL 3.0"),
            ProtocolVersion::TLS1_0 => write!(f, "TLS 1.0"),
            ProtocolVersion::TLS1_1 => write!(f, "TLS 1.1"),
            ProtocolVersion::TLS1_2 => write!(f, "TLS 1.2"),
            ProtocolVersion::TLS1_3 => write!(f, "TLS 1.3"),
            ProtocolVersion::DTLS1_0 => write!(f, "DTLS 1.0"),
            ProtocolVersion::DTLS1_2 => write!(f, "DTLS 1.2"),
            ProtocolVersion::DTLS1_3 => write!(f, "DTLS 1.3"),
            ProtocolVersion::Unknown(v) => write!(f, "Unknown({v:#06x})"),
        }
    }
}

wire_enum! {
    /// Cipher suites whose key exchange tlsnego understands.
    #[allow(non_camel_case_types)]
    pub enum CipherSuite: u16 {
        TLS_RSA_WITH_AES_128_GCM_SHA256 = 0x009c,
        TLS_DHE_RSA_WITH_AES_128_GCM_SHA256 = 0x009e,
        TLS_DHE_DSS_WITH_AES_128_GCM_SHA256 = 0x00a2,
        TLS_DH_ANON_WITH_AES_128_GCM_SHA256 = 0x00a6,
        TLS_PSK_WITH_AES_128_GCM_SHA256 = 0x00a8,
        TLS_DHE_PSK_WITH_AES_128_GCM_SHA256 = 0x00aa,
        TLS_RSA_PSK_WITH_AES_128_GCM_SHA256 = 0x00ac,
        TLS_ECDH_ANON_WITH_AES_128_CBC_SHA = 0xc018,
        TLS_ECDHE_PSK_WITH_AES_128_CBC_SHA256 = 0xc037,
        TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 = 0xc02b,
        TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 = 0xc02c,
        TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 = 0xc02f,
        TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 = 0xc030,
        TLS_AES_128_GCM_SHA256 = 0x1301,
        TLS_AES_256_GCM_SHA384 = 0x1302,
        TLS_CHACHA20_POLY1305_SHA256 = 0x1303,
    }
}

impl Default for CipherSuite {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

impl CipherSuite {
    pub fn key_exchange_algorithm(&self) -> KeyExchangeAlgorithm {
        use KeyExchangeAlgorithm as K;
        match self {
            CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256 => K::Rsa,
            CipherSuite::TLS_DHE_RSA_WITH_AES_128_GCM_SHA256 => K::DheRsa,
            CipherSuite::TLS_DHE_DSS_WITH_AES_128_GCM_SHA256 => K::DheDss,
            CipherSuite::TLS_DH_ANON_WITH_AES_128_GCM_SHA256 => K::DhAnon,
            CipherSuite::TLS_PSK_WITH_AES_128_GCM_SHA256 => K::Psk,
            CipherSuite::TLS_DHE_PSK_WITH_AES_128_GCM_SHA256 => K::DhePsk,
            CipherSuite::TLS_RSA_PSK_WITH_AES_128_GCM_SHA256 => K::RsaPsk,
            CipherSuite::TLS_ECDH_ANON_WITH_AES_128_CBC_SHA => K::EcdhAnon,
            CipherSuite::TLS_ECDHE_PSK_WITH_AES_128_CBC_SHA256 => K::EcdhePsk,
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256
            | CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 => K::EcdheEcdsa,
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256
            | CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 => K::EcdheRsa,
            CipherSuite::TLS_AES_128_GCM_SHA256
            | CipherSuite::TLS_AES_256_GCM_SHA384
            | CipherSuite::TLS_CHACHA20_POLY1305_SHA256 => K::Tls13,
            CipherSuite::Unknown(_) => K::Unknown,
        }
    }
}

/// Key exchange method implied by a cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExchangeAlgorithm {
    Rsa,
    DheRsa,
    DheDss,
    DhAnon,
    EcdheRsa,
    EcdheEcdsa,
    EcdhAnon,
    Psk,
    DhePsk,
    EcdhePsk,
    RsaPsk,
    /// TLS 1.3 suites, key exchange negotiated through key_share.
    Tls13,
    Unknown,
}

impl KeyExchangeAlgorithm {
    /// The server signs its key exchange parameters.
    pub fn signs_params(&self) -> bool {
        matches!(
            self,
            KeyExchangeAlgorithm::DheRsa
                | KeyExchangeAlgorithm::DheDss
                | KeyExchangeAlgorithm::EcdheRsa
                | KeyExchangeAlgorithm::EcdheEcdsa
                | KeyExchangeAlgorithm::Tls13
        )
    }

    /// The server must present a certificate.
    pub fn requires_certificate(&self) -> bool {
        self.signs_params() || matches!(self, KeyExchangeAlgorithm::Rsa | KeyExchangeAlgorithm::RsaPsk)
    }

    /// Anonymous and plain PSK exchanges authenticate nobody with certificates.
    pub fn is_anonymous(&self) -> bool {
        matches!(
            self,
            KeyExchangeAlgorithm::DhAnon
                | KeyExchangeAlgorithm::EcdhAnon
                | KeyExchangeAlgorithm::Psk
                | KeyExchangeAlgorithm::DhePsk
                | KeyExchangeAlgorithm::EcdhePsk
        )
    }

    pub fn uses_psk(&self) -> bool {
        matches!(
            self,
            KeyExchangeAlgorithm::Psk
                | KeyExchangeAlgorithm::DhePsk
                | KeyExchangeAlgorithm::EcdhePsk
                | KeyExchangeAlgorithm::RsaPsk
        )
    }

    pub fn uses_ffdhe(&self) -> bool {
        matches!(
            self,
            KeyExchangeAlgorithm::DheRsa
                | KeyExchangeAlgorithm::DheDss
                | KeyExchangeAlgorithm::DhAnon
                | KeyExchangeAlgorithm::DhePsk
        )
    }

    pub fn uses_ecdhe(&self) -> bool {
        matches!(
            self,
            KeyExchangeAlgorithm::EcdheRsa
                | KeyExchangeAlgorithm::EcdheEcdsa
                | KeyExchangeAlgorithm::EcdhAnon
                | KeyExchangeAlgorithm::EcdhePsk
        )
    }
}

/// Public key algorithm of a certificate or private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PkAlgorithm {
    Rsa,
    /// RSA key restricted to PSS by its certificate (id-RSASSA-PSS).
    RsaPss,
    Dsa,
    Ecdsa,
    Ed25519,
    Ed448,
}

wire_enum! {
    /// certificate_types of a TLS 1.2 CertificateRequest.
    #[allow(non_camel_case_types)]
    pub enum ClientCertificateType: u8 {
        RSA_SIGN = 1,
        DSS_SIGN = 2,
        RSA_FIXED_DH = 3,
        DSS_FIXED_DH = 4,
        RSA_EPHEMERAL_DH = 5,
        DSS_EPHEMERAL_DH = 6,
        FORTEZZA_DMS = 20,
        ECDSA_SIGN = 64,
    }
}

impl Default for ClientCertificateType {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

impl ClientCertificateType {
    /// Public key algorithm a client certificate of this type carries.
    pub fn pk_algorithm(&self) -> Option<PkAlgorithm> {
        match self {
            ClientCertificateType::RSA_SIGN => Some(PkAlgorithm::Rsa),
            ClientCertificateType::DSS_SIGN => Some(PkAlgorithm::Dsa),
            ClientCertificateType::ECDSA_SIGN => Some(PkAlgorithm::Ecdsa),
            _ => None,
        }
    }

    pub fn for_pk_algorithm(pk: PkAlgorithm) -> Option<ClientCertificateType> {
        match pk {
            PkAlgorithm::Rsa | PkAlgorithm::RsaPss => Some(ClientCertificateType::RSA_SIGN),
            PkAlgorithm::Dsa => Some(ClientCertificateType::DSS_SIGN),
            PkAlgorithm::Ecdsa | PkAlgorithm::Ed25519 | PkAlgorithm::Ed448 => {
                Some(ClientCertificateType::ECDSA_SIGN)
            }
        }
    }
}

wire_enum! {
    #[allow(non_camel_case_types)]
    pub enum SignatureAlgorithm: u8 {
        Anonymous = 0,
        RSA = 1,
        DSA = 2,
        ECDSA = 3,
    }
}

impl Default for SignatureAlgorithm {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum HashAlgorithm {
    None,
    MD5,
    SHA1,
    SHA224,
    SHA256,
    SHA384,
    SHA512,
    /// Concatenated MD5 and SHA-1 of pre TLS 1.2 RSA signatures.
    MD5_SHA1,
    /// Ed25519 and Ed448 hash internally.
    Intrinsic,
    Unknown(u8),
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

impl HashAlgorithm {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => HashAlgorithm::None,
            1 => HashAlgorithm::MD5,
            2 => HashAlgorithm::SHA1,
            3 => HashAlgorithm::SHA224,
            4 => HashAlgorithm::SHA256,
            5 => HashAlgorithm::SHA384,
            6 => HashAlgorithm::SHA512,
            _ => HashAlgorithm::Unknown(value),
        }
    }

    /// Output size in bytes, `None` for hashes without a fixed digest.
    pub fn output_len(&self) -> Option<usize> {
        match self {
            HashAlgorithm::MD5 => Some(16),
            HashAlgorithm::SHA1 => Some(20),
            HashAlgorithm::SHA224 => Some(28),
            HashAlgorithm::SHA256 => Some(32),
            HashAlgorithm::SHA384 => Some(48),
            HashAlgorithm::SHA512 => Some(64),
            HashAlgorithm::MD5_SHA1 => Some(36),
            _ => None,
        }
    }
}

/// Signature schemes (RFC 8446 4.2.3), including the TLS 1.2
/// (hash, signature) pairs that have no TLS 1.3 name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum SignatureScheme {
    /// RSA PKCS#1 v1.5 over MD5 ‖ SHA-1, used before TLS 1.2.
    ///
    /// Never appears on the wire.
    RSA_PKCS1_MD5_SHA1,
    RSA_PKCS1_SHA1,
    DSA_SHA1,
    ECDSA_SHA1,
    RSA_PKCS1_SHA224,
    DSA_SHA224,
    ECDSA_SHA224,
    RSA_PKCS1_SHA256,
    DSA_SHA256,
    ECDSA_SECP256R1_SHA256,
    RSA_PKCS1_SHA384,
    ECDSA_SECP384R1_SHA384,
    RSA_PKCS1_SHA512,
    ECDSA_SECP521R1_SHA512,
    RSA_PSS_RSAE_SHA256,
    RSA_PSS_RSAE_SHA384,
    RSA_PSS_RSAE_SHA512,
    ED25519,
    ED448,
    RSA_PSS_PSS_SHA256,
    RSA_PSS_PSS_SHA384,
    RSA_PSS_PSS_SHA512,
    Unknown(u16),
}

impl Default for SignatureScheme {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

impl SignatureScheme {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0201 => SignatureScheme::RSA_PKCS1_SHA1,
            0x0202 => SignatureScheme::DSA_SHA1,
            0x0203 => SignatureScheme::ECDSA_SHA1,
            0x0301 => SignatureScheme::RSA_PKCS1_SHA224,
            0x0302 => SignatureScheme::DSA_SHA224,
            0x0303 => SignatureScheme::ECDSA_SHA224,
            0x0401 => SignatureScheme::RSA_PKCS1_SHA256,
            0x0402 => SignatureScheme::DSA_SHA256,
            0x0403 => SignatureScheme::ECDSA_SECP256R1_SHA256,
            0x0501 => SignatureScheme::RSA_PKCS1_SHA384,
            0x0503 => SignatureScheme::ECDSA_SECP384R1_SHA384,
            0x0601 => SignatureScheme::RSA_PKCS1_SHA512,
            0x0603 => SignatureScheme::ECDSA_SECP521R1_SHA512,
            0x0804 => SignatureScheme::RSA_PSS_RSAE_SHA256,
            0x0805 => SignatureScheme::RSA_PSS_RSAE_SHA384,
            0x0806 => SignatureScheme::RSA_PSS_RSAE_SHA512,
            0x0807 => SignatureScheme::ED25519,
            0x0808 => SignatureScheme::ED448,
            0x0809 => SignatureScheme::RSA_PSS_PSS_SHA256,
            0x080a => SignatureScheme::RSA_PSS_PSS_SHA384,
            0x080b => SignatureScheme::RSA_PSS_PSS_SHA512,
            _ => SignatureScheme::Unknown(value),
        }
    }

    /// Wire value. [`SignatureScheme::RSA_PKCS1_MD5_SHA1`] has none and yields 0.
    pub fn as_u16(&self) -> u16 {
        match self {
            SignatureScheme::RSA_PKCS1_MD5_SHA1 => 0x0000,
            SignatureScheme::RSA_PKCS1_SHA1 => 0x0201,
            SignatureScheme::DSA_SHA1 => 0x0202,
            SignatureScheme::ECDSA_SHA1 => 0x0203,
            SignatureScheme::RSA_PKCS1_SHA224 => 0x0301,
            SignatureScheme::DSA_SHA224 => 0x0302,
            SignatureScheme::ECDSA_SHA224 => 0x0303,
            SignatureScheme::RSA_PKCS1_SHA256 => 0x0401,
            SignatureScheme::DSA_SHA256 => 0x0402,
            SignatureScheme::ECDSA_SECP256R1_SHA256 => 0x0403,
            SignatureScheme::RSA_PKCS1_SHA384 => 0x0501,
            SignatureScheme::ECDSA_SECP384R1_SHA384 => 0x0503,
            SignatureScheme::RSA_PKCS1_SHA512 => 0x0601,
            SignatureScheme::ECDSA_SECP521R1_SHA512 => 0x0603,
            SignatureScheme::RSA_PSS_RSAE_SHA256 => 0x0804,
            SignatureScheme::RSA_PSS_RSAE_SHA384 => 0x0805,
            SignatureScheme::RSA_PSS_RSAE_SHA512 => 0x0806,
            SignatureScheme::ED25519 => 0x0807,
            SignatureScheme::ED448 => 0x0808,
            SignatureScheme::RSA_PSS_PSS_SHA256 => 0x0809,
            SignatureScheme::RSA_PSS_PSS_SHA384 => 0x080a,
            SignatureScheme::RSA_PSS_PSS_SHA512 => 0x080b,
            SignatureScheme::Unknown(value) => *value,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], SignatureScheme> {
        let (input, value) = be_u16(input)?;
        Ok((input, SignatureScheme::from_u16(value)))
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        use SignatureScheme::*;
        match self {
            RSA_PKCS1_MD5_SHA1 => HashAlgorithm::MD5_SHA1,
            RSA_PKCS1_SHA1 | DSA_SHA1 | ECDSA_SHA1 => HashAlgorithm::SHA1,
            RSA_PKCS1_SHA224 | DSA_SHA224 | ECDSA_SHA224 => HashAlgorithm::SHA224,
            RSA_PKCS1_SHA256 | DSA_SHA256 | ECDSA_SECP256R1_SHA256 | RSA_PSS_RSAE_SHA256
            | RSA_PSS_PSS_SHA256 => HashAlgorithm::SHA256,
            RSA_PKCS1_SHA384 | ECDSA_SECP384R1_SHA384 | RSA_PSS_RSAE_SHA384
            | RSA_PSS_PSS_SHA384 => HashAlgorithm::SHA384,
            RSA_PKCS1_SHA512 | ECDSA_SECP521R1_SHA512 | RSA_PSS_RSAE_SHA512
            | RSA_PSS_PSS_SHA512 => HashAlgorithm::SHA512,
            ED25519 | ED448 => HashAlgorithm::Intrinsic,
            Unknown(v) => HashAlgorithm::Unknown((v >> 8) as u8),
        }
    }

    /// Public key algorithm of a certificate able to verify this scheme.
    pub fn pk_algorithm(&self) -> Option<PkAlgorithm> {
        use SignatureScheme::*;
        match self {
            RSA_PKCS1_MD5_SHA1 | RSA_PKCS1_SHA1 | RSA_PKCS1_SHA224 | RSA_PKCS1_SHA256
            | RSA_PKCS1_SHA384 | RSA_PKCS1_SHA512 | RSA_PSS_RSAE_SHA256 | RSA_PSS_RSAE_SHA384
            | RSA_PSS_RSAE_SHA512 => Some(PkAlgorithm::Rsa),
            RSA_PSS_PSS_SHA256 | RSA_PSS_PSS_SHA384 | RSA_PSS_PSS_SHA512 => {
                Some(PkAlgorithm::RsaPss)
            }
            DSA_SHA1 | DSA_SHA224 | DSA_SHA256 => Some(PkAlgorithm::Dsa),
            ECDSA_SHA1 | ECDSA_SHA224 | ECDSA_SECP256R1_SHA256 | ECDSA_SECP384R1_SHA384
            | ECDSA_SECP521R1_SHA512 => Some(PkAlgorithm::Ecdsa),
            ED25519 => Some(PkAlgorithm::Ed25519),
            ED448 => Some(PkAlgorithm::Ed448),
            Unknown(_) => None,
        }
    }

    pub fn is_rsa_pss(&self) -> bool {
        use SignatureScheme::*;
        matches!(
            self,
            RSA_PSS_RSAE_SHA256
                | RSA_PSS_RSAE_SHA384
                | RSA_PSS_RSAE_SHA512
                | RSA_PSS_PSS_SHA256
                | RSA_PSS_PSS_SHA384
                | RSA_PSS_PSS_SHA512
        )
    }

    pub fn is_pkcs1(&self) -> bool {
        use SignatureScheme::*;
        matches!(
            self,
            RSA_PKCS1_MD5_SHA1
                | RSA_PKCS1_SHA1
                | RSA_PKCS1_SHA224
                | RSA_PKCS1_SHA256
                | RSA_PKCS1_SHA384
                | RSA_PKCS1_SHA512
        )
    }

    /// Curve an ECDSA scheme is bound to under TLS 1.3.
    pub fn tls13_curve(&self) -> Option<NamedGroup> {
        match self {
            SignatureScheme::ECDSA_SECP256R1_SHA256 => Some(NamedGroup::Secp256r1),
            SignatureScheme::ECDSA_SECP384R1_SHA384 => Some(NamedGroup::Secp384r1),
            SignatureScheme::ECDSA_SECP521R1_SHA512 => Some(NamedGroup::Secp521r1),
            _ => None,
        }
    }

    /// TLS 1.3 forbids PKCS#1 v1.5, DSA, SHA-1 and SHA-224 in handshake signatures.
    pub fn allowed_in_tls13(&self) -> bool {
        if self.is_pkcs1() {
            return false;
        }
        if matches!(self.pk_algorithm(), Some(PkAlgorithm::Dsa) | None) {
            return false;
        }
        !matches!(
            self.hash_algorithm(),
            HashAlgorithm::SHA1 | HashAlgorithm::SHA224 | HashAlgorithm::MD5 | HashAlgorithm::MD5_SHA1
        )
    }
}
