//! Private keys that can sign handshake data and decrypt RSA premasters.

use std::fmt;
use std::str;
use std::sync::Arc;

use p256::ecdsa::{DerSignature as P256DerSignature, SigningKey as P256SigningKey};
use p384::ecdsa::{DerSignature as P384DerSignature, SigningKey as P384SigningKey};
use pkcs8::DecodePrivateKey;
use rand::rngs::OsRng;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use signature::hazmat::PrehashSigner;
use zeroize::Zeroizing;

use super::digest;
use crate::message::{HashAlgorithm, NamedGroup, PkAlgorithm, SignatureScheme};
use crate::Error;

/// A private key held by a credential.
///
/// Implementations outside this crate can wrap hardware tokens or remote
/// signers. Only [`PrivateKey::sign`] is mandatory for signing key
/// exchanges, [`PrivateKey::decrypt`] is only used by RSA key transport.
pub trait PrivateKey: Send + Sync + fmt::Debug {
    /// Algorithm of the key.
    fn pk_algorithm(&self) -> PkAlgorithm;

    /// Curve of an EC key.
    fn curve(&self) -> Option<NamedGroup> {
        None
    }

    /// Whether [`PrivateKey::sign`] can produce `scheme`.
    fn supports_scheme(&self, scheme: SignatureScheme) -> bool;

    /// Sign `data`, hashing it as `scheme` requires.
    fn sign(&self, scheme: SignatureScheme, data: &[u8]) -> Result<Vec<u8>, Error>;

    /// Decrypt a PKCS#1 v1.5 encrypted block.
    fn decrypt(&self, _ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
        Err(Error::CryptoError("key cannot decrypt".to_string()))
    }
}

pub(crate) fn pkcs1_padding(hash: HashAlgorithm) -> Result<Pkcs1v15Sign, Error> {
    let padding = match hash {
        HashAlgorithm::MD5_SHA1 => Pkcs1v15Sign::new_unprefixed(),
        HashAlgorithm::SHA1 => Pkcs1v15Sign::new::<Sha1>(),
        HashAlgorithm::SHA224 => Pkcs1v15Sign::new::<Sha224>(),
        HashAlgorithm::SHA256 => Pkcs1v15Sign::new::<Sha256>(),
        HashAlgorithm::SHA384 => Pkcs1v15Sign::new::<Sha384>(),
        HashAlgorithm::SHA512 => Pkcs1v15Sign::new::<Sha512>(),
        _ => return Err(Error::CryptoError(format!("No PKCS#1 padding for {:?}", hash))),
    };
    Ok(padding)
}

pub(crate) fn pss_padding(hash: HashAlgorithm) -> Result<Pss, Error> {
    let padding = match hash {
        HashAlgorithm::SHA256 => Pss::new::<Sha256>(),
        HashAlgorithm::SHA384 => Pss::new::<Sha384>(),
        HashAlgorithm::SHA512 => Pss::new::<Sha512>(),
        _ => return Err(Error::CryptoError(format!("No PSS padding for {:?}", hash))),
    };
    Ok(padding)
}

/// RSA private key.
pub struct RsaKey {
    key: RsaPrivateKey,
    pss_only: bool,
}

impl RsaKey {
    pub fn new(key: RsaPrivateKey) -> Self {
        RsaKey {
            key,
            pss_only: false,
        }
    }

    /// A key bound to RSASSA-PSS by its certificate.
    pub fn new_pss(key: RsaPrivateKey) -> Self {
        RsaKey {
            key,
            pss_only: true,
        }
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.key.to_public_key()
    }
}

impl fmt::Debug for RsaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKey")
            .field("pss_only", &self.pss_only)
            .finish_non_exhaustive()
    }
}

impl PrivateKey for RsaKey {
    fn pk_algorithm(&self) -> PkAlgorithm {
        if self.pss_only {
            PkAlgorithm::RsaPss
        } else {
            PkAlgorithm::Rsa
        }
    }

    fn supports_scheme(&self, scheme: SignatureScheme) -> bool {
        if scheme.is_rsa_pss() {
            return matches!(
                scheme.hash_algorithm(),
                HashAlgorithm::SHA256 | HashAlgorithm::SHA384 | HashAlgorithm::SHA512
            );
        }
        !self.pss_only && scheme.is_pkcs1()
    }

    fn sign(&self, scheme: SignatureScheme, data: &[u8]) -> Result<Vec<u8>, Error> {
        if !self.supports_scheme(scheme) {
            return Err(Error::IncompatibleSigWithKey);
        }
        let hashed = digest(scheme.hash_algorithm(), data)?;
        let signed = if scheme.is_rsa_pss() {
            let padding = pss_padding(scheme.hash_algorithm())?;
            self.key.sign_with_rng(&mut OsRng, padding, &hashed)
        } else {
            let padding = pkcs1_padding(scheme.hash_algorithm())?;
            self.key.sign_with_rng(&mut OsRng, padding, &hashed)
        };
        signed.map_err(|e| Error::CryptoError(format!("RSA signing failed: {e}")))
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
        self.key
            .decrypt_blinded(&mut OsRng, Pkcs1v15Encrypt, ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| Error::DecryptError)
    }
}

/// ECDSA signing key implementation.
pub enum EcdsaKey {
    P256(P256SigningKey),
    P384(P384SigningKey),
}

impl fmt::Debug for EcdsaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcdsaKey::P256(_) => f.debug_tuple("EcdsaKey::P256").finish(),
            EcdsaKey::P384(_) => f.debug_tuple("EcdsaKey::P384").finish(),
        }
    }
}

impl PrivateKey for EcdsaKey {
    fn pk_algorithm(&self) -> PkAlgorithm {
        PkAlgorithm::Ecdsa
    }

    fn curve(&self) -> Option<NamedGroup> {
        match self {
            EcdsaKey::P256(_) => Some(NamedGroup::Secp256r1),
            EcdsaKey::P384(_) => Some(NamedGroup::Secp384r1),
        }
    }

    fn supports_scheme(&self, scheme: SignatureScheme) -> bool {
        if scheme.pk_algorithm() != Some(PkAlgorithm::Ecdsa) {
            return false;
        }
        // The prehash must be at least half the field size.
        match (self, scheme.hash_algorithm()) {
            (EcdsaKey::P384(_), HashAlgorithm::SHA1) => false,
            (_, HashAlgorithm::SHA1)
            | (_, HashAlgorithm::SHA224)
            | (_, HashAlgorithm::SHA256)
            | (_, HashAlgorithm::SHA384)
            | (_, HashAlgorithm::SHA512) => true,
            _ => false,
        }
    }

    fn sign(&self, scheme: SignatureScheme, data: &[u8]) -> Result<Vec<u8>, Error> {
        if !self.supports_scheme(scheme) {
            return Err(Error::IncompatibleSigWithKey);
        }
        let hashed = digest(scheme.hash_algorithm(), data)?;
        match self {
            EcdsaKey::P256(key) => {
                let signature: p256::ecdsa::Signature = key
                    .sign_prehash(&hashed)
                    .map_err(|_| Error::CryptoError("Signing failed".to_string()))?;
                let der: P256DerSignature = signature.to_der();
                Ok(der.as_bytes().to_vec())
            }
            EcdsaKey::P384(key) => {
                let signature: p384::ecdsa::Signature = key
                    .sign_prehash(&hashed)
                    .map_err(|_| Error::CryptoError("Signing failed".to_string()))?;
                let der: P384DerSignature = signature.to_der();
                Ok(der.as_bytes().to_vec())
            }
        }
    }
}

/// Load a PKCS#8 private key, DER or PEM encoded.
pub fn load_private_key(key_der: &[u8]) -> Result<Arc<dyn PrivateKey>, Error> {
    if let Ok(key) = P256SigningKey::from_pkcs8_der(key_der) {
        return Ok(Arc::new(EcdsaKey::P256(key)));
    }
    if let Ok(key) = P384SigningKey::from_pkcs8_der(key_der) {
        return Ok(Arc::new(EcdsaKey::P384(key)));
    }
    if let Ok(key) = RsaPrivateKey::from_pkcs8_der(key_der) {
        return Ok(Arc::new(RsaKey::new(key)));
    }

    // Check if it's a PEM encoded key
    if let Ok(pem_str) = str::from_utf8(key_der) {
        if pem_str.contains("-----BEGIN") {
            if let Ok((_label, doc)) = pkcs8::Document::from_pem(pem_str) {
                return load_private_key(doc.as_bytes());
            }
        }
    }

    Err(Error::CryptoError(
        "Failed to parse private key in any supported format".to_string(),
    ))
}
