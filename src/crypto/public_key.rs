use der::{Decode, Encode};
use p256::ecdsa::{Signature as P256Signature, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{Signature as P384Signature, VerifyingKey as P384VerifyingKey};
use pkcs8::DecodePublicKey;
use rand::rngs::OsRng;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use signature::hazmat::PrehashVerifier;
use spki::ObjectIdentifier;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use super::digest;
use super::signing::{pkcs1_padding, pss_padding};
use crate::message::{NamedGroup, PkAlgorithm, SignatureScheme};
use crate::Error;

const OID_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_RSASSA_PSS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.10");
const OID_EC_PUBLIC_KEY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const OID_DSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.1");
const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
const OID_ED448: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.113");
const OID_P256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const OID_P384: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const OID_P521: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

/// Public key of a certificate, used to verify signatures and to encrypt
/// RSA premasters.
#[derive(Debug, Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    RsaPss(RsaPublicKey),
    P256(P256VerifyingKey),
    P384(P384VerifyingKey),
    /// Recognised algorithm without a verifier in this crate.
    Other(PkAlgorithm, Option<NamedGroup>),
}

impl PublicKey {
    /// Decode a SubjectPublicKeyInfo.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self, Error> {
        let oid = spki.algorithm.oid;

        if oid == OID_RSA_ENCRYPTION || oid == OID_RSASSA_PSS {
            let der = spki
                .to_der()
                .map_err(|e| Error::CertificateError(format!("SPKI encoding: {e}")))?;
            let key = RsaPublicKey::from_public_key_der(&der)
                .or_else(|_| {
                    // id-RSASSA-PSS keys carry the plain PKCS#1 key in the bit string
                    let bits = spki.subject_public_key.as_bytes().unwrap_or_default();
                    <RsaPublicKey as rsa::pkcs1::DecodeRsaPublicKey>::from_pkcs1_der(bits)
                })
                .map_err(|_| Error::CertificateError("Invalid RSA public key".to_string()))?;
            return Ok(if oid == OID_RSASSA_PSS {
                PublicKey::RsaPss(key)
            } else {
                PublicKey::Rsa(key)
            });
        }

        if oid == OID_EC_PUBLIC_KEY {
            let pubkey_bytes = spki.subject_public_key.as_bytes().ok_or_else(|| {
                Error::CertificateError("Invalid EC subject_public_key bitstring".to_string())
            })?;
            let curve_oid: ObjectIdentifier = spki
                .algorithm
                .parameters
                .as_ref()
                .ok_or_else(|| Error::CertificateError("Missing EC curve parameter".to_string()))?
                .decode_as()
                .map_err(|_| Error::CertificateError("Invalid EC curve parameter".to_string()))?;

            return match curve_oid {
                OID_P256 => P256VerifyingKey::from_sec1_bytes(pubkey_bytes)
                    .map(PublicKey::P256)
                    .map_err(|_| Error::CertificateError("Invalid P-256 public key".to_string())),
                OID_P384 => P384VerifyingKey::from_sec1_bytes(pubkey_bytes)
                    .map(PublicKey::P384)
                    .map_err(|_| Error::CertificateError("Invalid P-384 public key".to_string())),
                OID_P521 => Ok(PublicKey::Other(
                    PkAlgorithm::Ecdsa,
                    Some(NamedGroup::Secp521r1),
                )),
                _ => Ok(PublicKey::Other(PkAlgorithm::Ecdsa, None)),
            };
        }

        if oid == OID_DSA {
            return Ok(PublicKey::Other(PkAlgorithm::Dsa, None));
        }
        if oid == OID_ED25519 {
            return Ok(PublicKey::Other(PkAlgorithm::Ed25519, None));
        }
        if oid == OID_ED448 {
            return Ok(PublicKey::Other(PkAlgorithm::Ed448, None));
        }

        Err(Error::UnknownPkAlgorithm)
    }

    /// Decode a DER SubjectPublicKeyInfo.
    pub fn from_spki_der(der: &[u8]) -> Result<Self, Error> {
        let spki = SubjectPublicKeyInfoOwned::from_der(der)
            .map_err(|e| Error::CertificateError(format!("SPKI decoding: {e}")))?;
        Self::from_spki(&spki)
    }

    pub fn pk_algorithm(&self) -> PkAlgorithm {
        match self {
            PublicKey::Rsa(_) => PkAlgorithm::Rsa,
            PublicKey::RsaPss(_) => PkAlgorithm::RsaPss,
            PublicKey::P256(_) | PublicKey::P384(_) => PkAlgorithm::Ecdsa,
            PublicKey::Other(alg, _) => *alg,
        }
    }

    pub fn curve(&self) -> Option<NamedGroup> {
        match self {
            PublicKey::P256(_) => Some(NamedGroup::Secp256r1),
            PublicKey::P384(_) => Some(NamedGroup::Secp384r1),
            PublicKey::Other(_, curve) => *curve,
            _ => None,
        }
    }

    /// Verify `signature` over `data` made with `scheme`.
    ///
    /// A signature that does not verify is `Error::DecryptError`.
    pub fn verify(
        &self,
        scheme: SignatureScheme,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Error> {
        if scheme.pk_algorithm().map(|a| compatible(a, self.pk_algorithm())) != Some(true) {
            return Err(Error::IncompatibleSigWithKey);
        }
        let hashed = digest(scheme.hash_algorithm(), data)?;

        match self {
            PublicKey::Rsa(key) | PublicKey::RsaPss(key) => {
                let res = if scheme.is_rsa_pss() {
                    key.verify(pss_padding(scheme.hash_algorithm())?, &hashed, signature)
                } else {
                    key.verify(pkcs1_padding(scheme.hash_algorithm())?, &hashed, signature)
                };
                res.map_err(|_| Error::DecryptError)
            }
            PublicKey::P256(key) => {
                let sig = P256Signature::from_der(signature).map_err(|_| Error::DecryptError)?;
                key.verify_prehash(&hashed, &sig)
                    .map_err(|_| Error::DecryptError)
            }
            PublicKey::P384(key) => {
                let sig = P384Signature::from_der(signature).map_err(|_| Error::DecryptError)?;
                key.verify_prehash(&hashed, &sig)
                    .map_err(|_| Error::DecryptError)
            }
            PublicKey::Other(_, _) => Err(Error::UnsupportedSignatureAlgorithm(scheme.as_u16())),
        }
    }

    /// PKCS#1 v1.5 encrypt `data`, RSA keys only.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        match self {
            PublicKey::Rsa(key) => key
                .encrypt(&mut OsRng, Pkcs1v15Encrypt, data)
                .map_err(|e| Error::CryptoError(format!("RSA encryption failed: {e}"))),
            _ => Err(Error::IncompatibleSigWithKey),
        }
    }
}

/// Whether a scheme for `scheme_alg` can be verified by a key of `key_alg`.
///
/// rsaEncryption keys do PKCS#1 and PSS-RSAE, id-RSASSA-PSS keys only PSS-PSS.
pub(crate) fn compatible(scheme_alg: PkAlgorithm, key_alg: PkAlgorithm) -> bool {
    scheme_alg == key_alg
}
