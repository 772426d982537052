use der::asn1::BitString;
use der::{Decode, Encode};
use spki::ObjectIdentifier;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::Certificate as X509Certificate;

use crate::crypto::PublicKey;
use crate::message::PkAlgorithm;
use crate::Error;

const OID_KEY_USAGE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.15");
const OID_SUBJECT_ALT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.17");

bitflags::bitflags! {
    /// The key usage bits this crate cares about (RFC 5280 4.2.1.3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeyUsage: u8 {
        const DIGITAL_SIGNATURE = 0x80;
        const KEY_ENCIPHERMENT = 0x20;
    }
}

/// A parsed X.509 certificate.
///
/// Only what selection needs is extracted. Path validation is done
/// elsewhere.
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    issuer: Vec<u8>,
    subject: Vec<u8>,
    public_key: PublicKey,
    key_usage: Option<KeyUsage>,
    dns_names: Vec<String>,
}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let cert = X509Certificate::from_der(der)
            .map_err(|e| Error::CertificateError(format!("Failed to parse certificate: {e}")))?;
        let tbs = &cert.tbs_certificate;

        let issuer = tbs
            .issuer
            .to_der()
            .map_err(|e| Error::CertificateError(format!("issuer encoding: {e}")))?;
        let subject = tbs
            .subject
            .to_der()
            .map_err(|e| Error::CertificateError(format!("subject encoding: {e}")))?;
        let public_key = PublicKey::from_spki(&tbs.subject_public_key_info)?;

        let mut key_usage = None;
        let mut dns_names = Vec::new();
        for ext in tbs.extensions.iter().flatten() {
            if ext.extn_id == OID_KEY_USAGE {
                let bits = BitString::from_der(ext.extn_value.as_bytes())
                    .map_err(|_| Error::CertificateError("Invalid key usage".to_string()))?;
                let first = bits.raw_bytes().first().copied().unwrap_or(0);
                key_usage = Some(KeyUsage::from_bits_truncate(first));
            } else if ext.extn_id == OID_SUBJECT_ALT_NAME {
                let san = SubjectAltName::from_der(ext.extn_value.as_bytes())
                    .map_err(|_| Error::CertificateError("Invalid subjectAltName".to_string()))?;
                for name in san.0 {
                    if let GeneralName::DnsName(dns) = name {
                        dns_names.push(dns.to_string());
                    }
                }
            }
        }

        Ok(Certificate {
            der: der.to_vec(),
            issuer,
            subject,
            public_key,
            key_usage,
            dns_names,
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// DER encoded issuer name, compared byte for byte with CA lists.
    pub fn issuer(&self) -> &[u8] {
        &self.issuer
    }

    pub fn subject(&self) -> &[u8] {
        &self.subject
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn pk_algorithm(&self) -> PkAlgorithm {
        self.public_key.pk_algorithm()
    }

    /// DNS names from the subjectAltName extension.
    pub fn dns_names(&self) -> &[String] {
        &self.dns_names
    }

    /// Whether the key usage extension permits `usage`. Certificates
    /// without the extension permit everything.
    pub fn allows(&self, usage: KeyUsage) -> bool {
        match self.key_usage {
            Some(ku) => ku.contains(usage),
            None => true,
        }
    }
}
