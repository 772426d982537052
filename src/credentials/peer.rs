use tinyvec::ArrayVec;

use crate::buffer::Buf;
use crate::message::{
    CertificateRequest, ClientCertificateType, DistinguishedName, NamedGroup, PkAlgorithm,
    SignatureScheme,
};
use crate::{Config, Error};

/// What the peer told us it can handle.
///
/// Filled by the extension handlers and by a received CertificateRequest.
/// Lists keep the peer's order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerCapabilities {
    pub signature_schemes: Vec<SignatureScheme>,
    pub groups: Vec<NamedGroup>,
    pub cert_types: Vec<ClientCertificateType>,
    /// DER encoded distinguished names of acceptable CAs.
    pub ca_names: Vec<Vec<u8>>,
    /// The server asked for a client certificate.
    pub cert_request: bool,
}

impl PeerCapabilities {
    /// Capabilities from a TLS 1.2 or earlier CertificateRequest.
    ///
    /// At least one certificate type must map to a known algorithm.
    pub fn from_certificate_request(request: &CertificateRequest<'_>) -> Result<Self, Error> {
        let cert_types: Vec<ClientCertificateType> =
            request.certificate_types.iter().copied().collect();
        if !cert_types.iter().any(|t| t.pk_algorithm().is_some()) {
            debug!("No known certificate type in {:?}", cert_types);
            return Err(Error::UnknownPkAlgorithm);
        }

        let signature_schemes = request
            .supported_signature_algorithms
            .as_ref()
            .map(|algs| algs.iter().copied().collect())
            .unwrap_or_default();

        let ca_names = request
            .certificate_authorities
            .iter()
            .map(|dn| dn.0.to_vec())
            .collect();

        Ok(PeerCapabilities {
            signature_schemes,
            groups: Vec::new(),
            cert_types,
            ca_names,
            cert_request: true,
        })
    }

    /// Public key algorithms the peer accepts client certificates for.
    ///
    /// Without certificate types (TLS 1.3) this is derived from the
    /// signature schemes.
    pub fn pk_algorithms(&self) -> Vec<PkAlgorithm> {
        let mut algs: Vec<PkAlgorithm> = Vec::new();
        let from_types = self.cert_types.iter().filter_map(|t| t.pk_algorithm());
        let from_schemes = self.signature_schemes.iter().filter_map(|s| s.pk_algorithm());

        let source: Box<dyn Iterator<Item = PkAlgorithm>> = if self.cert_types.is_empty() {
            Box::new(from_schemes)
        } else {
            Box::new(from_types)
        };
        for alg in source {
            if !algs.contains(&alg) {
                algs.push(alg);
            }
        }
        // An RSA_SIGN certificate type covers PSS restricted keys too.
        if algs.contains(&PkAlgorithm::Rsa) && !algs.contains(&PkAlgorithm::RsaPss) {
            algs.push(PkAlgorithm::RsaPss);
        }
        algs
    }
}

/// Write a TLS 1.2 or earlier CertificateRequest from local policy.
///
/// The certificate types follow the enabled signature schemes.
/// `with_signature_algorithms` is false before TLS 1.2.
pub fn certificate_request(
    config: &Config,
    ca_names: &[Vec<u8>],
    with_signature_algorithms: bool,
    out: &mut Buf,
) -> Result<(), Error> {
    let mut types: ArrayVec<[ClientCertificateType; 8]> = ArrayVec::new();
    for scheme in config.signature_schemes() {
        let Some(ct) = scheme
            .pk_algorithm()
            .and_then(ClientCertificateType::for_pk_algorithm)
        else {
            continue;
        };
        if !types.contains(&ct) && types.len() < types.capacity() {
            types.push(ct);
        }
    }
    if types.is_empty() {
        return Err(Error::Config("no signature scheme maps to a certificate type"));
    }

    let schemes = if with_signature_algorithms {
        let mut algs: ArrayVec<[SignatureScheme; 64]> = ArrayVec::new();
        for scheme in config.signature_schemes() {
            if *scheme == SignatureScheme::RSA_PKCS1_MD5_SHA1 || algs.len() == algs.capacity() {
                continue;
            }
            algs.push(*scheme);
        }
        Some(algs)
    } else {
        None
    };

    let authorities = ca_names.iter().map(|n| DistinguishedName(n.as_slice())).collect();
    CertificateRequest::new(types, schemes, authorities).serialize(out)
}
