//! Signature scheme selection, and signing and verification of key
//! exchange parameters.

use super::Certificate;
use crate::buffer::Buf;
use crate::crypto::{compatible, PrivateKey, PublicKey};
use crate::message::{DigitallySigned, PkAlgorithm, ProtocolVersion, SignatureScheme};
use crate::{Config, Error};

/// Scheme a version without signature_algorithms implies for a key.
fn legacy_scheme(pk: PkAlgorithm) -> Option<SignatureScheme> {
    match pk {
        PkAlgorithm::Rsa => Some(SignatureScheme::RSA_PKCS1_MD5_SHA1),
        PkAlgorithm::Ecdsa => Some(SignatureScheme::ECDSA_SHA1),
        PkAlgorithm::Dsa => Some(SignatureScheme::DSA_SHA1),
        _ => None,
    }
}

/// Scheme assumed when a TLS 1.2 peer sent no signature_algorithms
/// (RFC 5246 7.4.1.4.1).
fn default_scheme(pk: PkAlgorithm) -> Option<SignatureScheme> {
    match pk {
        PkAlgorithm::Rsa => Some(SignatureScheme::RSA_PKCS1_SHA1),
        PkAlgorithm::Ecdsa => Some(SignatureScheme::ECDSA_SHA1),
        PkAlgorithm::Dsa => Some(SignatureScheme::DSA_SHA1),
        _ => None,
    }
}

/// Whether `scheme` can be used with `certificate` and `key` under
/// `version`.
pub fn scheme_usable(
    scheme: SignatureScheme,
    certificate: &Certificate,
    key: &dyn PrivateKey,
    version: ProtocolVersion,
    config: &Config,
) -> bool {
    let Some(scheme_pk) = scheme.pk_algorithm() else {
        return false;
    };
    if !compatible(scheme_pk, certificate.pk_algorithm()) {
        return false;
    }
    if !key.supports_scheme(scheme) {
        return false;
    }
    if !config.signature_schemes().contains(&scheme) {
        return false;
    }
    if version.is_tls13() {
        if !scheme.allowed_in_tls13() {
            return false;
        }
        if let Some(curve) = scheme.tls13_curve() {
            if certificate.public_key().curve() != Some(curve) {
                return false;
            }
        }
    }
    true
}

/// Pick the scheme to sign with, in the peer's order of preference.
pub fn compute_signature_algorithm(
    certificate: &Certificate,
    key: &dyn PrivateKey,
    version: ProtocolVersion,
    config: &Config,
    peer_schemes: &[SignatureScheme],
) -> Result<SignatureScheme, Error> {
    let pk = certificate.pk_algorithm();

    if !version.has_selectable_sighash() {
        let scheme = legacy_scheme(pk).ok_or(Error::IncompatibleSigWithKey)?;
        trace!("Legacy signature {:?} for {:?} under {}", scheme, pk, version);
        return Ok(scheme);
    }

    if peer_schemes.is_empty() && !version.is_tls13() {
        let scheme = default_scheme(pk)
            .filter(|s| key.supports_scheme(*s))
            .ok_or(Error::IncompatibleSigWithKey)?;
        debug!("Peer sent no signature algorithms, using {:?}", scheme);
        return Ok(scheme);
    }

    for scheme in peer_schemes {
        if scheme_usable(*scheme, certificate, key, version, config) {
            debug!("Selected signature scheme {:?}", scheme);
            return Ok(*scheme);
        }
        trace!("Signature scheme {:?} unusable with {:?} key", scheme, pk);
    }

    Err(Error::IncompatibleSigWithKey)
}

fn signed_data(client_random: &[u8; 32], server_random: &[u8; 32], params: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(64 + params.len());
    data.extend_from_slice(client_random);
    data.extend_from_slice(server_random);
    data.extend_from_slice(params);
    data
}

/// Sign ServerKeyExchange params and write the `digitally-signed` struct.
pub fn sign_params(
    key: &dyn PrivateKey,
    scheme: SignatureScheme,
    version: ProtocolVersion,
    client_random: &[u8; 32],
    server_random: &[u8; 32],
    params: &[u8],
    out: &mut Buf,
) -> Result<(), Error> {
    let data = signed_data(client_random, server_random, params);
    let signature = key.sign(scheme, &data)?;
    let algorithm = version.has_selectable_sighash().then_some(scheme);
    DigitallySigned::new(algorithm, &signature).serialize(out)
}

/// Verify the `digitally-signed` struct after ServerKeyExchange params.
///
/// `advertised` is what we sent in signature_algorithms. Returns the scheme
/// and the input after the signature.
#[allow(clippy::too_many_arguments)]
pub fn verify_params<'a>(
    public_key: &PublicKey,
    version: ProtocolVersion,
    config: &Config,
    advertised: &[SignatureScheme],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
    params: &[u8],
    input: &'a [u8],
) -> Result<(SignatureScheme, &'a [u8]), Error> {
    let (rest, signed) = DigitallySigned::parse(input, version.has_selectable_sighash())?;

    let scheme = match signed.algorithm {
        Some(scheme) => {
            let known = scheme.pk_algorithm().is_some();
            if !known || !config.signature_schemes().contains(&scheme) {
                debug!("Peer signed with disabled scheme {:?}", scheme);
                return Err(Error::UnsupportedSignatureAlgorithm(scheme.as_u16()));
            }
            if !advertised.contains(&scheme) {
                debug!("Peer signed with scheme we did not offer: {:?}", scheme);
                return Err(Error::UnsupportedSignatureAlgorithm(scheme.as_u16()));
            }
            scheme
        }
        None => legacy_scheme(public_key.pk_algorithm()).ok_or(Error::IncompatibleSigWithKey)?,
    };

    let data = signed_data(client_random, server_random, params);
    public_key.verify(scheme, &data, signed.signature)?;
    trace!("Verified params signature with {:?}", scheme);
    Ok((scheme, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::EcdsaKey;
    use p256::ecdsa::{SigningKey, VerifyingKey};
    use rand::rngs::OsRng;

    #[test]
    fn legacy_versions_use_fixed_rule() {
        assert_eq!(
            legacy_scheme(PkAlgorithm::Rsa),
            Some(SignatureScheme::RSA_PKCS1_MD5_SHA1)
        );
        assert_eq!(legacy_scheme(PkAlgorithm::Ecdsa), Some(SignatureScheme::ECDSA_SHA1));
        assert_eq!(legacy_scheme(PkAlgorithm::Ed25519), None);
    }

    #[test]
    fn sign_then_verify_params() {
        let signing = SigningKey::random(&mut OsRng);
        let public = PublicKey::P256(VerifyingKey::from(&signing));
        let key = EcdsaKey::P256(signing);
        let config = Config::builder().build().unwrap();

        let cr = [1; 32];
        let sr = [2; 32];
        let params = [0x03, 0x00, 0x17, 0x01, 0x04];
        let scheme = SignatureScheme::ECDSA_SECP256R1_SHA256;

        let mut out = Buf::new();
        sign_params(&key, scheme, ProtocolVersion::TLS1_2, &cr, &sr, &params, &mut out).unwrap();
        out.push(0xEE);

        let advertised = config.signature_schemes().to_vec();
        let (got, rest) = verify_params(
            &public,
            ProtocolVersion::TLS1_2,
            &config,
            &advertised,
            &cr,
            &sr,
            &params,
            &out,
        )
        .unwrap();
        assert_eq!(got, scheme);
        assert_eq!(rest, &[0xEE]);

        // Other randoms, other signed data.
        let err = verify_params(
            &public,
            ProtocolVersion::TLS1_2,
            &config,
            &advertised,
            &[9; 32],
            &sr,
            &params,
            &out,
        );
        assert_eq!(err, Err(Error::DecryptError));
    }

    #[test]
    fn scheme_not_advertised() {
        let signing = SigningKey::random(&mut OsRng);
        let public = PublicKey::P256(VerifyingKey::from(&signing));
        let key = EcdsaKey::P256(signing);
        let config = Config::builder().build().unwrap();

        let mut out = Buf::new();
        let scheme = SignatureScheme::ECDSA_SECP256R1_SHA256;
        sign_params(&key, scheme, ProtocolVersion::TLS1_2, &[0; 32], &[0; 32], &[], &mut out)
            .unwrap();

        let err = verify_params(
            &public,
            ProtocolVersion::TLS1_2,
            &config,
            &[SignatureScheme::RSA_PSS_RSAE_SHA256],
            &[0; 32],
            &[0; 32],
            &[],
            &out,
        );
        assert_eq!(err, Err(Error::UnsupportedSignatureAlgorithm(0x0403)));
    }
}
