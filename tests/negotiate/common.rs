//! Shared helpers for negotiation integration tests.

#![allow(unused)]

use std::sync::Arc;

use once_cell::sync::Lazy;
use rcgen::{BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa};
use rsa::pkcs8::EncodePrivateKey;
use tlsnego::credentials::{Certificate, Credential};
use tlsnego::ext::{MessageKind, Registry};
use tlsnego::message::{CipherSuite, ProtocolFamily, ProtocolVersion, Role};
use tlsnego::{Buf, Config, Error, Session};

pub fn config() -> Arc<Config> {
    Arc::new(Config::builder().build().unwrap())
}

pub fn tls12_config() -> Config {
    Config::builder()
        .versions(&[ProtocolVersion::TLS1_2])
        .build()
        .unwrap()
}

pub fn session(role: Role, config: Arc<Config>) -> Session {
    Session::new(role, ProtocolFamily::Tls, config, Registry::default_shared())
}

pub fn dtls_session(role: Role, config: Arc<Config>) -> Session {
    Session::new(role, ProtocolFamily::Dtls, config, Registry::default_shared())
}

/// Write the extensions of `message` on `from` and process them on `to`.
pub fn exchange(from: &mut Session, to: &mut Session, message: MessageKind) -> Result<(), Error> {
    let mut out = Buf::new();
    from.write_extensions(message, &mut out)?;
    // Strip the block length. An empty block is not written at all.
    let block: &[u8] = if out.is_empty() { &[] } else { &out[2..] };
    to.process_extensions(message, block)
}

/// Pin the version and suite the way a handshake driver would after
/// ServerHello.
pub fn negotiated(session: &mut Session, version: ProtocolVersion, suite: CipherSuite) {
    let params = session.params_mut();
    params.version = Some(version);
    params.cipher_suite = Some(suite);
    params.client_random = [0x11; 32];
    params.server_random = [0x22; 32];
}

fn params(names: &[&str], common_name: &str) -> CertificateParams {
    let mut params =
        CertificateParams::new(names.iter().map(|n| n.to_string()).collect::<Vec<_>>());
    params.alg = &rcgen::PKCS_ECDSA_P256_SHA256;
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, common_name);
    params
}

fn credential(cert: &rcgen::Certificate, der: &[u8]) -> Credential {
    Credential::from_der(&[der], &cert.serialize_private_key_der()).unwrap()
}

/// Self signed ECDSA P-256 credential for `names`.
pub fn ecdsa(names: &[&str]) -> Credential {
    ecdsa_with(params(names, names.first().copied().unwrap_or("test")))
}

pub fn ecdsa_with(params: CertificateParams) -> Credential {
    let cert = rcgen::Certificate::from_params(params).unwrap();
    credential(&cert, &cert.serialize_der().unwrap())
}

pub fn ecdsa_params(names: &[&str]) -> CertificateParams {
    params(names, names.first().copied().unwrap_or("test"))
}

pub struct TestCa {
    pub cert: rcgen::Certificate,
    /// DER encoded subject, as it goes in a CA list.
    pub subject: Vec<u8>,
}

pub fn ca(common_name: &str) -> TestCa {
    let mut params = params(&[], common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let cert = rcgen::Certificate::from_params(params).unwrap();
    let der = cert.serialize_der().unwrap();
    let subject = Certificate::from_der(&der).unwrap().subject().to_vec();
    TestCa { cert, subject }
}

/// ECDSA credential for `name` issued by `ca`.
pub fn issued_by(ca: &TestCa, name: &str) -> Credential {
    let cert = rcgen::Certificate::from_params(params(&[name], name)).unwrap();
    let der = cert.serialize_der_with_signer(&ca.cert).unwrap();
    credential(&cert, &der)
}

static RSA_PKCS8: Lazy<Vec<u8>> = Lazy::new(|| {
    let key = rsa::RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).unwrap();
    key.to_pkcs8_der().unwrap().as_bytes().to_vec()
});

/// Self signed RSA credential for `names`. The key is shared by all
/// callers.
pub fn rsa(names: &[&str]) -> Credential {
    let mut params = params(names, names.first().copied().unwrap_or("test"));
    params.alg = &rcgen::PKCS_RSA_SHA256;
    params.key_pair = Some(rcgen::KeyPair::from_der(&RSA_PKCS8).unwrap());
    let cert = rcgen::Certificate::from_params(params).unwrap();
    let der = cert.serialize_der().unwrap();
    Credential::from_der(&[der.as_slice()], &RSA_PKCS8).unwrap()
}
