use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rcgen::KeyUsagePurpose;
use tlsnego::credentials::{
    certificate_request, require_credential, Certificate, CertificateCallback, Credential,
    CredentialQuery, CredentialSet, OcspCallback, Ownership,
};
use tlsnego::ext::MessageKind;
use tlsnego::message::{
    CertificateRequest, CipherSuite, KeyExchangeAlgorithm, ProtocolVersion, Role, SignatureScheme,
};
use tlsnego::{Buf, Config, Error, Session, SessionFlags};

use crate::common::*;

const ECDHE_ECDSA: CipherSuite = CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256;

/// A server that has processed a TLS 1.2 ClientHello for `host`.
fn server_for(host: Option<&str>, client_config: Config, server_config: Arc<Config>) -> Session {
    let mut client = session(Role::Client, Arc::new(client_config));
    if let Some(host) = host {
        client.set_server_name(host).unwrap();
    }
    let mut server = session(Role::Server, server_config);
    exchange(&mut client, &mut server, MessageKind::ClientHello).unwrap();
    negotiated(&mut server, ProtocolVersion::TLS1_2, ECDHE_ECDSA);
    server
}

fn two_hosts() -> Arc<CredentialSet> {
    CredentialSet::builder()
        .add(ecdsa(&["default.example"]))
        .add(ecdsa(&["a.example"]))
        .build()
}

#[test]
fn server_name_picks_credential() {
    let _ = env_logger::try_init();

    let mut server = server_for(Some("a.example"), tls12_config(), config());
    server.set_credentials(two_hosts());

    let selected = server.select_server_certificate().unwrap();
    assert_eq!(selected.ownership(), Ownership::Borrowed { index: 1 });
    assert_eq!(selected.credential().names(), &["a.example".to_string()]);
    assert_eq!(
        selected.signature_scheme(),
        Some(SignatureScheme::ECDSA_SECP256R1_SHA256)
    );
    assert_eq!(
        server.params().server_signature_scheme,
        Some(SignatureScheme::ECDSA_SECP256R1_SHA256)
    );
}

#[test]
fn without_server_name_first_credential_wins() {
    let mut server = server_for(None, tls12_config(), config());
    server.set_credentials(two_hosts());
    let selected = server.select_server_certificate().unwrap();
    assert_eq!(selected.ownership(), Ownership::Borrowed { index: 0 });
}

#[test]
fn unknown_server_name_falls_back() {
    let mut server = server_for(Some("other.example"), tls12_config(), config());
    server.set_credentials(two_hosts());
    let selected = server.select_server_certificate().unwrap();
    assert_eq!(selected.ownership(), Ownership::Borrowed { index: 0 });
}

#[test]
fn wildcard_name() {
    let mut server = server_for(Some("www.b.example"), tls12_config(), config());
    server.set_credentials(
        CredentialSet::builder()
            .add(ecdsa(&["default.example"]))
            .add(ecdsa(&["*.b.example"]))
            .build(),
    );
    let selected = server.select_server_certificate().unwrap();
    assert_eq!(selected.ownership(), Ownership::Borrowed { index: 1 });
}

#[test]
fn selection_is_kept() {
    let mut server = server_for(Some("a.example"), tls12_config(), config());
    server.set_credentials(two_hosts());

    let first = server.select_server_certificate().unwrap().ownership();
    // Changing the credentials afterwards does not change the answer.
    server.set_credentials(CredentialSet::builder().add(ecdsa(&["x.example"])).build());
    let second = server.select_server_certificate().unwrap().ownership();
    assert_eq!(first, second);
    assert_eq!(second, Ownership::Borrowed { index: 1 });
}

#[test]
fn no_usable_credential() {
    // An ECDSA certificate cannot serve an RSA suite.
    let mut server = server_for(None, tls12_config(), config());
    negotiated(
        &mut server,
        ProtocolVersion::TLS1_2,
        CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    );
    server.set_credentials(two_hosts());
    assert_eq!(
        server.select_server_certificate().map(|_| ()),
        Err(Error::InsufficientCredentials)
    );
}

#[test]
fn peer_schemes_exclude_key() {
    let client_config = Config::builder()
        .versions(&[ProtocolVersion::TLS1_2])
        .signature_schemes(&[SignatureScheme::RSA_PKCS1_SHA256])
        .build()
        .unwrap();
    let mut server = server_for(None, client_config, config());
    server.set_credentials(two_hosts());
    assert_eq!(
        server.select_server_certificate().map(|_| ()),
        Err(Error::InsufficientCredentials)
    );
}

#[test]
fn anonymous_suite_needs_nothing() {
    let kx = KeyExchangeAlgorithm::DhAnon;
    assert_eq!(require_credential(None, kx, Role::Server), Ok(()));
    assert_eq!(
        require_credential(None, KeyExchangeAlgorithm::EcdheEcdsa, Role::Server),
        Err(Error::InsufficientCredentials)
    );
}

#[test]
fn key_usage_is_enforced() {
    let mut params = ecdsa_params(&["a.example"]);
    params.key_usages = vec![KeyUsagePurpose::KeyEncipherment];
    let credentials = CredentialSet::builder().add(ecdsa_with(params)).build();

    let mut server = server_for(None, tls12_config(), config());
    server.set_credentials(credentials.clone());
    assert_eq!(
        server.select_server_certificate().map(|_| ()),
        Err(Error::InsufficientCredentials)
    );

    let lenient = Config::builder()
        .allow_key_usage_violation(true)
        .build()
        .unwrap();
    let mut server = server_for(None, tls12_config(), Arc::new(lenient));
    server.set_credentials(credentials);
    assert!(server.select_server_certificate().is_ok());
}

#[test]
fn ocsp_staple_when_requested() {
    let _ = env_logger::try_init();

    let client_config = Config::builder()
        .versions(&[ProtocolVersion::TLS1_2])
        .request_ocsp(true)
        .build()
        .unwrap();
    let mut client = session(Role::Client, Arc::new(client_config));
    let mut server = session(Role::Server, config());
    exchange(&mut client, &mut server, MessageKind::ClientHello).unwrap();
    assert!(server.params().flags.contains(SessionFlags::OCSP_REQUESTED));

    negotiated(&mut server, ProtocolVersion::TLS1_2, ECDHE_ECDSA);
    server.set_credentials(
        CredentialSet::builder()
            .add(ecdsa(&["a.example"]).with_ocsp(vec![1, 2, 3]))
            .build(),
    );
    let selected = server.select_server_certificate().unwrap();
    assert_eq!(selected.ocsp(), Some(&[1, 2, 3][..]));

    exchange(&mut server, &mut client, MessageKind::ServerHello12).unwrap();
    assert!(client.params().flags.contains(SessionFlags::OCSP_REQUESTED));
}

struct Stapler;

impl OcspCallback for Stapler {
    fn ocsp_response(&self, chain: &[Certificate]) -> Option<Vec<u8>> {
        Some(vec![chain.len() as u8, 0xaa])
    }
}

#[test]
fn ocsp_from_callback() {
    let client_config = Config::builder()
        .versions(&[ProtocolVersion::TLS1_2])
        .request_ocsp(true)
        .build()
        .unwrap();
    let mut server = server_for(None, client_config, config());
    server.set_credentials(
        CredentialSet::builder()
            .add(ecdsa(&["a.example"]).with_ocsp_callback(Arc::new(Stapler)))
            .build(),
    );
    let selected = server.select_server_certificate().unwrap();
    assert_eq!(selected.ocsp(), Some(&[0x01, 0xaa][..]));
}

#[test]
fn ocsp_not_requested() {
    let mut server = server_for(None, tls12_config(), config());
    server.set_credentials(
        CredentialSet::builder()
            .add(ecdsa(&["a.example"]).with_ocsp(vec![1, 2, 3]))
            .build(),
    );
    let selected = server.select_server_certificate().unwrap();
    assert_eq!(selected.ocsp(), None);
}

struct Once {
    asked: AtomicUsize,
    answer: bool,
}

impl CertificateCallback for Once {
    fn server_credential(&self, query: &CredentialQuery<'_>) -> Result<Option<Credential>, Error> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        assert_eq!(query.server_name, Some("cb.example"));
        assert_eq!(query.cipher_suite, Some(ECDHE_ECDSA));
        Ok(self.answer.then(|| ecdsa(&["cb.example"])))
    }

    fn client_credential(&self, _query: &CredentialQuery<'_>) -> Result<Option<Credential>, Error> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

#[test]
fn callback_credential_is_owned() {
    let callback = Arc::new(Once {
        asked: AtomicUsize::new(0),
        answer: true,
    });
    let mut server = server_for(Some("cb.example"), tls12_config(), config());
    server.set_credentials(CredentialSet::builder().callback(callback.clone()).build());

    assert_eq!(
        server.select_server_certificate().unwrap().ownership(),
        Ownership::Owned
    );
    assert!(server.select_server_certificate().is_ok());
    assert_eq!(callback.asked.load(Ordering::SeqCst), 1);
}

#[test]
fn callback_asked_once_on_failure() {
    let callback = Arc::new(Once {
        asked: AtomicUsize::new(0),
        answer: false,
    });
    let mut server = server_for(Some("cb.example"), tls12_config(), config());
    server.set_credentials(CredentialSet::builder().callback(callback.clone()).build());

    assert!(server.select_server_certificate().is_err());
    assert!(server.select_server_certificate().is_err());
    assert_eq!(callback.asked.load(Ordering::SeqCst), 1);
}

/// A client that received a CertificateRequest naming `cas`.
fn client_with_request(cas: &[Vec<u8>]) -> Session {
    let mut request = Buf::new();
    certificate_request(&config(), cas, true, &mut request).unwrap();
    let (_, request) = CertificateRequest::parse(&request, true).unwrap();

    let mut client = session(Role::Client, config());
    negotiated(&mut client, ProtocolVersion::TLS1_2, ECDHE_ECDSA);
    client.process_certificate_request(&request).unwrap();
    client
}

#[test]
fn client_credential_by_issuer() {
    let _ = env_logger::try_init();

    let ca1 = ca("Test CA 1");
    let ca2 = ca("Test CA 2");
    let credentials = CredentialSet::builder()
        .add(issued_by(&ca1, "one.example"))
        .add(issued_by(&ca2, "two.example"))
        .build();

    let mut client = client_with_request(&[ca2.subject.clone()]);
    client.set_credentials(credentials.clone());
    let selected = client.select_client_certificate().unwrap().unwrap();
    assert_eq!(selected.ownership(), Ownership::Borrowed { index: 1 });
    assert_eq!(
        selected.signature_scheme(),
        Some(SignatureScheme::ECDSA_SECP256R1_SHA256)
    );

    // The server's CA order decides.
    let mut client = client_with_request(&[ca1.subject.clone(), ca2.subject.clone()]);
    client.set_credentials(credentials);
    let selected = client.select_client_certificate().unwrap().unwrap();
    assert_eq!(selected.ownership(), Ownership::Borrowed { index: 0 });
}

#[test]
fn client_without_matching_ca() {
    let ca1 = ca("Test CA 1");
    let ca2 = ca("Test CA 2");
    let unknown = ca("Unknown CA");
    let credentials = CredentialSet::builder()
        .add(issued_by(&ca1, "one.example"))
        .add(issued_by(&ca2, "two.example"))
        .build();

    let mut client = client_with_request(&[unknown.subject.clone()]);
    client.set_credentials(credentials);
    assert!(client.select_client_certificate().unwrap().is_none());
    assert_eq!(
        require_credential(None, KeyExchangeAlgorithm::EcdheEcdsa, Role::Client),
        Err(Error::CertificateRequired)
    );
}

#[test]
fn single_client_credential_without_ca_list() {
    let mut client = client_with_request(&[]);
    client.set_credentials(CredentialSet::builder().add(ecdsa(&["me.example"])).build());
    let selected = client.select_client_certificate().unwrap().unwrap();
    assert_eq!(selected.ownership(), Ownership::Borrowed { index: 0 });
}

#[test]
fn client_needs_certificate_request() {
    let mut client = session(Role::Client, config());
    negotiated(&mut client, ProtocolVersion::TLS1_2, ECDHE_ECDSA);
    assert_eq!(
        client.select_client_certificate().map(|_| ()),
        Err(Error::InvalidState("certificate request not processed"))
    );
}

#[test]
fn rsa_certificate_prefers_peer_order() {
    let _ = env_logger::try_init();

    let client_config = Config::builder()
        .versions(&[ProtocolVersion::TLS1_2])
        .signature_schemes(&[
            SignatureScheme::ECDSA_SECP256R1_SHA256,
            SignatureScheme::RSA_PSS_RSAE_SHA256,
        ])
        .build()
        .unwrap();
    let mut server = server_for(None, client_config, config());
    negotiated(
        &mut server,
        ProtocolVersion::TLS1_2,
        CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    );
    server.set_credentials(
        CredentialSet::builder()
            .add(ecdsa(&["ec.example"]))
            .add(rsa(&["rsa.example"]))
            .build(),
    );

    let selected = server.select_server_certificate().unwrap();
    assert_eq!(selected.ownership(), Ownership::Borrowed { index: 1 });
    assert_eq!(
        selected.signature_scheme(),
        Some(SignatureScheme::RSA_PSS_RSAE_SHA256)
    );
}

#[test]
fn rsa_key_transport_needs_no_scheme() {
    let mut server = server_for(None, tls12_config(), config());
    negotiated(
        &mut server,
        ProtocolVersion::TLS1_2,
        CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256,
    );
    server.set_credentials(
        CredentialSet::builder()
            .add(ecdsa(&["ec.example"]))
            .add(rsa(&["rsa.example"]))
            .build(),
    );

    let selected = server.select_server_certificate().unwrap();
    assert_eq!(selected.ownership(), Ownership::Borrowed { index: 1 });
    assert_eq!(selected.signature_scheme(), None);
}
