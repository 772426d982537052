use std::sync::Arc;

use tlsnego::credentials::CredentialSet;
use tlsnego::ext::MessageKind;
use tlsnego::flavor::{ClientKx, KeyExchangeFlavor, PskStore, ServerKx};
use tlsnego::kx::{ClientKxState, ServerKxState};
use tlsnego::message::{CipherSuite, NamedGroup, ProtocolVersion, Role, SignatureScheme};
use tlsnego::{Buf, Config, Error, Session, SessionFlags};

use crate::common::*;

/// Client and server sessions after a TLS 1.2 hello exchange on `suite`.
fn hello(suite: CipherSuite, client_config: Config, server_config: Config) -> (Session, Session) {
    let mut client = session(Role::Client, Arc::new(client_config));
    let mut server = session(Role::Server, Arc::new(server_config));
    exchange(&mut client, &mut server, MessageKind::ClientHello).unwrap();
    negotiated(&mut server, ProtocolVersion::TLS1_2, suite);
    exchange(&mut server, &mut client, MessageKind::ServerHello12).unwrap();
    negotiated(&mut client, ProtocolVersion::TLS1_2, suite);
    (client, server)
}

#[test]
fn ecdhe_ecdsa_handshake() {
    let _ = env_logger::try_init();

    let suite = CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256;
    let (mut client, mut server) = hello(suite, tls12_config(), Config::builder().build().unwrap());
    server.set_credentials(CredentialSet::builder().add(ecdsa(&["a.example"])).build());
    let server_key = server
        .select_server_certificate()
        .unwrap()
        .credential()
        .leaf()
        .public_key()
        .clone();

    let flavor = KeyExchangeFlavor::for_suite(suite).unwrap();
    let mut server_kx = ServerKx::new(flavor);
    let mut client_kx = ClientKx::new(flavor);

    server_kx.generate(&mut server).unwrap();
    assert_eq!(server_kx.state(), ServerKxState::ParamsGenerated);
    assert_eq!(server.params().group, Some(NamedGroup::X25519));

    let mut ske = Buf::new();
    assert!(server_kx.write_server_key_exchange(&server, &mut ske).unwrap());
    assert_eq!(server_kx.state(), ServerKxState::Sent);

    client_kx
        .read_server_key_exchange(&mut client, Some(&server_key), &ske)
        .unwrap();
    assert_eq!(client_kx.state(), ClientKxState::Validated);
    assert_eq!(
        client.params().server_signature_scheme,
        Some(SignatureScheme::ECDSA_SECP256R1_SHA256)
    );

    let mut cke = Buf::new();
    client_kx
        .write_client_key_exchange(&mut client, Some(&server_key), &mut cke)
        .unwrap();
    assert_eq!(client_kx.state(), ClientKxState::Derived);
    server_kx.read_client_key_exchange(&mut server, &cke).unwrap();

    let a = server_kx.take_premaster().unwrap();
    let b = client_kx.take_premaster().unwrap();
    assert_eq!(&a[..], &b[..]);
    assert_eq!(a.len(), 32);
    assert!(server_kx.take_premaster().is_err());
}

#[test]
fn tampered_signature_is_rejected() {
    let suite = CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256;
    let (mut client, mut server) = hello(suite, tls12_config(), Config::builder().build().unwrap());
    server.set_credentials(CredentialSet::builder().add(ecdsa(&["a.example"])).build());
    let server_key = server
        .select_server_certificate()
        .unwrap()
        .credential()
        .leaf()
        .public_key()
        .clone();

    let flavor = KeyExchangeFlavor::for_suite(suite).unwrap();
    let mut server_kx = ServerKx::new(flavor);
    server_kx.generate(&mut server).unwrap();
    let mut ske = Buf::new();
    server_kx.write_server_key_exchange(&server, &mut ske).unwrap();

    // Flip a bit in the server's public point.
    let mut tampered = ske.to_vec();
    tampered[6] ^= 0x01;

    let mut client_kx = ClientKx::new(flavor);
    assert!(client_kx
        .read_server_key_exchange(&mut client, Some(&server_key), &tampered)
        .is_err());
}

#[test]
fn dhe_rsa_handshake() {
    let _ = env_logger::try_init();

    let suite = CipherSuite::TLS_DHE_RSA_WITH_AES_128_GCM_SHA256;
    let (mut client, mut server) = hello(suite, tls12_config(), Config::builder().build().unwrap());
    server.set_credentials(CredentialSet::builder().add(rsa(&["a.example"])).build());
    let server_key = server
        .select_server_certificate()
        .unwrap()
        .credential()
        .leaf()
        .public_key()
        .clone();

    let flavor = KeyExchangeFlavor::for_suite(suite).unwrap();
    let mut server_kx = ServerKx::new(flavor);
    let mut client_kx = ClientKx::new(flavor);

    server_kx.generate(&mut server).unwrap();
    // The client listed FFDHE groups, so one of them is used.
    assert!(server.params().flags.contains(SessionFlags::USED_FFDHE));
    assert_eq!(server.params().group, Some(NamedGroup::Ffdhe2048));

    let mut ske = Buf::new();
    server_kx.write_server_key_exchange(&server, &mut ske).unwrap();
    client_kx
        .read_server_key_exchange(&mut client, Some(&server_key), &ske)
        .unwrap();
    assert_eq!(client.params().dh_prime_bits, Some(2048));
    assert!(client.params().flags.contains(SessionFlags::USED_FFDHE));

    let mut cke = Buf::new();
    client_kx
        .write_client_key_exchange(&mut client, Some(&server_key), &mut cke)
        .unwrap();
    server_kx.read_client_key_exchange(&mut server, &cke).unwrap();

    let a = server_kx.take_premaster().unwrap();
    let b = client_kx.take_premaster().unwrap();
    assert_eq!(&a[..], &b[..]);
}

#[test]
fn small_dh_prime_is_refused() {
    let _ = env_logger::try_init();

    let suite = CipherSuite::TLS_DH_ANON_WITH_AES_128_GCM_SHA256;
    let strict = Config::builder()
        .versions(&[ProtocolVersion::TLS1_2])
        .min_dh_bits(3072)
        .build()
        .unwrap();
    let server_config = Config::builder()
        .groups(&[NamedGroup::Ffdhe2048])
        .build()
        .unwrap();
    let (mut client, mut server) = hello(suite, strict, server_config.clone());

    let flavor = KeyExchangeFlavor::DhAnon;
    let mut server_kx = ServerKx::new(flavor);
    server_kx.generate(&mut server).unwrap();
    let mut ske = Buf::new();
    server_kx.write_server_key_exchange(&server, &mut ske).unwrap();

    let mut client_kx = ClientKx::new(flavor);
    assert_eq!(
        client_kx.read_server_key_exchange(&mut client, None, &ske),
        Err(Error::DhPrimeUnacceptable(2048))
    );

    // Tolerated, with a warning, when configured.
    let tolerant = Config::builder()
        .versions(&[ProtocolVersion::TLS1_2])
        .min_dh_bits(3072)
        .tolerate_weak_dh(true)
        .build()
        .unwrap();
    let (mut client, _) = hello(suite, tolerant, server_config);
    let mut client_kx = ClientKx::new(flavor);
    client_kx
        .read_server_key_exchange(&mut client, None, &ske)
        .unwrap();
    assert_eq!(client.params().dh_prime_bits, Some(2048));
}

#[test]
fn no_common_ffdhe_group() {
    // The client offers only 3072, the server only has 2048.
    let client_config = Config::builder()
        .versions(&[ProtocolVersion::TLS1_2])
        .groups(&[NamedGroup::Secp256r1, NamedGroup::Ffdhe3072])
        .build()
        .unwrap();
    let server_config = Config::builder()
        .groups(&[NamedGroup::Secp256r1, NamedGroup::Ffdhe2048])
        .build()
        .unwrap();
    let suite = CipherSuite::TLS_DH_ANON_WITH_AES_128_GCM_SHA256;
    let (_, mut server) = hello(suite, client_config, server_config);

    let mut server_kx = ServerKx::new(KeyExchangeFlavor::DhAnon);
    assert_eq!(server_kx.generate(&mut server), Err(Error::NoCommonGroup));
}

#[test]
fn rsa_key_transport() {
    let _ = env_logger::try_init();

    let suite = CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256;
    let (mut client, mut server) = hello(suite, tls12_config(), Config::builder().build().unwrap());
    client.params_mut().advertised_version = Some(ProtocolVersion::TLS1_2);
    server.params_mut().advertised_version = Some(ProtocolVersion::TLS1_2);
    server.set_credentials(CredentialSet::builder().add(rsa(&["a.example"])).build());
    let server_key = server
        .select_server_certificate()
        .unwrap()
        .credential()
        .leaf()
        .public_key()
        .clone();

    let flavor = KeyExchangeFlavor::for_suite(suite).unwrap();
    let mut server_kx = ServerKx::new(flavor);
    let mut client_kx = ClientKx::new(flavor);

    server_kx.generate(&mut server).unwrap();
    let mut ske = Buf::new();
    // No ServerKeyExchange for plain RSA.
    assert!(!server_kx.write_server_key_exchange(&server, &mut ske).unwrap());

    let mut cke = Buf::new();
    client_kx
        .write_client_key_exchange(&mut client, Some(&server_key), &mut cke)
        .unwrap();
    // Length prefixed 2048 bit ciphertext.
    assert_eq!(cke.len(), 2 + 256);
    server_kx.read_client_key_exchange(&mut server, &cke).unwrap();

    let a = server_kx.take_premaster().unwrap();
    let b = client_kx.take_premaster().unwrap();
    assert_eq!(a.len(), 48);
    assert_eq!(&a[..2], &[0x03, 0x03]);
    assert_eq!(&a[..], &b[..]);
}

#[test]
fn dhe_psk_with_hint() {
    let _ = env_logger::try_init();

    let suite = CipherSuite::TLS_DHE_PSK_WITH_AES_128_GCM_SHA256;
    let (mut client, mut server) = hello(suite, tls12_config(), Config::builder().build().unwrap());

    let server_store = Arc::new(
        PskStore::new()
            .with_hint(b"our-hint")
            .insert(b"alice", &[0x5a; 32]),
    );
    let client_store = Arc::new(PskStore::new().insert(b"alice", &[0x5a; 32]));

    let flavor = KeyExchangeFlavor::for_suite(suite).unwrap();
    let mut server_kx = ServerKx::new(flavor).with_psk(server_store);
    let mut client_kx = ClientKx::new(flavor).with_psk(client_store);

    server_kx.generate(&mut server).unwrap();
    let mut ske = Buf::new();
    assert!(server_kx.write_server_key_exchange(&server, &mut ske).unwrap());
    client_kx
        .read_server_key_exchange(&mut client, None, &ske)
        .unwrap();
    assert_eq!(client_kx.psk_hint(), Some(&b"our-hint"[..]));

    let mut cke = Buf::new();
    client_kx
        .write_client_key_exchange(&mut client, None, &mut cke)
        .unwrap();
    server_kx.read_client_key_exchange(&mut server, &cke).unwrap();
    assert_eq!(server_kx.psk_identity(), Some(&b"alice"[..]));

    let a = server_kx.take_premaster().unwrap();
    let b = client_kx.take_premaster().unwrap();
    assert_eq!(&a[..], &b[..]);
    assert_eq!(&a[a.len() - 34..a.len() - 32], &[0x00, 0x20]);
    assert_eq!(&a[a.len() - 32..], &[0x5a; 32]);
}

#[test]
fn psk_client_without_key() {
    let suite = CipherSuite::TLS_PSK_WITH_AES_128_GCM_SHA256;
    let (mut client, _) = hello(suite, tls12_config(), Config::builder().build().unwrap());
    let mut client_kx = ClientKx::new(KeyExchangeFlavor::Psk);
    let mut cke = Buf::new();
    assert_eq!(
        client_kx.write_client_key_exchange(&mut client, None, &mut cke),
        Err(Error::InsufficientCredentials)
    );
}
