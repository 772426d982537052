use std::sync::{Arc, Mutex};

use tlsnego::ext::builtin::{cookie, key_share};
use tlsnego::ext::{
    ExtensionContext, ExtensionDescriptor, ExtensionHandler, MessageKind, ParsePriority, Registry,
    RegistryBuilder, Validity,
};
use tlsnego::message::extensions::SrtpProfileId;
use tlsnego::message::{NamedGroup, ProtocolFamily, ProtocolVersion, Role};
use tlsnego::{Buf, Config, Error, Session, SessionFlags};

use crate::common::*;

const SERVER_NAME: u16 = 0x0000;
const EXTENDED_MASTER_SECRET: u16 = 0x0017;
const KEY_SHARE: u16 = 0x0033;
const CUSTOM: u16 = 0xff10;

#[test]
fn tls12_hello_exchange() {
    let _ = env_logger::try_init();

    let mut client = session(Role::Client, Arc::new(tls12_config()));
    let mut server = session(Role::Server, config());
    client.set_server_name("a.example").unwrap();

    exchange(&mut client, &mut server, MessageKind::ClientHello).unwrap();
    assert_eq!(server.server_name(), Some("a.example"));
    assert_eq!(
        server.peer().signature_schemes,
        client.config().signature_schemes().to_vec()
    );
    assert_eq!(server.peer().groups, client.config().groups().to_vec());
    assert!(server.params().flags.contains(SessionFlags::EXT_MASTER_SECRET));
    // No supported_versions, the version comes from the legacy field.
    assert_eq!(server.params().version, None);

    exchange(&mut server, &mut client, MessageKind::ServerHello12).unwrap();
    assert!(server.was_sent(SERVER_NAME));
    assert!(client.was_received(SERVER_NAME));
    assert!(client.params().flags.contains(SessionFlags::EXT_MASTER_SECRET));
}

#[test]
fn tls13_key_share_agrees() {
    let _ = env_logger::try_init();

    let mut client = session(Role::Client, config());
    let mut server = session(Role::Server, config());

    exchange(&mut client, &mut server, MessageKind::ClientHello).unwrap();
    assert_eq!(server.params().version, Some(ProtocolVersion::TLS1_3));
    assert_eq!(
        key_share::server_selection(&server).unwrap(),
        key_share::KeyShareOutcome::Share(NamedGroup::X25519)
    );

    exchange(&mut server, &mut client, MessageKind::ServerHello13).unwrap();
    assert_eq!(client.params().version, Some(ProtocolVersion::TLS1_3));
    assert_eq!(client.params().group, Some(NamedGroup::X25519));
    assert_eq!(server.params().group, Some(NamedGroup::X25519));

    let a = server.take_key_share_secret().unwrap().unwrap();
    let b = client.take_key_share_secret().unwrap().unwrap();
    assert_eq!(&a[..], &b[..]);
    assert_eq!(a.len(), 32);

    // Taken once.
    assert!(server.take_key_share_secret().unwrap().is_none());
}

#[test]
fn zero_ffdhe_key_share_is_refused() {
    let ffdhe_only = Arc::new(
        Config::builder()
            .groups(&[NamedGroup::Ffdhe2048])
            .build()
            .unwrap(),
    );
    let mut client = session(Role::Client, ffdhe_only.clone());
    let mut server = session(Role::Server, ffdhe_only);

    let mut out = Buf::new();
    client
        .write_extensions(MessageKind::ClientHello, &mut out)
        .unwrap();
    let mut block = out[2..].to_vec();

    // Replace the 256 byte share with zeros.
    let mut pos = 0;
    while pos + 4 <= block.len() {
        let id = u16::from_be_bytes([block[pos], block[pos + 1]]);
        let len = u16::from_be_bytes([block[pos + 2], block[pos + 3]]) as usize;
        if id == KEY_SHARE {
            // list length, group, share length
            let share = pos + 4 + 6;
            assert_eq!(len, 6 + 256);
            block[share..share + 256].fill(0);
        }
        pos += 4 + len;
    }

    assert_eq!(
        server.process_extensions(MessageKind::ClientHello, &block),
        Err(Error::IllegalParameter("DH public value out of range"))
    );
    assert!(server.take_key_share_secret().unwrap().is_none());
}

#[test]
fn hello_retry_request_for_other_group() {
    let _ = env_logger::try_init();

    let client_config = Config::builder()
        .groups(&[NamedGroup::X25519, NamedGroup::Secp256r1])
        .build()
        .unwrap();
    let server_config = Config::builder()
        .groups(&[NamedGroup::Secp256r1])
        .build()
        .unwrap();
    let mut client = session(Role::Client, Arc::new(client_config));
    let mut server = session(Role::Server, Arc::new(server_config));

    exchange(&mut client, &mut server, MessageKind::ClientHello).unwrap();
    assert_eq!(
        key_share::server_selection(&server).unwrap(),
        key_share::KeyShareOutcome::RetryWith(NamedGroup::Secp256r1)
    );

    cookie::set(&mut server, b"state").unwrap();
    exchange(&mut server, &mut client, MessageKind::HelloRetryRequest).unwrap();
    assert_eq!(cookie::get(&client).unwrap(), Some(&b"state"[..]));

    // The second ClientHello carries the cookie and a P-256 share only.
    exchange(&mut client, &mut server, MessageKind::ClientHello).unwrap();
    assert_eq!(cookie::get(&server).unwrap(), Some(&b"state"[..]));

    exchange(&mut server, &mut client, MessageKind::ServerHello13).unwrap();
    assert_eq!(client.params().group, Some(NamedGroup::Secp256r1));

    let a = server.take_key_share_secret().unwrap().unwrap();
    let b = client.take_key_share_secret().unwrap().unwrap();
    assert_eq!(&a[..], &b[..]);
}

#[test]
fn duplicate_extension() {
    let mut server = session(Role::Server, config());
    // Two server_name extensions.
    let block = [
        0x00, 0x00, 0x00, 0x06, 0x00, 0x04, 0x00, 0x00, 0x01, b'a', //
        0x00, 0x00, 0x00, 0x06, 0x00, 0x04, 0x00, 0x00, 0x01, b'b',
    ];
    assert_eq!(
        server.process_extensions(MessageKind::ClientHello, &block),
        Err(Error::IllegalParameter("duplicate extension"))
    );
}

#[test]
fn pre_shared_key_must_be_last() {
    let mut server = session(Role::Server, config());
    let block = [0x00, 0x29, 0x00, 0x00, 0x00, 0x17, 0x00, 0x00];
    assert_eq!(
        server.process_extensions(MessageKind::ClientHello, &block),
        Err(Error::IllegalParameter("pre_shared_key is not last"))
    );
}

#[test]
fn hello_retry_request_is_restricted() {
    let mut client = session(Role::Client, config());
    let mut out = Buf::new();
    client
        .write_extensions(MessageKind::ClientHello, &mut out)
        .unwrap();

    // server_name is valid in a ServerHello, not in a HelloRetryRequest.
    let block = [0x00, 0x00, 0x00, 0x00];
    assert_eq!(
        client.process_extensions(MessageKind::HelloRetryRequest, &block),
        Err(Error::IllegalParameter(
            "extension not allowed in HelloRetryRequest"
        ))
    );
}

#[test]
fn unsolicited_extension() {
    let config = Config::builder()
        .versions(&[ProtocolVersion::TLS1_2])
        .with_extended_master_secret(false)
        .build()
        .unwrap();
    let mut client = session(Role::Client, Arc::new(config));
    let mut out = Buf::new();
    client
        .write_extensions(MessageKind::ClientHello, &mut out)
        .unwrap();
    assert!(!client.was_sent(EXTENDED_MASTER_SECRET));

    let block = [0x00, 0x17, 0x00, 0x00];
    assert_eq!(
        client.process_extensions(MessageKind::ServerHello12, &block),
        Err(Error::IllegalExtension(
            EXTENDED_MASTER_SECRET,
            "unsolicited extension"
        ))
    );
}

#[test]
fn extension_in_wrong_message() {
    let mut server = session(Role::Server, config());
    // use_srtp over TLS.
    let block = [0x00, 0x0e, 0x00, 0x05, 0x00, 0x02, 0x00, 0x01, 0x00];
    assert_eq!(
        server.process_extensions(MessageKind::ClientHello, &block),
        Err(Error::IllegalParameter("extension not allowed in this message"))
    );
}

#[test]
fn duplicate_server_name_type() {
    let mut server = session(Role::Server, config());
    let block = [
        0x00, 0x00, 0x00, 0x0a, // server_name, 10 bytes
        0x00, 0x08, // list
        0x00, 0x00, 0x01, b'a', // host_name "a"
        0x00, 0x00, 0x01, b'b', // host_name "b"
    ];
    assert_eq!(
        server.process_extensions(MessageKind::ClientHello, &block),
        Err(Error::IllegalParameter("duplicate server name type"))
    );
}

#[test]
fn unknown_extensions_are_ignored() {
    let mut server = session(Role::Server, config());
    let block = [0xfe, 0xfe, 0x00, 0x02, 0xaa, 0xbb];
    server
        .process_extensions(MessageKind::ClientHello, &block)
        .unwrap();
    assert!(!server.was_received(0xfefe));
}

#[test]
fn srtp_over_dtls() {
    let _ = env_logger::try_init();

    let profiles = [SrtpProfileId::SrtpAeadAes128Gcm, SrtpProfileId::SrtpAes128CmSha1_80];
    let client_config = Config::builder()
        .versions(&[ProtocolVersion::DTLS1_2])
        .srtp_profiles(&profiles)
        .build()
        .unwrap();
    let server_config = Config::builder()
        .versions(&[ProtocolVersion::DTLS1_2])
        .srtp_profiles(&[SrtpProfileId::SrtpAes128CmSha1_80])
        .build()
        .unwrap();

    let mut client = dtls_session(Role::Client, Arc::new(client_config));
    let mut server = dtls_session(Role::Server, Arc::new(server_config));
    exchange(&mut client, &mut server, MessageKind::ClientHello).unwrap();
    exchange(&mut server, &mut client, MessageKind::ServerHello12).unwrap();

    assert_eq!(server.srtp_profile(), Some(SrtpProfileId::SrtpAes128CmSha1_80));
    assert_eq!(client.srtp_profile(), Some(SrtpProfileId::SrtpAes128CmSha1_80));
}

#[test]
fn srtp_without_common_profile() {
    let client_config = Config::builder()
        .versions(&[ProtocolVersion::DTLS1_2])
        .srtp_profiles(&[SrtpProfileId::SrtpAes128CmSha1_32])
        .build()
        .unwrap();
    let server_config = Config::builder()
        .versions(&[ProtocolVersion::DTLS1_2])
        .srtp_profiles(&[SrtpProfileId::SrtpAes128CmSha1_80])
        .build()
        .unwrap();

    let mut client = dtls_session(Role::Client, Arc::new(client_config));
    let mut server = dtls_session(Role::Server, Arc::new(server_config));
    exchange(&mut client, &mut server, MessageKind::ClientHello).unwrap();
    exchange(&mut server, &mut client, MessageKind::ServerHello12).unwrap();

    assert_eq!(server.srtp_profile(), None);
    assert_eq!(client.srtp_profile(), None);
    assert!(!server.was_sent(0x000e));
}

#[test]
fn resumed_state_round_trip() {
    let mut client = session(Role::Client, Arc::new(tls12_config()));
    let mut server = session(Role::Server, config());
    client.set_server_name("resume.example").unwrap();
    exchange(&mut client, &mut server, MessageKind::ClientHello).unwrap();

    let packed = server.pack_extensions().unwrap();

    let mut resumed = session(Role::Server, config());
    resumed.unpack_extensions(&packed).unwrap();
    assert_eq!(resumed.server_name(), Some("resume.example"));

    // Truncated input is an error, not a partial restore.
    let mut broken = session(Role::Server, config());
    assert!(broken.unpack_extensions(&packed[..packed.len() - 1]).is_err());
}

/// Remembers what it received and answers with a fixed body.
#[derive(Default)]
struct Echo {
    received: Mutex<Vec<Vec<u8>>>,
}

impl ExtensionHandler for Echo {
    fn receive(&self, ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        self.received.lock().unwrap().push(data.to_vec());
        ctx.set_state(data.to_vec());
        Ok(())
    }

    fn send(&self, ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error> {
        let body: &[u8] = match ctx.role() {
            Role::Client => b"ping",
            Role::Server => b"pong",
        };
        out.extend_from_slice(body);
        Ok(Some(body.len()))
    }
}

fn echo_descriptor() -> ExtensionDescriptor {
    ExtensionDescriptor::new(
        CUSTOM,
        "echo",
        Validity::CLIENT_HELLO | Validity::TLS12_SERVER_HELLO | Validity::ANY_FAMILY,
        ParsePriority::Application,
        Echo::default(),
    )
}

#[test]
fn session_extension() {
    let _ = env_logger::try_init();

    let mut client = session(Role::Client, Arc::new(tls12_config()));
    let mut server = session(Role::Server, config());
    client.register_extension(echo_descriptor()).unwrap();
    server.register_extension(echo_descriptor()).unwrap();
    assert_eq!(
        server.register_extension(echo_descriptor()),
        Err(Error::AlreadyRegistered(CUSTOM))
    );

    exchange(&mut client, &mut server, MessageKind::ClientHello).unwrap();
    assert_eq!(
        server.ext_state().get::<Vec<u8>>(CUSTOM).unwrap(),
        Some(&b"ping".to_vec())
    );

    exchange(&mut server, &mut client, MessageKind::ServerHello12).unwrap();
    assert_eq!(
        client.ext_state().get::<Vec<u8>>(CUSTOM).unwrap(),
        Some(&b"pong".to_vec())
    );

    // Reading the state as another type is refused.
    assert!(server.ext_state().get::<String>(CUSTOM).is_err());
}

#[test]
fn shared_registry() {
    let registry = RegistryBuilder::new()
        .with_builtin()
        .unwrap()
        .register(echo_descriptor())
        .unwrap()
        .build();
    assert_eq!(registry.len(), Registry::default_shared().len() + 1);

    let duplicate = RegistryBuilder::new()
        .with_builtin()
        .unwrap()
        .register(echo_descriptor())
        .unwrap()
        .register(echo_descriptor());
    assert!(matches!(duplicate, Err(Error::AlreadyRegistered(CUSTOM))));

    let mut client = Session::new(
        Role::Client,
        ProtocolFamily::Tls,
        Arc::new(tls12_config()),
        registry.clone(),
    );
    let mut server = Session::new(Role::Server, ProtocolFamily::Tls, config(), registry);
    exchange(&mut client, &mut server, MessageKind::ClientHello).unwrap();
    assert!(server.was_received(CUSTOM));
}
