#![no_main]

//! Fuzz target for the ServerKeyExchange and ClientKeyExchange decoders of
//! the anonymous and PSK key exchanges.

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

use tlsnego::ext::{MessageKind, Registry};
use tlsnego::flavor::{ClientKx, KeyExchangeFlavor, PskStore, ServerKx};
use tlsnego::message::{ProtocolFamily, ProtocolVersion, Role};
use tlsnego::{Buf, Config, Session};

const FLAVORS: [KeyExchangeFlavor; 5] = [
    KeyExchangeFlavor::DhAnon,
    KeyExchangeFlavor::EcdhAnon,
    KeyExchangeFlavor::Psk,
    KeyExchangeFlavor::DhePsk,
    KeyExchangeFlavor::EcdhePsk,
];

fn session(role: Role) -> Option<Session> {
    let config = Config::builder().build().ok()?;
    let mut session = Session::new(role, ProtocolFamily::Tls, Arc::new(config), Registry::default_shared());
    session.params_mut().version = Some(ProtocolVersion::TLS1_2);
    if role == Role::Server {
        session.process_extensions(MessageKind::ClientHello, &[]).ok()?;
    }
    Some(session)
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, input)) = data.split_first() else {
        return;
    };
    let flavor = FLAVORS[selector as usize % FLAVORS.len()];
    let store = Arc::new(PskStore::new().insert(b"identity", &[0x42; 16]));

    if selector & 0x80 == 0 {
        let Some(mut client) = session(Role::Client) else {
            return;
        };
        let mut kx = ClientKx::new(flavor).with_psk(store);
        if kx.read_server_key_exchange(&mut client, None, input).is_ok() {
            let mut out = Buf::new();
            let _ = kx.write_client_key_exchange(&mut client, None, &mut out);
        }
    } else {
        let Some(mut server) = session(Role::Server) else {
            return;
        };
        let mut kx = ServerKx::new(flavor).with_psk(store);
        if kx.generate(&mut server).is_err() {
            return;
        }
        let mut out = Buf::new();
        if kx.write_server_key_exchange(&server, &mut out).is_err() {
            return;
        }
        let _ = kx.read_client_key_exchange(&mut server, input);
    }
});
