#![no_main]

//! Fuzz target for hello extension dispatch.
//!
//! The first byte picks the message, the rest is taken as its extensions
//! block. Clients write a ClientHello first so that server answers are
//! checked against what was offered.

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

use tlsnego::ext::{MessageKind, Registry};
use tlsnego::message::{ProtocolFamily, Role};
use tlsnego::{Buf, Config, Session};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, block)) = data.split_first() else {
        return;
    };
    let Ok(config) = Config::builder().build() else {
        return;
    };
    let family = if selector & 0x80 == 0 {
        ProtocolFamily::Tls
    } else {
        ProtocolFamily::Dtls
    };

    let message = match selector & 0x07 {
        0 => MessageKind::ClientHello,
        1 => MessageKind::ServerHello12,
        2 => MessageKind::ServerHello13,
        3 => MessageKind::HelloRetryRequest,
        4 => MessageKind::EncryptedExtensions,
        _ => MessageKind::CertificateRequest13,
    };

    let role = match message {
        MessageKind::ClientHello => Role::Server,
        _ => Role::Client,
    };
    let mut session = Session::new(role, family, Arc::new(config), Registry::default_shared());

    if role == Role::Client {
        let mut out = Buf::new();
        if session.write_extensions(MessageKind::ClientHello, &mut out).is_err() {
            return;
        }
    }

    if session.process_extensions(message, block).is_ok() {
        // Whatever was accepted must pack and unpack again.
        if let Ok(packed) = session.pack_extensions() {
            let _ = session.unpack_extensions(&packed);
        }
    }
});
