//! signature_algorithms (RFC 5246 7.4.1.4.1, RFC 8446 4.2.3).
//!
//! Received lists keep the peer's order, it decides the preference during
//! signature scheme selection.

use super::parse_body;
use crate::buffer::Buf;
use crate::ext::{ExtensionContext, ExtensionHandler, MessageKind};
use crate::message::extensions::SignatureAlgorithmsExtension;
use crate::message::{Role, SignatureScheme};
use crate::Error;

pub struct SignatureAlgorithms;

impl ExtensionHandler for SignatureAlgorithms {
    fn receive(&self, ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        let ext = parse_body(data, SignatureAlgorithmsExtension::parse)?;
        if ext.supported_signature_algorithms.is_empty() {
            return Err(Error::DecodeError("empty signature algorithm list"));
        }
        trace!("Peer signature schemes: {:?}", ext.supported_signature_algorithms);

        let from_request = ctx.message() == MessageKind::CertificateRequest13;
        let peer = ctx.peer_mut();
        peer.signature_schemes = ext.supported_signature_algorithms;
        if from_request {
            peer.cert_request = true;
        }
        Ok(())
    }

    fn send(&self, ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error> {
        let tls13_only = ctx.role() == Role::Server;
        let schemes: Vec<SignatureScheme> = ctx
            .config()
            .signature_schemes()
            .iter()
            .copied()
            // MD5+SHA1 has no code point.
            .filter(|s| *s != SignatureScheme::RSA_PKCS1_MD5_SHA1)
            .filter(|s| !tls13_only || s.allowed_in_tls13())
            .collect();
        if schemes.is_empty() {
            return Ok(None);
        }
        let start = out.len();
        SignatureAlgorithmsExtension::new(&schemes).serialize(out)?;
        Ok(Some(out.len() - start))
    }
}
