//! cookie (RFC 8446 4.2.2).
//!
//! The server may put a cookie in a HelloRetryRequest without being asked,
//! the client echoes it in its second ClientHello.

use super::parse_body;
use crate::buffer::Buf;
use crate::ext::{ExtensionContext, ExtensionHandler, MessageKind};
use crate::message::extensions::CookieExtension;
use crate::message::Role;
use crate::session::Session;
use crate::Error;

pub struct Cookie;

const ID: u16 = 0x002C;

/// Set the cookie for the next HelloRetryRequest (server).
pub fn set(session: &mut Session, cookie: &[u8]) -> Result<(), Error> {
    if cookie.is_empty() {
        return Err(Error::InvalidState("empty cookie"));
    }
    session.ext_state.set(ID, CookieExtension::new(cookie));
    Ok(())
}

/// Cookie received from the peer, or set locally.
pub fn get(session: &Session) -> Result<Option<&[u8]>, Error> {
    Ok(session
        .ext_state
        .get::<CookieExtension>(ID)?
        .map(|c| c.cookie.as_slice()))
}

impl ExtensionHandler for Cookie {
    fn receive(&self, ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        let cookie = parse_body(data, CookieExtension::parse)?;
        trace!("Received cookie of {} bytes", cookie.cookie.len());
        ctx.set_state(cookie);
        Ok(())
    }

    fn send(&self, ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error> {
        let echo = match (ctx.role(), ctx.message()) {
            (Role::Client, MessageKind::ClientHello) => true,
            (Role::Server, MessageKind::HelloRetryRequest) => true,
            _ => false,
        };
        if !echo {
            return Ok(None);
        }
        let Some(cookie) = ctx.state::<CookieExtension>()? else {
            return Ok(None);
        };
        let start = out.len();
        cookie.serialize(out)?;
        Ok(Some(out.len() - start))
    }
}
