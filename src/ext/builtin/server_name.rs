//! server_name (RFC 6066 3).
//!
//! The server stores the requested names for certificate selection and
//! answers with an empty body. A second name of the same type is refused.

use std::any::Any;

use super::{expect_empty, parse_body};
use crate::buffer::Buf;
use crate::ext::{ExtensionContext, ExtensionHandler};
use crate::message::extensions::{ServerName, ServerNameExtension, ServerNameType};
use crate::message::Role;
use crate::session::{Session, SessionFlags};
use crate::Error;

pub struct ServerNameIndication;

const ID: u16 = 0x0000;

/// Names requested by the client, or to be requested by us.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerNames(pub Vec<ServerName>);

impl ServerNames {
    /// The DNS host name, if one was given and is valid UTF-8.
    pub fn host_name(&self) -> Option<&str> {
        self.0
            .iter()
            .find(|n| n.name_type == ServerNameType::HostName)
            .and_then(|n| std::str::from_utf8(&n.name).ok())
    }
}

/// Ask for `host` in the ClientHello.
pub fn set_host_name(session: &mut Session, host: &str) -> Result<(), Error> {
    if host.is_empty() || host.len() > u16::MAX as usize - 3 {
        return Err(Error::InvalidState("host name length"));
    }
    // IP literals are not valid in SNI.
    if host.parse::<std::net::IpAddr>().is_ok() {
        return Err(Error::InvalidState("IP address as server name"));
    }
    let host = host.trim_end_matches('.');
    session
        .ext_state
        .set(ID, ServerNames(vec![ServerName::host_name(host)]));
    Ok(())
}

/// The host name of this handshake, falling back to a resumed session's.
pub fn host_name(session: &Session) -> Option<&str> {
    if let Ok(Some(names)) = session.ext_state.get::<ServerNames>(ID) {
        return names.host_name();
    }
    match session.ext_state.resumed::<ServerNames>(ID) {
        Ok(Some(names)) => names.host_name(),
        _ => None,
    }
}

impl ExtensionHandler for ServerNameIndication {
    fn receive(&self, ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        if ctx.role() == Role::Client {
            return expect_empty(data);
        }

        let ext = parse_body(data, ServerNameExtension::parse)?;
        if ext.names.is_empty() {
            return Err(Error::DecodeError("empty server name list"));
        }
        for (i, name) in ext.names.iter().enumerate() {
            if ext.names[..i].iter().any(|n| n.name_type == name.name_type) {
                return Err(Error::IllegalParameter("duplicate server name type"));
            }
            if name.name.is_empty() {
                return Err(Error::DecodeError("empty server name"));
            }
        }

        let names = ServerNames(ext.names);
        debug!("Client requested server name {:?}", names.host_name());
        ctx.set_state(names);
        Ok(())
    }

    fn send(&self, ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error> {
        match ctx.role() {
            Role::Client => {
                let Some(names) = ctx.state::<ServerNames>()? else {
                    return Ok(None);
                };
                let start = out.len();
                ServerNameExtension {
                    names: names.0.clone(),
                }
                .serialize(out)?;
                Ok(Some(out.len() - start))
            }
            Role::Server => {
                // No acknowledgement on resumption (RFC 6066 3).
                if ctx.params().flags.contains(SessionFlags::RESUMED) {
                    return Ok(None);
                }
                Ok(Some(0))
            }
        }
    }

    fn pack(&self, state: &(dyn Any + Send + Sync), out: &mut Buf) -> Result<bool, Error> {
        let Some(names) = state.downcast_ref::<ServerNames>() else {
            return Err(Error::ExtensionStateType(ID));
        };
        ServerNameExtension {
            names: names.0.clone(),
        }
        .serialize(out)?;
        Ok(true)
    }

    fn unpack(&self, input: &[u8]) -> Result<Option<(Box<dyn Any + Send + Sync>, usize)>, Error> {
        let (rest, ext) = ServerNameExtension::parse(input)?;
        Ok(Some((Box::new(ServerNames(ext.names)), input.len() - rest.len())))
    }
}
