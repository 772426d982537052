//! use_srtp (RFC 5764 4.1). DTLS only.
//!
//! The server picks the first of its profiles the client offered. The
//! client accepts exactly one profile back, from its own list.

use std::any::Any;

use super::parse_body;
use crate::buffer::Buf;
use crate::ext::{ExtensionContext, ExtensionHandler};
use crate::message::extensions::{SrtpProfileId, UseSrtpExtension};
use crate::message::Role;
use crate::session::Session;
use crate::Error;

pub struct UseSrtp;

const ID: u16 = 0x000E;

/// The negotiated SRTP protection profile.
pub fn profile(session: &Session) -> Option<SrtpProfileId> {
    match session.ext_state.get::<SrtpProfileId>(ID) {
        Ok(Some(p)) => Some(*p),
        _ => None,
    }
}

impl ExtensionHandler for UseSrtp {
    fn receive(&self, ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        let ext = parse_body(data, UseSrtpExtension::parse)?;

        let selected = match ctx.role() {
            Role::Server => {
                let Some(profile) = ctx
                    .config()
                    .srtp_profiles()
                    .iter()
                    .copied()
                    .find(|p| ext.profiles.contains(p))
                else {
                    // No overlap leaves SRTP off, it is not a handshake failure.
                    debug!("No common SRTP profile in {:?}", ext.profiles);
                    return Ok(());
                };
                profile
            }
            Role::Client => {
                let [profile] = ext.profiles.as_slice() else {
                    return Err(Error::IllegalParameter("server must select one SRTP profile"));
                };
                if !ctx.config().srtp_profiles().contains(profile) {
                    return Err(Error::IllegalParameter("SRTP profile not offered"));
                }
                *profile
            }
        };

        debug!("SRTP profile {:?}", selected);
        ctx.set_state(selected);
        Ok(())
    }

    fn send(&self, ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error> {
        let profiles = match ctx.role() {
            Role::Client => ctx.config().srtp_profiles().to_vec(),
            Role::Server => match ctx.state::<SrtpProfileId>()? {
                Some(p) => vec![*p],
                None => return Ok(None),
            },
        };
        if profiles.is_empty() {
            return Ok(None);
        }
        let start = out.len();
        UseSrtpExtension::new(profiles, Vec::new()).serialize(out)?;
        Ok(Some(out.len() - start))
    }

    fn pack(&self, state: &(dyn Any + Send + Sync), out: &mut Buf) -> Result<bool, Error> {
        let Some(profile) = state.downcast_ref::<SrtpProfileId>() else {
            return Err(Error::ExtensionStateType(ID));
        };
        out.push_u16(profile.as_u16());
        Ok(true)
    }

    fn unpack(&self, input: &[u8]) -> Result<Option<(Box<dyn Any + Send + Sync>, usize)>, Error> {
        let (rest, profile) = SrtpProfileId::parse(input)?;
        Ok(Some((Box::new(profile), input.len() - rest.len())))
    }
}
