//! heartbeat (RFC 6520).
//!
//! Only the mode is negotiated here, sending heartbeats is up to the
//! record layer.

use std::any::Any;

use super::parse_body;
use crate::buffer::Buf;
use crate::ext::{ExtensionContext, ExtensionHandler};
use crate::message::extensions::{HeartbeatExtension, HeartbeatMode};
use crate::message::Role;
use crate::session::Session;
use crate::Error;

pub struct Heartbeat;

const ID: u16 = 0x000F;

/// Mode the peer announced.
pub fn peer_mode(session: &Session) -> Option<HeartbeatMode> {
    match session.ext_state.get::<HeartbeatMode>(ID) {
        Ok(Some(m)) => Some(*m),
        _ => None,
    }
}

impl ExtensionHandler for Heartbeat {
    fn receive(&self, ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        let ext = parse_body(data, HeartbeatExtension::parse)?;
        if let HeartbeatMode::Unknown(_) = ext.mode {
            return Err(Error::IllegalParameter("unknown heartbeat mode"));
        }
        trace!("Peer heartbeat mode {:?}", ext.mode);
        ctx.set_state(ext.mode);
        Ok(())
    }

    fn send(&self, ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error> {
        let Some(mode) = ctx.config().heartbeat() else {
            return Ok(None);
        };
        if ctx.role() == Role::Server && ctx.state::<HeartbeatMode>()?.is_none() {
            return Ok(None);
        }
        let start = out.len();
        HeartbeatExtension { mode }.serialize(out)?;
        Ok(Some(out.len() - start))
    }

    fn pack(&self, state: &(dyn Any + Send + Sync), out: &mut Buf) -> Result<bool, Error> {
        let Some(mode) = state.downcast_ref::<HeartbeatMode>() else {
            return Err(Error::ExtensionStateType(ID));
        };
        out.push(mode.as_u8());
        Ok(true)
    }

    fn unpack(&self, input: &[u8]) -> Result<Option<(Box<dyn Any + Send + Sync>, usize)>, Error> {
        let (_, ext) = HeartbeatExtension::parse(input)?;
        if let HeartbeatMode::Unknown(_) = ext.mode {
            return Err(Error::DecodeError("unknown heartbeat mode"));
        }
        Ok(Some((Box::new(ext.mode), 1)))
    }
}
