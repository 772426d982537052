//! extended_master_secret (RFC 7627).

use std::any::Any;

use super::expect_empty;
use crate::buffer::Buf;
use crate::ext::{ExtensionContext, ExtensionHandler};
use crate::message::Role;
use crate::session::SessionFlags;
use crate::Error;

pub struct ExtendedMasterSecret;

const ID: u16 = 0x0017;

/// Whether the extension was negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated(pub bool);

impl ExtensionHandler for ExtendedMasterSecret {
    fn receive(&self, ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        expect_empty(data)?;
        if !ctx.config().with_extended_master_secret() {
            trace!("Ignoring extended_master_secret, disabled");
            return Ok(());
        }
        // The server only answers once the client asked, which was checked
        // as unsolicited on the way in.
        ctx.params_mut().flags.insert(SessionFlags::EXT_MASTER_SECRET);
        ctx.set_state(Negotiated(true));
        if ctx.role() == Role::Client {
            debug!("Extended master secret negotiated");
        }
        Ok(())
    }

    fn send(&self, ctx: &mut ExtensionContext<'_>, _out: &mut Buf) -> Result<Option<usize>, Error> {
        if !ctx.config().with_extended_master_secret() {
            return Ok(None);
        }
        if ctx.role() == Role::Server && ctx.state::<Negotiated>()?.is_none() {
            return Ok(None);
        }
        Ok(Some(0))
    }

    fn pack(&self, state: &(dyn Any + Send + Sync), out: &mut Buf) -> Result<bool, Error> {
        let Some(negotiated) = state.downcast_ref::<Negotiated>() else {
            return Err(Error::ExtensionStateType(ID));
        };
        out.push(negotiated.0 as u8);
        Ok(true)
    }

    fn unpack(&self, input: &[u8]) -> Result<Option<(Box<dyn Any + Send + Sync>, usize)>, Error> {
        match input.first() {
            Some(0) => Ok(Some((Box::new(Negotiated(false)), 1))),
            Some(1) => Ok(Some((Box::new(Negotiated(true)), 1))),
            Some(_) => Err(Error::DecodeError("extended master secret flag")),
            None => Err(Error::UnexpectedPacketLength("extended master secret flag")),
        }
    }
}
