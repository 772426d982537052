//! supported_groups (RFC 8422 5.1.1, RFC 7919).

use super::parse_body;
use crate::buffer::Buf;
use crate::ext::{ExtensionContext, ExtensionHandler};
use crate::message::extensions::SupportedGroupsExtension;
use crate::message::Role;
use crate::Error;

pub struct SupportedGroups;

impl ExtensionHandler for SupportedGroups {
    fn receive(&self, ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        let ext = parse_body(data, SupportedGroupsExtension::parse)?;
        if ext.groups.is_empty() {
            return Err(Error::DecodeError("empty group list"));
        }
        trace!("Peer groups: {:?}", ext.groups);
        ctx.peer_mut().groups = ext.groups;
        Ok(())
    }

    fn send(&self, ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error> {
        // Servers do not advertise groups.
        if ctx.role() == Role::Server {
            return Ok(None);
        }
        let start = out.len();
        SupportedGroupsExtension::new(ctx.config().groups()).serialize(out)?;
        Ok(Some(out.len() - start))
    }
}
