//! ec_point_formats (RFC 8422 5.1.2). Only uncompressed points are used.

use super::parse_body;
use crate::buffer::Buf;
use crate::ext::{ExtensionContext, ExtensionHandler};
use crate::message::extensions::ECPointFormatsExtension;
use crate::message::Role;
use crate::Error;

pub struct EcPointFormats;

impl ExtensionHandler for EcPointFormats {
    fn receive(&self, _ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        let ext = parse_body(data, ECPointFormatsExtension::parse)?;
        if !ext.has_uncompressed() {
            return Err(Error::IllegalParameter("uncompressed point format missing"));
        }
        Ok(())
    }

    fn send(&self, ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error> {
        match ctx.role() {
            Role::Client => {
                if !ctx.config().groups().iter().any(|g| g.is_ec()) {
                    return Ok(None);
                }
            }
            Role::Server => {
                let ecdhe = ctx
                    .params()
                    .cipher_suite
                    .map(|s| s.key_exchange_algorithm().uses_ecdhe())
                    .unwrap_or(true);
                if !ecdhe {
                    return Ok(None);
                }
            }
        }
        let start = out.len();
        ECPointFormatsExtension::uncompressed().serialize(out)?;
        Ok(Some(out.len() - start))
    }
}
