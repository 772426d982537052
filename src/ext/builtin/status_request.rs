//! status_request (RFC 6066 8), OCSP stapling in TLS 1.2.

use super::{expect_empty, parse_body};
use crate::buffer::Buf;
use crate::ext::{ExtensionContext, ExtensionHandler};
use crate::message::extensions::{CertificateStatusType, StatusRequestExtension};
use crate::message::Role;
use crate::session::SessionFlags;
use crate::Error;

pub struct StatusRequest;

impl ExtensionHandler for StatusRequest {
    fn receive(&self, ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        match ctx.role() {
            Role::Server => {
                let request = parse_body(data, StatusRequestExtension::parse)?;
                if request.status_type != CertificateStatusType::Ocsp {
                    trace!("Ignoring status request type {:?}", request.status_type);
                    return Ok(());
                }
                ctx.params_mut().flags.insert(SessionFlags::OCSP_REQUESTED);
            }
            Role::Client => {
                // The server will send CertificateStatus.
                expect_empty(data)?;
                ctx.params_mut().flags.insert(SessionFlags::OCSP_REQUESTED);
            }
        }
        Ok(())
    }

    fn send(&self, ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error> {
        match ctx.role() {
            Role::Client => {
                if !ctx.config().request_ocsp() {
                    return Ok(None);
                }
                let start = out.len();
                StatusRequestExtension::ocsp().serialize(out)?;
                Ok(Some(out.len() - start))
            }
            Role::Server => {
                let requested = ctx.params().flags.contains(SessionFlags::OCSP_REQUESTED);
                let have_response = ctx
                    .session()
                    .selected
                    .as_ref()
                    .map(|s| s.ocsp.is_some())
                    .unwrap_or(false);
                if requested && have_response {
                    Ok(Some(0))
                } else {
                    Ok(None)
                }
            }
        }
    }
}
