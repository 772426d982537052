//! supported_versions (RFC 8446 4.2.1).
//!
//! The server picks the first of its configured versions that the client
//! offers in the session's protocol family.

use super::parse_body;
use crate::buffer::Buf;
use crate::ext::{ExtensionContext, ExtensionHandler};
use crate::message::extensions::{SupportedVersionsClientHello, SupportedVersionsServerHello};
use crate::message::{ProtocolVersion, Role};
use crate::Error;

pub struct SupportedVersions;

fn local_versions(ctx: &ExtensionContext<'_>) -> Vec<ProtocolVersion> {
    ctx.config()
        .versions()
        .iter()
        .copied()
        .filter(|v| v.family() == Some(ctx.family()))
        .collect()
}

impl ExtensionHandler for SupportedVersions {
    fn receive(&self, ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        let ours = local_versions(ctx);

        match ctx.role() {
            Role::Server => {
                let offered = parse_body(data, SupportedVersionsClientHello::parse)?;
                let version = ours
                    .iter()
                    .copied()
                    .find(|v| offered.versions.contains(v))
                    .ok_or(Error::NoCommonVersion)?;

                debug!("Negotiated {} from supported_versions", version);
                ctx.params_mut().version = Some(version);
                ctx.set_state(offered.versions);
            }
            Role::Client => {
                let selected = parse_body(data, SupportedVersionsServerHello::parse)?;
                let version = selected.selected_version;
                if !version.is_tls13() || !ours.contains(&version) {
                    debug!("Server selected a version we did not offer: {}", version);
                    return Err(Error::IllegalParameter("selected version not offered"));
                }
                debug!("Server selected {}", version);
                ctx.params_mut().version = Some(version);
            }
        }
        Ok(())
    }

    fn send(&self, ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error> {
        let start = out.len();
        match ctx.role() {
            Role::Client => {
                let ours = local_versions(ctx);
                if !ours.iter().any(|v| v.is_tls13()) {
                    return Ok(None);
                }
                SupportedVersionsClientHello::new(&ours).serialize(out)?;
            }
            Role::Server => {
                let Some(version) = ctx.params().version.filter(|v| v.is_tls13()) else {
                    return Ok(None);
                };
                SupportedVersionsServerHello {
                    selected_version: version,
                }
                .serialize(out)?;
            }
        }
        Ok(Some(out.len() - start))
    }
}
