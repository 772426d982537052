//! pre_shared_key (RFC 8446 4.2.11).
//!
//! Binder computation needs the transcript hash and is left to the
//! handshake driver. This handler carries the identities and the selected
//! index, and checks the index against what was offered.

use super::parse_body;
use crate::buffer::Buf;
use crate::ext::{ExtensionContext, ExtensionHandler};
use crate::message::extensions::{OfferedPsks, SelectedPsk};
use crate::message::Role;
use crate::session::{Session, SessionFlags};
use crate::Error;

pub struct PreSharedKey;

const ID: u16 = 0x0029;

/// Identities offered by the client and the one the server picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PskExtensionState {
    pub offered: OfferedPsks,
    pub selected: Option<u16>,
}

/// Offer PSKs in the next ClientHello.
pub fn offer(session: &mut Session, offered: OfferedPsks) -> Result<(), Error> {
    if offered.identities.is_empty() || offered.identities.len() != offered.binders.len() {
        return Err(Error::InvalidState("each PSK identity needs one binder"));
    }
    session.ext_state.set(
        ID,
        PskExtensionState {
            offered,
            selected: None,
        },
    );
    Ok(())
}

/// Accept the client's identity at `index` (server).
pub fn select(session: &mut Session, index: u16) -> Result<(), Error> {
    let state = session
        .ext_state
        .get_mut::<PskExtensionState>(ID)?
        .ok_or(Error::InvalidState("no PSK offered"))?;
    if usize::from(index) >= state.offered.identities.len() {
        return Err(Error::InvalidState("PSK index out of range"));
    }
    state.selected = Some(index);
    session.params.flags.insert(SessionFlags::RESUMED);
    Ok(())
}

impl ExtensionHandler for PreSharedKey {
    fn receive(&self, ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        match ctx.role() {
            Role::Server => {
                let offered = parse_body(data, OfferedPsks::parse)?;
                if offered.identities.is_empty()
                    || offered.identities.len() != offered.binders.len()
                {
                    return Err(Error::IllegalParameter("PSK identities and binders differ"));
                }
                trace!("Client offered {} PSK identities", offered.identities.len());
                ctx.set_state(PskExtensionState {
                    offered,
                    selected: None,
                });
            }
            Role::Client => {
                let selected = parse_body(data, SelectedPsk::parse)?;
                let state = ctx
                    .state_mut::<PskExtensionState>()?
                    .ok_or(Error::IllegalExtension(ID, "no PSK offered"))?;
                if usize::from(selected.0) >= state.offered.identities.len() {
                    return Err(Error::IllegalParameter("selected PSK identity out of range"));
                }
                state.selected = Some(selected.0);
                debug!("Server selected PSK identity {}", selected.0);
                ctx.params_mut().flags.insert(SessionFlags::RESUMED);
            }
        }
        Ok(())
    }

    fn send(&self, ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error> {
        let start = out.len();
        let Some(state) = ctx.state::<PskExtensionState>()? else {
            return Ok(None);
        };
        match ctx.role() {
            Role::Client => state.offered.serialize(out)?,
            Role::Server => match state.selected {
                Some(index) => SelectedPsk(index).serialize(out)?,
                None => return Ok(None),
            },
        }
        Ok(Some(out.len() - start))
    }
}
