//! key_share (RFC 8446 4.2.8).
//!
//! The client offers one share for its preferred group. The server answers
//! with its own share when the client sent one for a group it accepts, or
//! asks for another group in a HelloRetryRequest. Peer values are validated
//! before anything is derived from them.

use super::parse_body;
use crate::buffer::Buf;
use crate::ext::{ExtensionContext, ExtensionHandler, MessageKind};
use crate::kx::{self, dh, ecdh, ffdhe, KeyExchangeMaterial};
use crate::message::extensions::{
    KeyShareClientHello, KeyShareEntry, KeyShareHelloRetryRequest, KeyShareServerHello,
};
use crate::message::{NamedGroup, Role};
use crate::session::Session;
use crate::{Config, Error};
use zeroize::Zeroizing;

pub struct KeyShare;

const ID: u16 = 0x0033;

/// Key share progress of one handshake.
#[derive(Debug, Default)]
pub struct KeyShareState {
    /// Our shares of the current ClientHello.
    pub offered: Vec<KeyExchangeMaterial>,
    /// Shares from the ClientHello, validated.
    pub peer_entries: Vec<KeyShareEntry>,
    /// Group requested by a HelloRetryRequest.
    pub retry_group: Option<NamedGroup>,
    /// The exchange that was completed.
    pub selected: Option<KeyExchangeMaterial>,
}

/// What the server does with the client's key shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyShareOutcome {
    /// Answer the share on this group in the ServerHello.
    Share(NamedGroup),
    /// Send a HelloRetryRequest for this group.
    RetryWith(NamedGroup),
}

fn choose(
    config: &Config,
    peer_groups: &[NamedGroup],
    state: Option<&KeyShareState>,
) -> Result<KeyShareOutcome, Error> {
    let entries = state.map(|s| s.peer_entries.as_slice()).unwrap_or(&[]);
    let usable = || config.groups().iter().copied().filter(|g| kx::can_generate(*g));

    if let Some(group) = usable().find(|g| entries.iter().any(|e| e.group == *g)) {
        return Ok(KeyShareOutcome::Share(group));
    }

    // A client may only be asked once.
    if state.and_then(|s| s.retry_group).is_some() {
        return Err(Error::NoCommonGroup);
    }

    usable()
        .find(|g| peer_groups.contains(g))
        .map(KeyShareOutcome::RetryWith)
        .ok_or(Error::NoCommonGroup)
}

/// Decide between answering a share and asking for another (server).
pub fn server_selection(session: &Session) -> Result<KeyShareOutcome, Error> {
    let state = session.ext_state.get::<KeyShareState>(ID)?;
    let outcome = choose(&session.config, &session.peer.groups, state)?;
    debug!("Key share selection: {:?}", outcome);
    Ok(outcome)
}

/// The secret of the completed exchange, taken out of the session.
pub fn take_shared_secret(session: &mut Session) -> Result<Option<Zeroizing<Vec<u8>>>, Error> {
    let Some(state) = session.ext_state.get_mut::<KeyShareState>(ID)? else {
        return Ok(None);
    };
    Ok(state
        .selected
        .as_mut()
        .and_then(|m| m.take_shared_secret()))
}

fn state_mut<'c>(ctx: &'c mut ExtensionContext<'_>) -> Result<&'c mut KeyShareState, Error> {
    if ctx.state::<KeyShareState>()?.is_none() {
        ctx.set_state(KeyShareState::default());
    }
    ctx.state_mut::<KeyShareState>()?
        .ok_or(Error::InvalidState("key share state"))
}

/// Check the shape of a share for a group we know. Unknown groups pass.
fn check_entry(entry: &KeyShareEntry) -> Result<(), Error> {
    if entry.group.is_ffdhe() {
        if let Some(known) = ffdhe::lookup(entry.group) {
            if entry.key_exchange.len() != known.prime.len() {
                return Err(Error::IllegalParameter("FFDHE key share of wrong size"));
            }
            dh::check_public_value(&entry.key_exchange, &known.prime)?;
        }
        return Ok(());
    }
    if ecdh::point_len(entry.group).is_some() {
        ecdh::check_point(entry.group, &entry.key_exchange)?;
    }
    Ok(())
}

impl KeyShare {
    fn receive_client_hello(ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        let hello = parse_body(data, KeyShareClientHello::parse)?;
        for (i, entry) in hello.entries.iter().enumerate() {
            if hello.entries[..i].iter().any(|e| e.group == entry.group) {
                return Err(Error::IllegalParameter("duplicate key share group"));
            }
            check_entry(entry)?;
        }

        let state = state_mut(ctx)?;
        if let Some(retry) = state.retry_group {
            let ok = hello.entries.len() == 1 && hello.entries[0].group == retry;
            if !ok {
                return Err(Error::IllegalParameter("key share does not match retry request"));
            }
        }
        trace!("Client key shares: {} entries", hello.entries.len());
        state.peer_entries = hello.entries;
        Ok(())
    }

    fn receive_server_hello(ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        let hello = parse_body(data, KeyShareServerHello::parse)?;
        let group = hello.entry.group;

        let state = state_mut(ctx)?;
        let index = state
            .offered
            .iter()
            .position(|m| m.group() == Some(group))
            .ok_or(Error::IllegalParameter("key share for a group we did not offer"))?;
        let mut material = state.offered.swap_remove(index);
        state.offered.clear();

        ecdh::accept_key_share(&mut material, group, &hello.entry.key_exchange)?;
        kx::derive_key_share(&mut material)?;
        state.selected = Some(material);

        debug!("Key share completed on {:?}", group);
        ctx.params_mut().group = Some(group);
        Ok(())
    }

    fn receive_retry(ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        let retry = parse_body(data, KeyShareHelloRetryRequest::parse)?;
        let group = retry.selected_group;

        let configured = ctx.config().groups().contains(&group) && kx::can_generate(group);
        let state = state_mut(ctx)?;
        if state.retry_group.is_some() {
            return Err(Error::IllegalParameter("second retry request"));
        }
        let already_offered = state.offered.iter().any(|m| m.group() == Some(group));
        if !configured || already_offered {
            return Err(Error::IllegalParameter("retry request for unusable group"));
        }

        debug!("Server asks for a key share on {:?}", group);
        state.retry_group = Some(group);
        state.offered.clear();
        Ok(())
    }

    fn send_client_hello(
        ctx: &mut ExtensionContext<'_>,
        out: &mut Buf,
    ) -> Result<Option<usize>, Error> {
        let config = ctx.session().config.clone();
        let family = ctx.family();
        let tls13 = config
            .versions()
            .iter()
            .any(|v| v.is_tls13() && v.family() == Some(family));
        if !tls13 {
            return Ok(None);
        }

        let state = state_mut(ctx)?;
        if state.offered.is_empty() {
            let group = match state.retry_group {
                Some(g) => g,
                None => config
                    .groups()
                    .iter()
                    .copied()
                    .find(|g| kx::can_generate(*g))
                    .ok_or(Error::NoCommonGroup)?,
            };
            let mut material = KeyExchangeMaterial::new();
            kx::generate_key_share(&mut material, &config, group)?;
            state.offered.push(material);
        }

        let entries = state
            .offered
            .iter()
            .filter_map(|m| m.group().map(|g| KeyShareEntry::new(g, m.local_public())))
            .collect();

        let start = out.len();
        KeyShareClientHello { entries }.serialize(out)?;
        Ok(Some(out.len() - start))
    }

    fn send_server_hello(
        ctx: &mut ExtensionContext<'_>,
        out: &mut Buf,
    ) -> Result<Option<usize>, Error> {
        let config = ctx.session().config.clone();
        let peer_groups = ctx.peer().groups.clone();

        let state = state_mut(ctx)?;
        let group = match choose(&config, &peer_groups, Some(&*state))? {
            KeyShareOutcome::Share(g) => g,
            KeyShareOutcome::RetryWith(_) => {
                return Err(Error::InvalidState("no usable key share, retry needed"))
            }
        };
        let peer_value = state
            .peer_entries
            .iter()
            .find(|e| e.group == group)
            .map(|e| e.key_exchange.clone())
            .ok_or(Error::InvalidState("no usable key share"))?;

        let mut material = KeyExchangeMaterial::new();
        let public = kx::generate_key_share(&mut material, &config, group)?;
        ecdh::accept_key_share(&mut material, group, &peer_value)?;
        kx::derive_key_share(&mut material)?;
        state.selected = Some(material);

        debug!("Key share completed on {:?}", group);
        ctx.params_mut().group = Some(group);

        let start = out.len();
        KeyShareServerHello {
            entry: KeyShareEntry::new(group, &public),
        }
        .serialize(out)?;
        Ok(Some(out.len() - start))
    }

    fn send_retry(ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error> {
        let config = ctx.session().config.clone();
        let peer_groups = ctx.peer().groups.clone();

        let state = state_mut(ctx)?;
        let group = match choose(&config, &peer_groups, Some(&*state))? {
            KeyShareOutcome::RetryWith(g) => g,
            // The retry is for another reason, the share is fine.
            KeyShareOutcome::Share(_) => return Ok(None),
        };
        state.retry_group = Some(group);
        state.peer_entries.clear();

        let start = out.len();
        KeyShareHelloRetryRequest {
            selected_group: group,
        }
        .serialize(out)?;
        Ok(Some(out.len() - start))
    }
}

impl ExtensionHandler for KeyShare {
    fn receive(&self, ctx: &mut ExtensionContext<'_>, data: &[u8]) -> Result<(), Error> {
        match ctx.message() {
            MessageKind::ClientHello => Self::receive_client_hello(ctx, data),
            MessageKind::ServerHello13 => Self::receive_server_hello(ctx, data),
            MessageKind::HelloRetryRequest => Self::receive_retry(ctx, data),
            _ => Err(Error::IllegalParameter("key_share in unexpected message")),
        }
    }

    fn send(&self, ctx: &mut ExtensionContext<'_>, out: &mut Buf) -> Result<Option<usize>, Error> {
        match (ctx.role(), ctx.message()) {
            (Role::Client, MessageKind::ClientHello) => Self::send_client_hello(ctx, out),
            (Role::Server, MessageKind::ServerHello13) => Self::send_server_hello(ctx, out),
            (Role::Server, MessageKind::HelloRetryRequest) => Self::send_retry(ctx, out),
            _ => Ok(None),
        }
    }
}
