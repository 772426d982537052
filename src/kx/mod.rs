//! Key exchange parameter codecs for finite field and elliptic curve
//! Diffie-Hellman, and the PSK premaster format.
//!
//! Every function here works on a [`KeyExchangeMaterial`], which keeps the
//! ephemeral secret, both public values and the derived secret for one
//! handshake. The shared secret is only computed after the peer's public
//! value passed validation.

pub mod dh;
pub mod ecdh;
pub mod ffdhe;
pub mod psk_mix;

use zeroize::Zeroizing;

use crate::credentials::PeerCapabilities;
use crate::crypto::EphemeralKey;
use crate::message::NamedGroup;
use crate::session::{SessionFlags, SessionParameters};
use crate::{Config, Error};

/// Server side progress through the key exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerKxState {
    Idle,
    ParamsGenerated,
    Sent,
    Derived,
    /// A step failed. No further step is accepted.
    Failed,
}

/// Client side progress through the key exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKxState {
    Idle,
    ParamsReceived,
    Validated,
    Derived,
}

/// Ephemeral key material of one exchange.
///
/// Secrets are wiped when the material is dropped.
#[derive(Default)]
pub struct KeyExchangeMaterial {
    pub(crate) group: Option<NamedGroup>,
    /// `(p, g)` of a finite field exchange.
    pub(crate) dh_params: Option<(Vec<u8>, Vec<u8>)>,
    pub(crate) local_key: Option<EphemeralKey>,
    pub(crate) local_public: Vec<u8>,
    pub(crate) peer_public: Vec<u8>,
    pub(crate) shared_secret: Option<Zeroizing<Vec<u8>>>,
}

impl KeyExchangeMaterial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&self) -> Option<NamedGroup> {
        self.group
    }

    pub fn local_public(&self) -> &[u8] {
        &self.local_public
    }

    pub fn peer_public(&self) -> &[u8] {
        &self.peer_public
    }

    pub fn shared_secret(&self) -> Option<&[u8]> {
        self.shared_secret.as_ref().map(|s| s.as_slice())
    }

    /// Take the derived secret out, leaving none behind.
    pub fn take_shared_secret(&mut self) -> Option<Zeroizing<Vec<u8>>> {
        self.shared_secret.take()
    }

    /// Run the ephemeral key against the validated peer value.
    pub(crate) fn derive_raw(&mut self) -> Result<Zeroizing<Vec<u8>>, Error> {
        if self.peer_public.is_empty() {
            return Err(Error::InvalidState("peer public value not received"));
        }
        let key = self
            .local_key
            .take()
            .ok_or(Error::InvalidState("no local key to derive with"))?;
        key.derive(&self.peer_public)
    }
}

impl std::fmt::Debug for KeyExchangeMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyExchangeMaterial")
            .field("group", &self.group)
            .field("local_public_len", &self.local_public.len())
            .field("peer_public_len", &self.peer_public.len())
            .field("derived", &self.shared_secret.is_some())
            .finish_non_exhaustive()
    }
}

/// Groups an ephemeral key can be generated for.
pub(crate) fn can_generate(group: NamedGroup) -> bool {
    matches!(
        group,
        NamedGroup::Secp256r1 | NamedGroup::Secp384r1 | NamedGroup::X25519
    ) || ffdhe::lookup(group).is_some()
}

/// Pick the curve for an ECDHE suite.
///
/// Our preference order wins. A peer that sent no supported_groups gets
/// secp256r1, if we have it enabled.
pub fn negotiate_ec_group(config: &Config, peer: &PeerCapabilities) -> Result<NamedGroup, Error> {
    if peer.groups.is_empty() {
        if config.groups().contains(&NamedGroup::Secp256r1) {
            debug!("Peer sent no groups, defaulting to secp256r1");
            return Ok(NamedGroup::Secp256r1);
        }
        return Err(Error::NoCommonGroup);
    }

    let group = config
        .groups()
        .iter()
        .copied()
        .filter(|g| g.is_ec() && can_generate(*g))
        .find(|g| peer.groups.contains(g))
        .ok_or(Error::NoCommonGroup)?;

    debug!("Negotiated EC group {:?}", group);
    Ok(group)
}

/// Pick the finite field group for a DHE suite.
///
/// When the peer listed FFDHE groups one of them must be used and
/// `USED_FFDHE` is set. Otherwise the configured fallback group is used.
pub fn negotiate_dh_group(
    config: &Config,
    peer: &PeerCapabilities,
    params: &mut SessionParameters,
) -> Result<NamedGroup, Error> {
    let peer_offers_ffdhe = peer.groups.iter().any(|g| g.is_ffdhe());
    if !peer_offers_ffdhe {
        trace!("Peer lists no FFDHE group, using {:?}", config.dh_group());
        return Ok(config.dh_group());
    }

    let group = config
        .groups()
        .iter()
        .copied()
        .filter(|g| g.is_ffdhe() && ffdhe::lookup(*g).is_some())
        .find(|g| peer.groups.contains(g))
        .ok_or(Error::NoCommonGroup)?;

    params.flags.insert(SessionFlags::USED_FFDHE);
    params.group = Some(group);
    debug!("Negotiated FFDHE group {:?}", group);
    Ok(group)
}

/// Generate our key_share entry on `group`.
///
/// FFDHE values are left padded to the size of the prime (RFC 8446 4.2.8.1).
pub(crate) fn generate_key_share(
    material: &mut KeyExchangeMaterial,
    config: &Config,
    group: NamedGroup,
) -> Result<Vec<u8>, Error> {
    let (key, public) = match ffdhe::lookup(group) {
        Some(known) => {
            let (key, public) =
                crate::crypto::generate_dh_keypair(&known.prime, &known.generator, config.dh_q_bits())?;
            let mut padded = vec![0; known.prime.len().saturating_sub(public.len())];
            padded.extend_from_slice(&public);
            material.dh_params = Some((known.prime.clone(), known.generator.clone()));
            (key, padded)
        }
        None => crate::crypto::generate_keypair(group)?,
    };
    material.group = Some(group);
    material.local_key = Some(key);
    material.local_public = public.clone();
    Ok(public)
}

/// Derive the secret of a key_share exchange.
pub(crate) fn derive_key_share(material: &mut KeyExchangeMaterial) -> Result<(), Error> {
    match material.group {
        Some(g) if g.is_ffdhe() => dh::derive(material, crate::message::ProtocolVersion::TLS1_3),
        Some(_) => ecdh::derive(material),
        None => Err(Error::InvalidState("no key share group")),
    }
}

/// Apply the DH prime size policy.
///
/// Violations are errors unless the config tolerates them.
pub(crate) fn check_dh_policy(config: &Config, bits: usize, acceptable: bool) -> Result<(), Error> {
    if acceptable {
        return Ok(());
    }
    let err = Error::DhPrimeUnacceptable(bits);
    if err.is_fatal(config) {
        return Err(err);
    }
    warn!(
        "Tolerating DH prime of {} bits outside [{}, {}]",
        bits,
        config.min_dh_bits(),
        config.max_dh_bits()
    );
    Ok(())
}
