//! Finite field Diffie-Hellman parameters.
//!
//! The server sends `p`, `g` and `Ys` in its key exchange message, the
//! client answers with `Yc`. Peer values are checked against the local
//! prime size policy and for `1 < Y < p - 1` before a secret is derived.

use num_bigint::BigUint;
use zeroize::Zeroizing;

use super::ffdhe::{self, prime_bits, strip_leading_zeros};
use super::{check_dh_policy, KeyExchangeMaterial};
use crate::buffer::Buf;
use crate::crypto::generate_dh_keypair;
use crate::message::{ClientDhPublic, DhParams, NamedGroup, ProtocolVersion};
use crate::session::{SessionFlags, SessionParameters};
use crate::{Config, Error};

/// Generate our key for `group` and write `ServerDHParams`.
pub fn generate_server_params(
    material: &mut KeyExchangeMaterial,
    config: &Config,
    group: NamedGroup,
    out: &mut Buf,
) -> Result<(), Error> {
    let params = ffdhe::lookup(group).ok_or(Error::UnsupportedGroup(group.as_u16()))?;
    let (key, public) = generate_dh_keypair(&params.prime, &params.generator, config.dh_q_bits())?;

    DhParams::new(&params.prime, &params.generator, &public).serialize(out)?;
    trace!("Generated {:?} server key share of {} bytes", group, public.len());

    material.group = Some(group);
    material.dh_params = Some((params.prime.clone(), params.generator.clone()));
    material.local_key = Some(key);
    material.local_public = public;
    Ok(())
}

/// Parse and validate `ServerDHParams`.
///
/// Returns the input following the params, normally the signature.
pub fn parse_server_params<'a>(
    material: &mut KeyExchangeMaterial,
    input: &'a [u8],
    config: &Config,
    params: &mut SessionParameters,
) -> Result<&'a [u8], Error> {
    let (rest, dh) = DhParams::parse(input)?;

    for value in [dh.p, dh.g, dh.ys] {
        if strip_leading_zeros(value).is_empty() {
            return Err(Error::IllegalParameter("zero DH parameter"));
        }
    }

    let bits = prime_bits(dh.p);
    params.dh_prime_bits = Some(bits);

    match ffdhe::identify(dh.p, dh.g) {
        Some(known) => {
            debug!("Server DH params are {:?}", known.group);
            params.flags.insert(SessionFlags::USED_FFDHE);
            params.group = Some(known.group);
            material.group = Some(known.group);
            check_dh_policy(config, bits, bits >= config.min_dh_bits())?;
        }
        None => {
            let acceptable = bits >= config.min_dh_bits() && bits <= config.max_dh_bits();
            check_dh_policy(config, bits, acceptable)?;
        }
    }

    check_public_value(dh.ys, dh.p)?;

    material.dh_params = Some((dh.p.to_vec(), dh.g.to_vec()));
    material.peer_public = dh.ys.to_vec();
    Ok(rest)
}

/// Generate our key with the server's `(p, g)` and write `Yc`.
pub fn generate_client_public(
    material: &mut KeyExchangeMaterial,
    config: &Config,
    out: &mut Buf,
) -> Result<(), Error> {
    let (prime, generator) = material
        .dh_params
        .as_ref()
        .ok_or(Error::InvalidState("no DH params received"))?;
    let (key, public) = generate_dh_keypair(prime, generator, config.dh_q_bits())?;

    ClientDhPublic(&public).serialize(out)?;

    material.local_key = Some(key);
    material.local_public = public;
    Ok(())
}

/// Parse and validate the client's `Yc`.
///
/// Returns the input following the value.
pub fn parse_client_public<'a>(
    material: &mut KeyExchangeMaterial,
    input: &'a [u8],
) -> Result<&'a [u8], Error> {
    let (rest, yc) = ClientDhPublic::parse(input)?;
    let (prime, _) = material
        .dh_params
        .as_ref()
        .ok_or(Error::InvalidState("no DH params generated"))?;

    if yc.0.is_empty() {
        return Err(Error::UnexpectedPacketLength("empty DH public value"));
    }
    check_public_value(yc.0, prime)?;

    material.peer_public = yc.0.to_vec();
    Ok(rest)
}

/// Derive the shared secret.
///
/// TLS 1.3 keeps the secret at the size of the prime, earlier versions
/// strip leading zero bytes.
pub fn derive(material: &mut KeyExchangeMaterial, version: ProtocolVersion) -> Result<(), Error> {
    let prime_len = material
        .dh_params
        .as_ref()
        .map(|(p, _)| strip_leading_zeros(p).len())
        .ok_or(Error::InvalidState("no DH params"))?;

    let raw = material.derive_raw()?;
    let minimal = strip_leading_zeros(&raw);

    let secret = if version.is_tls13() {
        let mut padded = Zeroizing::new(vec![0; prime_len.saturating_sub(minimal.len())]);
        padded.extend_from_slice(minimal);
        padded
    } else {
        Zeroizing::new(minimal.to_vec())
    };

    material.shared_secret = Some(secret);
    Ok(())
}

/// `1 < y < p - 1`.
pub(crate) fn check_public_value(y: &[u8], p: &[u8]) -> Result<(), Error> {
    let y = BigUint::from_bytes_be(y);
    let p = BigUint::from_bytes_be(p);
    let one = BigUint::from(1u8);

    if p <= one || y <= one || y >= &p - &one {
        return Err(Error::IllegalParameter("DH public value out of range"));
    }
    Ok(())
}
