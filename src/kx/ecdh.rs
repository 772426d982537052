//! Elliptic curve Diffie-Hellman parameters (RFC 8422).

use super::KeyExchangeMaterial;
use crate::buffer::Buf;
use crate::crypto::generate_keypair;
use crate::message::{ClientEcdhPublic, CurveType, EcdhParams, NamedGroup};
use crate::session::SessionParameters;
use crate::{Config, Error};

/// Wire length of a public value on `group`.
///
/// NIST curves use the uncompressed point form.
pub fn point_len(group: NamedGroup) -> Option<usize> {
    match group {
        NamedGroup::Secp256r1 => Some(2 * 32 + 1),
        NamedGroup::Secp384r1 => Some(2 * 48 + 1),
        NamedGroup::Secp521r1 => Some(2 * 66 + 1),
        NamedGroup::X25519 => Some(32),
        NamedGroup::X448 => Some(56),
        _ => None,
    }
}

/// Check the encoding of a peer public value on `group`.
pub fn check_point(group: NamedGroup, point: &[u8]) -> Result<(), Error> {
    if point.is_empty() {
        return Err(Error::UnexpectedPacketLength("empty EC point"));
    }
    let expected = point_len(group).ok_or(Error::UnsupportedGroup(group.as_u16()))?;
    if point.len() != expected {
        return Err(Error::IllegalParameter("EC point of wrong size"));
    }
    let uncompressed = matches!(
        group,
        NamedGroup::Secp256r1 | NamedGroup::Secp384r1 | NamedGroup::Secp521r1
    );
    if uncompressed && point[0] != 0x04 {
        return Err(Error::IllegalParameter("EC point not uncompressed"));
    }
    Ok(())
}

/// Peer X25519 values are used with the top bit cleared (RFC 7748 5).
fn normalize(group: NamedGroup, point: &[u8]) -> Vec<u8> {
    let mut point = point.to_vec();
    if group == NamedGroup::X25519 {
        if let Some(last) = point.last_mut() {
            *last &= 0x7f;
        }
    }
    point
}

/// Generate our key on `group` and write `ServerECDHParams`.
pub fn generate_server_params(
    material: &mut KeyExchangeMaterial,
    config: &Config,
    group: NamedGroup,
    out: &mut Buf,
) -> Result<(), Error> {
    if !group.is_ec() || !config.groups().contains(&group) {
        return Err(Error::UnsupportedGroup(group.as_u16()));
    }
    let (key, public) = generate_keypair(group)?;
    EcdhParams::new(group, &public).serialize(out)?;
    trace!("Generated {:?} server key share", group);

    material.group = Some(group);
    material.local_key = Some(key);
    material.local_public = public;
    Ok(())
}

/// Parse and validate `ServerECDHParams`.
///
/// Returns the input following the params, normally the signature.
pub fn parse_server_params<'a>(
    material: &mut KeyExchangeMaterial,
    input: &'a [u8],
    config: &Config,
    params: &mut SessionParameters,
) -> Result<&'a [u8], Error> {
    let (rest, ecdh) = EcdhParams::parse(input)?;

    if ecdh.curve_type != CurveType::NamedCurve {
        return Err(Error::IllegalParameter("only named curves are supported"));
    }
    let group = ecdh.named_group;
    if !group.is_ec() || !config.groups().contains(&group) {
        warn!("Server picked a group we did not offer: {:?}", group);
        return Err(Error::IllegalParameter("server group not enabled"));
    }
    check_point(group, ecdh.public_key)?;

    params.group = Some(group);
    material.group = Some(group);
    material.peer_public = normalize(group, ecdh.public_key);
    Ok(rest)
}

/// Generate our key on the server's group and write the client point.
pub fn generate_client_public(material: &mut KeyExchangeMaterial, out: &mut Buf) -> Result<(), Error> {
    let group = material
        .group
        .ok_or(Error::InvalidState("no EC group negotiated"))?;
    let (key, public) = generate_keypair(group)?;
    ClientEcdhPublic(&public).serialize(out)?;

    material.local_key = Some(key);
    material.local_public = public;
    Ok(())
}

/// Parse and validate the client point.
///
/// Returns the input following the point.
pub fn parse_client_public<'a>(
    material: &mut KeyExchangeMaterial,
    input: &'a [u8],
) -> Result<&'a [u8], Error> {
    let group = material
        .group
        .ok_or(Error::InvalidState("no EC group negotiated"))?;
    let (rest, point) = ClientEcdhPublic::parse(input)?;
    check_point(group, point.0)?;
    material.peer_public = normalize(group, point.0);
    Ok(rest)
}

/// Validate a key_share entry and store it as the peer value.
pub(crate) fn accept_key_share(
    material: &mut KeyExchangeMaterial,
    group: NamedGroup,
    key_exchange: &[u8],
) -> Result<(), Error> {
    if group.is_ffdhe() {
        let known = super::ffdhe::lookup(group).ok_or(Error::UnsupportedGroup(group.as_u16()))?;
        if key_exchange.len() != known.prime.len() {
            return Err(Error::IllegalParameter("FFDHE key share of wrong size"));
        }
        super::dh::check_public_value(key_exchange, &known.prime)?;
        material.dh_params = Some((known.prime.clone(), known.generator.clone()));
        material.group = Some(group);
        material.peer_public = key_exchange.to_vec();
        return Ok(());
    }
    check_point(group, key_exchange)?;
    material.group = Some(group);
    material.peer_public = normalize(group, key_exchange);
    Ok(())
}

/// Derive the shared secret, the x coordinate at field size.
pub fn derive(material: &mut KeyExchangeMaterial) -> Result<(), Error> {
    let secret = material.derive_raw()?;
    material.shared_secret = Some(secret);
    Ok(())
}
