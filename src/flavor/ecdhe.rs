//! Ephemeral elliptic curve Diffie-Hellman of ECDHE_RSA, ECDHE_ECDSA,
//! ECDH_anon and ECDHE_PSK.

use zeroize::Zeroizing;

use crate::buffer::Buf;
use crate::kx::{self, ecdh, KeyExchangeMaterial};
use crate::session::Session;
use crate::Error;

/// Negotiate the curve and write `ServerECDHParams`.
pub(super) fn write_server_params(
    material: &mut KeyExchangeMaterial,
    session: &mut Session,
    out: &mut Buf,
) -> Result<(), Error> {
    let group = kx::negotiate_ec_group(&session.config, &session.peer)?;
    session.params.group = Some(group);
    ecdh::generate_server_params(material, &session.config, group, out)
}

/// Read and check `ServerECDHParams`, returning what follows them.
pub(super) fn read_server_params<'a>(
    material: &mut KeyExchangeMaterial,
    session: &mut Session,
    input: &'a [u8],
) -> Result<&'a [u8], Error> {
    ecdh::parse_server_params(material, input, &session.config, &mut session.params)
}

/// Write our point and derive the secret.
pub(super) fn write_client_public(
    material: &mut KeyExchangeMaterial,
    out: &mut Buf,
) -> Result<Zeroizing<Vec<u8>>, Error> {
    ecdh::generate_client_public(material, out)?;
    derive(material)
}

/// Read the client point and derive the secret.
pub(super) fn read_client_public<'a>(
    material: &mut KeyExchangeMaterial,
    input: &'a [u8],
) -> Result<(&'a [u8], Zeroizing<Vec<u8>>), Error> {
    let rest = ecdh::parse_client_public(material, input)?;
    let secret = derive(material)?;
    Ok((rest, secret))
}

fn derive(material: &mut KeyExchangeMaterial) -> Result<Zeroizing<Vec<u8>>, Error> {
    ecdh::derive(material)?;
    material
        .take_shared_secret()
        .ok_or(Error::InvalidState("ECDH secret not derived"))
}
