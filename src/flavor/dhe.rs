//! Ephemeral finite field Diffie-Hellman of DHE_RSA, DHE_DSS, DH_anon and
//! DHE_PSK.

use zeroize::Zeroizing;

use crate::buffer::Buf;
use crate::kx::{self, dh, KeyExchangeMaterial};
use crate::message::ProtocolVersion;
use crate::session::Session;
use crate::Error;

/// Negotiate the group and write `ServerDHParams`.
pub(super) fn write_server_params(
    material: &mut KeyExchangeMaterial,
    session: &mut Session,
    out: &mut Buf,
) -> Result<(), Error> {
    let group = kx::negotiate_dh_group(&session.config, &session.peer, &mut session.params)?;
    dh::generate_server_params(material, &session.config, group, out)
}

/// Read and check `ServerDHParams`, returning what follows them.
pub(super) fn read_server_params<'a>(
    material: &mut KeyExchangeMaterial,
    session: &mut Session,
    input: &'a [u8],
) -> Result<&'a [u8], Error> {
    dh::parse_server_params(material, input, &session.config, &mut session.params)
}

/// Write `Yc` and derive the secret.
pub(super) fn write_client_public(
    material: &mut KeyExchangeMaterial,
    session: &Session,
    version: ProtocolVersion,
    out: &mut Buf,
) -> Result<Zeroizing<Vec<u8>>, Error> {
    dh::generate_client_public(material, &session.config, out)?;
    derive(material, version)
}

/// Read `Yc` and derive the secret.
pub(super) fn read_client_public<'a>(
    material: &mut KeyExchangeMaterial,
    version: ProtocolVersion,
    input: &'a [u8],
) -> Result<(&'a [u8], Zeroizing<Vec<u8>>), Error> {
    let rest = dh::parse_client_public(material, input)?;
    let secret = derive(material, version)?;
    Ok((rest, secret))
}

fn derive(material: &mut KeyExchangeMaterial, version: ProtocolVersion) -> Result<Zeroizing<Vec<u8>>, Error> {
    dh::derive(material, version)?;
    material
        .take_shared_secret()
        .ok_or(Error::InvalidState("DH secret not derived"))
}
