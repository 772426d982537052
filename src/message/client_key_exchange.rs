use crate::buffer::Buf;
use crate::Error;
use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

/// `ClientDiffieHellmanPublic` with explicit encoding (RFC 5246 7.4.7.2).
#[derive(Debug, PartialEq, Eq)]
pub struct ClientDhPublic<'a>(pub &'a [u8]);

impl<'a> ClientDhPublic<'a> {
    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], ClientDhPublic<'a>> {
        let (input, len) = be_u16(input)?;
        let (input, yc) = take(len)(input)?;
        Ok((input, ClientDhPublic(yc)))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push_u16_prefixed(self.0)
    }
}

/// `ClientECDiffieHellmanPublic` (RFC 8422 5.7).
#[derive(Debug, PartialEq, Eq)]
pub struct ClientEcdhPublic<'a>(pub &'a [u8]);

impl<'a> ClientEcdhPublic<'a> {
    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], ClientEcdhPublic<'a>> {
        let (input, len) = be_u8(input)?;
        let (input, point) = take(len)(input)?;
        Ok((input, ClientEcdhPublic(point)))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push_u8_prefixed(self.0)
    }
}

/// `EncryptedPreMasterSecret` (RFC 5246 7.4.7.1).
///
/// SSL 3.0 sends the ciphertext without the u16 length.
#[derive(Debug, PartialEq, Eq)]
pub struct EncryptedPreMasterSecret<'a>(pub &'a [u8]);

impl<'a> EncryptedPreMasterSecret<'a> {
    pub fn parse(
        input: &'a [u8],
        length_prefixed: bool,
    ) -> IResult<&'a [u8], EncryptedPreMasterSecret<'a>> {
        if !length_prefixed {
            return Ok((&input[input.len()..], EncryptedPreMasterSecret(input)));
        }
        let (input, len) = be_u16(input)?;
        let (input, ciphertext) = take(len)(input)?;
        Ok((input, EncryptedPreMasterSecret(ciphertext)))
    }

    pub fn serialize(&self, output: &mut Buf, length_prefixed: bool) -> Result<(), Error> {
        if length_prefixed {
            output.push_u16_prefixed(self.0)
        } else {
            output.extend_from_slice(self.0);
            Ok(())
        }
    }
}

/// PSK identity sent by the client (RFC 4279 2).
#[derive(Debug, PartialEq, Eq)]
pub struct PskIdentity<'a>(pub &'a [u8]);

impl<'a> PskIdentity<'a> {
    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], PskIdentity<'a>> {
        let (input, len) = be_u16(input)?;
        let (input, identity) = take(len)(input)?;
        Ok((input, PskIdentity(identity)))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push_u16_prefixed(self.0)
    }
}
