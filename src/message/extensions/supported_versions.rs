//! SupportedVersions extension (RFC 8446 Section 4.2.1)
//!
//! From TLS 1.3 on, version negotiation happens via this extension rather
//! than the legacy version field. The client sends a list of supported
//! versions, and the server responds with a single selected version.

use crate::buffer::Buf;
use crate::message::ProtocolVersion;
use crate::Error;
use nom::bytes::complete::take;
use nom::number::complete::be_u8;
use nom::IResult;

/// SupportedVersions extension for ClientHello, in preference order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportedVersionsClientHello {
    pub versions: Vec<ProtocolVersion>,
}

impl SupportedVersionsClientHello {
    pub fn new(versions: &[ProtocolVersion]) -> Self {
        SupportedVersionsClientHello {
            versions: versions.to_vec(),
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, list_len) = be_u8(input)?;
        let (input, list) = take(list_len)(input)?;
        let (_, versions) = crate::util::all_consumed(ProtocolVersion::parse)(list)?;
        Ok((input, Self { versions }))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push((self.versions.len() * 2) as u8);
        for version in &self.versions {
            output.push_u16(version.as_u16());
        }
        Ok(())
    }
}

/// SupportedVersions extension for ServerHello / HelloRetryRequest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedVersionsServerHello {
    pub selected_version: ProtocolVersion,
}

impl SupportedVersionsServerHello {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, selected_version) = ProtocolVersion::parse(input)?;
        Ok((input, Self { selected_version }))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push_u16(self.selected_version.as_u16());
        Ok(())
    }
}
