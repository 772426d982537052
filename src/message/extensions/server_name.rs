//! Server Name Indication extension (RFC 6066 Section 3).

use crate::buffer::Buf;
use crate::Error;
use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerNameType {
    HostName,
    Unknown(u8),
}

impl ServerNameType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ServerNameType::HostName,
            _ => ServerNameType::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            ServerNameType::HostName => 0,
            ServerNameType::Unknown(value) => *value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerName {
    pub name_type: ServerNameType,
    pub name: Vec<u8>,
}

impl ServerName {
    pub fn host_name(name: &str) -> Self {
        ServerName {
            name_type: ServerNameType::HostName,
            name: name.as_bytes().to_vec(),
        }
    }

    fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, name_type) = be_u8(input)?;
        let (input, len) = be_u16(input)?;
        let (input, name) = take(len)(input)?;
        Ok((
            input,
            ServerName {
                name_type: ServerNameType::from_u8(name_type),
                name: name.to_vec(),
            },
        ))
    }
}

/// `ServerNameList` as sent in a ClientHello.
///
/// The server acknowledges with an empty body, which is not parsed here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerNameExtension {
    pub names: Vec<ServerName>,
}

impl ServerNameExtension {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, list_len) = be_u16(input)?;
        let (input, list) = take(list_len)(input)?;
        let (_, names) = crate::util::all_consumed(ServerName::parse)(list)?;
        Ok((input, ServerNameExtension { names }))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        let pos = output.start_u16_len();
        for name in &self.names {
            output.push(name.name_type.as_u8());
            output.push_u16_prefixed(&name.name)?;
        }
        output.finish_u16_len(pos)?;
        Ok(())
    }
}
