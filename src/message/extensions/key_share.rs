//! KeyShare extension (RFC 8446 Section 4.2.8)
//!
//! The key_share extension carries (EC)DHE public values. The client offers
//! one entry per group it guesses the server accepts, the server answers
//! with one entry, or with only a group in a HelloRetryRequest.

use crate::buffer::Buf;
use crate::message::NamedGroup;
use crate::Error;
use nom::bytes::complete::take;
use nom::number::complete::be_u16;
use nom::IResult;

/// A single key share entry: named group + public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyShareEntry {
    pub group: NamedGroup,
    pub key_exchange: Vec<u8>,
}

impl KeyShareEntry {
    pub fn new(group: NamedGroup, key_exchange: &[u8]) -> Self {
        KeyShareEntry {
            group,
            key_exchange: key_exchange.to_vec(),
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, group) = NamedGroup::parse(input)?;
        let (input, key_len) = be_u16(input)?;
        let (input, key) = take(key_len)(input)?;
        Ok((input, Self::new(group, key)))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push_u16(self.group.as_u16());
        output.push_u16_prefixed(&self.key_exchange)
    }
}

/// KeyShare extension for ClientHello.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyShareClientHello {
    pub entries: Vec<KeyShareEntry>,
}

impl KeyShareClientHello {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, list_len) = be_u16(input)?;
        let (input, list) = take(list_len)(input)?;
        let (_, entries) = crate::util::all_consumed(KeyShareEntry::parse)(list)?;
        Ok((input, Self { entries }))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        let pos = output.start_u16_len();
        for entry in &self.entries {
            entry.serialize(output)?;
        }
        output.finish_u16_len(pos)?;
        Ok(())
    }
}

/// KeyShare extension for ServerHello.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyShareServerHello {
    pub entry: KeyShareEntry,
}

impl KeyShareServerHello {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, entry) = KeyShareEntry::parse(input)?;
        Ok((input, Self { entry }))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        self.entry.serialize(output)
    }
}

/// KeyShare extension for HelloRetryRequest.
///
/// Contains only the selected group, telling the client which group to use
/// in its retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyShareHelloRetryRequest {
    pub selected_group: NamedGroup,
}

impl KeyShareHelloRetryRequest {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, selected_group) = NamedGroup::parse(input)?;
        Ok((input, Self { selected_group }))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push_u16(self.selected_group.as_u16());
        Ok(())
    }
}
