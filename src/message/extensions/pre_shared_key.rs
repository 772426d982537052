//! PreSharedKey extension (RFC 8446 Section 4.2.11)

use crate::buffer::Buf;
use crate::Error;
use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u32, be_u8};
use nom::IResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PskIdentityEntry {
    pub identity: Vec<u8>,
    pub obfuscated_ticket_age: u32,
}

impl PskIdentityEntry {
    fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, len) = be_u16(input)?;
        let (input, identity) = take(len)(input)?;
        let (input, obfuscated_ticket_age) = be_u32(input)?;
        Ok((
            input,
            PskIdentityEntry {
                identity: identity.to_vec(),
                obfuscated_ticket_age,
            },
        ))
    }
}

fn parse_binder(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let (input, len) = be_u8(input)?;
    let (input, binder) = take(len)(input)?;
    Ok((input, binder.to_vec()))
}

/// `OfferedPsks` of a ClientHello.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferedPsks {
    pub identities: Vec<PskIdentityEntry>,
    pub binders: Vec<Vec<u8>>,
}

impl OfferedPsks {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, ids_len) = be_u16(input)?;
        let (input, ids) = take(ids_len)(input)?;
        let (_, identities) = crate::util::all_consumed(PskIdentityEntry::parse)(ids)?;
        let (input, binders_len) = be_u16(input)?;
        let (input, binders) = take(binders_len)(input)?;
        let (_, binders) = crate::util::all_consumed(parse_binder)(binders)?;
        Ok((
            input,
            OfferedPsks {
                identities,
                binders,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        let pos = output.start_u16_len();
        for entry in &self.identities {
            output.push_u16_prefixed(&entry.identity)?;
            output.push_u32(entry.obfuscated_ticket_age);
        }
        output.finish_u16_len(pos)?;

        let pos = output.start_u16_len();
        for binder in &self.binders {
            output.push_u8_prefixed(binder)?;
        }
        output.finish_u16_len(pos)?;
        Ok(())
    }
}

/// Identity index chosen by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedPsk(pub u16);

impl SelectedPsk {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, index) = be_u16(input)?;
        Ok((input, SelectedPsk(index)))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push_u16(self.0);
        Ok(())
    }
}
