use crate::buffer::Buf;
use crate::message::NamedGroup;
use crate::Error;
use nom::bytes::complete::take;
use nom::{number::complete::be_u16, IResult};

/// SupportedGroups extension (RFC 8422 5.1.1, RFC 7919, RFC 8446 4.2.7).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportedGroupsExtension {
    pub groups: Vec<NamedGroup>,
}

impl SupportedGroupsExtension {
    pub fn new(groups: &[NamedGroup]) -> Self {
        SupportedGroupsExtension {
            groups: groups.to_vec(),
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], SupportedGroupsExtension> {
        let (input, list_len) = be_u16(input)?;
        let (input, list) = take(list_len)(input)?;
        let (_, groups) = crate::util::all_consumed(NamedGroup::parse)(list)?;
        Ok((input, SupportedGroupsExtension { groups }))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        let pos = output.start_u16_len();
        for group in &self.groups {
            output.push_u16(group.as_u16());
        }
        output.finish_u16_len(pos)?;
        Ok(())
    }
}
