use super::{CurveType, NamedGroup};
use crate::buffer::Buf;
use crate::Error;
use nom::number::complete::{be_u16, be_u8};
use nom::{bytes::complete::take, IResult};

/// `ServerDHParams` (RFC 5246 7.4.3).
#[derive(Debug, PartialEq, Eq)]
pub struct DhParams<'a> {
    pub p: &'a [u8],
    pub g: &'a [u8],
    pub ys: &'a [u8],
}

impl<'a> DhParams<'a> {
    pub fn new(p: &'a [u8], g: &'a [u8], ys: &'a [u8]) -> Self {
        DhParams { p, g, ys }
    }

    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], DhParams<'a>> {
        let (input, p_len) = be_u16(input)?;
        let (input, p) = take(p_len)(input)?;
        let (input, g_len) = be_u16(input)?;
        let (input, g) = take(g_len)(input)?;
        let (input, ys_len) = be_u16(input)?;
        let (input, ys) = take(ys_len)(input)?;
        Ok((input, DhParams { p, g, ys }))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push_u16_prefixed(self.p)?;
        output.push_u16_prefixed(self.g)?;
        output.push_u16_prefixed(self.ys)
    }
}

/// `ServerECDHParams` (RFC 8422 5.4).
#[derive(Debug, PartialEq, Eq)]
pub struct EcdhParams<'a> {
    pub curve_type: CurveType,
    pub named_group: NamedGroup,
    pub public_key: &'a [u8],
}

impl<'a> EcdhParams<'a> {
    pub fn new(named_group: NamedGroup, public_key: &'a [u8]) -> Self {
        EcdhParams {
            curve_type: CurveType::NamedCurve,
            named_group,
            public_key,
        }
    }

    /// Parse the params. Only the named curve form carries a group, other
    /// curve types stop after the type byte and leave the rest unparsed.
    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], EcdhParams<'a>> {
        let (input, curve_type) = CurveType::parse(input)?;
        if curve_type != CurveType::NamedCurve {
            return Ok((
                input,
                EcdhParams {
                    curve_type,
                    named_group: NamedGroup::Unknown(0),
                    public_key: &[],
                },
            ));
        }
        let (input, named_group) = NamedGroup::parse(input)?;
        let (input, public_key_len) = be_u8(input)?;
        let (input, public_key) = take(public_key_len as usize)(input)?;

        Ok((
            input,
            EcdhParams {
                curve_type,
                named_group,
                public_key,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push(self.curve_type.as_u8());
        output.push_u16(self.named_group.as_u16());
        output.push_u8_prefixed(self.public_key)
    }
}

/// PSK identity hint (RFC 4279 2).
#[derive(Debug, PartialEq, Eq)]
pub struct PskIdentityHint<'a>(pub &'a [u8]);

impl<'a> PskIdentityHint<'a> {
    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], PskIdentityHint<'a>> {
        let (input, len) = be_u16(input)?;
        let (input, hint) = take(len)(input)?;
        Ok((input, PskIdentityHint(hint)))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push_u16_prefixed(self.0)
    }
}
