use crate::buffer::Buf;
use crate::Error;
use nom::bytes::complete::take;
use nom::number::complete::be_u8;
use nom::IResult;
use tinyvec::ArrayVec;

wire_enum! {
    /// ECPointFormat (RFC 8422 5.1.2).
    pub enum ECPointFormat: u8 {
        Uncompressed = 0,
        AnsiX962CompressedPrime = 1,
        AnsiX962CompressedChar2 = 2,
    }
}

impl Default for ECPointFormat {
    fn default() -> Self {
        ECPointFormat::Uncompressed
    }
}

/// `ec_point_formats`. Only uncompressed points are ever used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ECPointFormatsExtension {
    pub formats: ArrayVec<[ECPointFormat; 16]>,
}

impl ECPointFormatsExtension {
    pub fn new(formats: ArrayVec<[ECPointFormat; 16]>) -> Self {
        ECPointFormatsExtension { formats }
    }

    /// Only the uncompressed format, the one every implementation must accept.
    pub fn uncompressed() -> Self {
        let mut formats = ArrayVec::new();
        formats.push(ECPointFormat::Uncompressed);
        ECPointFormatsExtension { formats }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ECPointFormatsExtension> {
        let (input, list_len) = be_u8(input)?;
        let (input, list) = take(list_len)(input)?;
        let (_, formats) = crate::util::many0(ECPointFormat::parse)(list)?;
        Ok((input, ECPointFormatsExtension { formats }))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push(self.formats.len() as u8);
        for format in &self.formats {
            output.push(format.as_u8());
        }
        Ok(())
    }

    pub fn has_uncompressed(&self) -> bool {
        self.formats.contains(&ECPointFormat::Uncompressed)
    }
}
