use std::ops::Deref;

use nom::bytes::complete::take;
use nom::number::complete::be_u16;
use nom::IResult;

macro_rules! wrapped_slice {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name<'a>(pub &'a [u8]);

        impl<'a> $name<'a> {
            /// Parse a u16 length prefixed value.
            pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], $name<'a>> {
                let (input, len) = be_u16(input)?;
                let (input, data) = take(len)(input)?;
                Ok((input, $name(data)))
            }
        }

        impl<'a> Deref for $name<'a> {
            type Target = [u8];

            fn deref(&self) -> &Self::Target {
                self.0
            }
        }
    };
}

wrapped_slice!(Asn1Cert);
wrapped_slice!(DistinguishedName);
