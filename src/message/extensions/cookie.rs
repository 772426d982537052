//! Cookie extension (RFC 8446 Section 4.2.2)
//!
//! The server hands a cookie to the client in a HelloRetryRequest and the
//! client echoes it in its second ClientHello. The cookie is opaque to the
//! client.

use crate::buffer::Buf;
use crate::Error;
use nom::bytes::complete::take;
use nom::number::complete::be_u16;
use nom::IResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieExtension {
    pub cookie: Vec<u8>,
}

impl CookieExtension {
    pub fn new(cookie: &[u8]) -> Self {
        CookieExtension {
            cookie: cookie.to_vec(),
        }
    }

    /// Parse the extension data. An empty cookie is not allowed.
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, cookie_len) = be_u16(input)?;
        if cookie_len == 0 {
            return Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::LengthValue,
            )));
        }
        let (input, cookie) = take(cookie_len)(input)?;
        Ok((input, Self::new(cookie)))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push_u16_prefixed(&self.cookie)
    }
}
