use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

use crate::buffer::Buf;
use crate::Error;

wire_enum! {
    /// DTLS-SRTP protection profiles (RFC 5764 4.1.2, RFC 7714 14.2).
    pub enum SrtpProfileId: u16 {
        SrtpAes128CmSha1_80 = 0x0001,
        SrtpAes128CmSha1_32 = 0x0002,
        SrtpAeadAes128Gcm = 0x0007,
        SrtpAeadAes256Gcm = 0x0008,
    }
}

/// `UseSRTPData` (RFC 5764 4.1.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseSrtpExtension {
    pub profiles: Vec<SrtpProfileId>,
    /// Usually empty.
    pub mki: Vec<u8>,
}

impl UseSrtpExtension {
    pub fn new(profiles: Vec<SrtpProfileId>, mki: Vec<u8>) -> Self {
        UseSrtpExtension { profiles, mki }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], UseSrtpExtension> {
        let (input, profiles_length) = be_u16(input)?;
        let (input, profiles_data) = take(profiles_length)(input)?;
        let (_, profiles) = crate::util::all_consumed(SrtpProfileId::parse)(profiles_data)?;

        let (input, mki_length) = be_u8(input)?;
        let (input, mki) = take(mki_length)(input)?;

        Ok((
            input,
            UseSrtpExtension {
                profiles,
                mki: mki.to_vec(),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        let pos = output.start_u16_len();
        for profile in &self.profiles {
            output.push_u16(profile.as_u16());
        }
        output.finish_u16_len(pos)?;
        output.push_u8_prefixed(&self.mki)
    }
}
