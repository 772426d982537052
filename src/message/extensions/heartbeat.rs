//! Heartbeat extension (RFC 6520).

use crate::buffer::Buf;
use crate::Error;
use nom::number::complete::be_u8;
use nom::IResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatMode {
    PeerAllowedToSend,
    PeerNotAllowedToSend,
    Unknown(u8),
}

impl HeartbeatMode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => HeartbeatMode::PeerAllowedToSend,
            2 => HeartbeatMode::PeerNotAllowedToSend,
            _ => HeartbeatMode::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            HeartbeatMode::PeerAllowedToSend => 1,
            HeartbeatMode::PeerNotAllowedToSend => 2,
            HeartbeatMode::Unknown(value) => *value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatExtension {
    pub mode: HeartbeatMode,
}

impl HeartbeatExtension {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, mode) = be_u8(input)?;
        Ok((
            input,
            HeartbeatExtension {
                mode: HeartbeatMode::from_u8(mode),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Buf) -> Result<(), Error> {
        output.push(self.mode.as_u8());
        Ok(())
    }
}
