//! Premaster secret layout of the PSK key exchanges (RFC 4279 2).
//!
//! ```text
//! struct {
//!     opaque other_secret<0..2^16-1>;
//!     opaque psk<0..2^16-1>;
//! };
//! ```

use zeroize::{Zeroize, Zeroizing};

use crate::buffer::Buf;
use crate::Error;

/// Combine the secret of the underlying exchange with the PSK.
pub fn mix(other_secret: &[u8], psk: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
    let mut buf = Buf::new();
    let res = buf
        .push_u16_prefixed(other_secret)
        .and_then(|_| buf.push_u16_prefixed(psk));
    if let Err(e) = res {
        buf.zeroize();
        return Err(e);
    }
    Ok(Zeroizing::new(buf.into_vec()))
}

/// Premaster of plain PSK, where the other secret is zeros as long as the PSK.
pub fn plain_psk_premaster(psk: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
    let zeros = vec![0; psk.len()];
    mix(&zeros, psk)
}
