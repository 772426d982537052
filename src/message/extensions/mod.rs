//! Body codecs for the hello extensions tlsnego understands.
//!
//! These only deal with bytes. What an extension means for the handshake
//! lives in [`crate::ext::builtin`].

pub mod cookie;
pub mod ec_point_formats;
pub mod heartbeat;
pub mod key_share;
pub mod pre_shared_key;
pub mod server_name;
pub mod signature_algorithms;
pub mod status_request;
pub mod supported_groups;
pub mod supported_versions;
pub mod use_srtp;

pub use cookie::CookieExtension;
pub use ec_point_formats::{ECPointFormat, ECPointFormatsExtension};
pub use heartbeat::{HeartbeatExtension, HeartbeatMode};
pub use key_share::{KeyShareClientHello, KeyShareEntry, KeyShareHelloRetryRequest, KeyShareServerHello};
pub use pre_shared_key::{OfferedPsks, PskIdentityEntry, SelectedPsk};
pub use server_name::{ServerName, ServerNameExtension, ServerNameType};
pub use signature_algorithms::SignatureAlgorithmsExtension;
pub use status_request::{CertificateStatusType, StatusRequestExtension};
pub use supported_groups::SupportedGroupsExtension;
pub use supported_versions::{SupportedVersionsClientHello, SupportedVersionsServerHello};
pub use use_srtp::{SrtpProfileId, UseSrtpExtension};
