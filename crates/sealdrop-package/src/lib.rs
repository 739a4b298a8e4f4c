//! sealdrop-package: package lifecycle and secure links
//!
//! A package is created as a temporary draft, filled with encrypted files
//! and messages, then finalized into a secure link:
//!
//! ```text
//! https://<host>/receive/?packageCode=<public code>#keycode=<client secret>
//! ```
//!
//! The keycode half of the passphrase is generated client-side and never
//! reaches the server in plaintext; it travels only in the link fragment
//! (out-of-band) and, when recipients registered public keys, encrypted to
//! each of those keys.

pub mod keycodes;
pub mod lifecycle;
pub mod link;
mod remote;
pub mod session;

pub use lifecycle::{
    CreateOptions, FinalizeOptions, FinalizeOutcome, PackageDownload, SealdropClient,
};
pub use session::PackageContext;
