//! Encoding and decoding of DNS stamps.
//!
//! A DNS stamp packs everything a client needs to know to talk to a
//! resolver into a single short string: the protocol to use, the address
//! of the server, information for authenticating it, and a few properties
//! the resolver promises to have. Stamps are written as URIs with the
//! `sdns` scheme, for instance `sdns://AgcAAAAAAAAAAAAABC9mb28`.
//!
//! The crate supports all protocols currently defined for stamps: DNSCrypt,
//! DNS-over-HTTPS, DNS-over-TLS, plain DNS, Oblivious DoH targets and
//! relays, and anonymized DNSCrypt relays.
//!
//! # Modules
//!
//! * [stamp] contains the [`Stamp`] type and the types for the content of
//!   the stamps of each protocol,
//! * [props] contains the resolver [properties][props::Properties],
//! * [proto] contains the registry of [protocol identifiers][proto::Protocol],
//! * [wire] has the helpers for the length-prefixed fields of the binary
//!   payload as well as the error types, and
//! * [utils] provides the hex and *base64url* codecs used for binary fields
//!   and the URI payload.
//!
//! # Reference of feature flags
//!
//! * `serde`: Enables serialization and deserialization of stamps and
//!   their parts via the [serde](https://serde.rs/) crate. Stamps are
//!   represented as a map tagged by its `"protocol"` entry with binary
//!   fields given as hex strings.
//! * `cli`: Builds the `sdns` command line tool for decoding, encoding, and
//!   inspecting stamps. Implies `serde`.
//!
//! # Logging
//!
//! The crate reports what it is doing via the
//! [tracing](https://docs.rs/tracing) crate. Decoding and encoding emit
//! `trace` events and rejected stamps are reported at the `debug` level.
//! Nothing is logged unless the application installs a subscriber.
#![allow(renamed_and_removed_lints)]
#![allow(clippy::unknown_clippy_lints)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
mod macros;

pub mod props;
pub mod proto;
pub mod stamp;
pub mod utils;
pub mod wire;

pub use self::stamp::Stamp;
pub use self::wire::{DecodeError, EncodeError};
