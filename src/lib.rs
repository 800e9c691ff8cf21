//! A UUID version 7 generator for time-sortable primary keys
//!
//! ```rust
//! use pkuid::pkuid;
//!
//! let uuid = pkuid();
//! println!("{}", uuid); // e.g. "01809424-3e59-7c05-9219-566f82fff672"
//! println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
//! ```
//!
//! Schema layers use this crate as a default-value provider for primary-key columns: one call
//! per new record, storing the returned canonical string verbatim. The generated values sort by
//! creation time under plain lexicographic string ordering.
//!
//! # Field and bit layout
//!
//! This implementation produces identifiers with the following bit layout:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          unix_ts_ms                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          unix_ts_ms           |  ver  |          seq          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |var|                          rand_b                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                            rand_b                             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Where:
//!
//! - The 48-bit `unix_ts_ms` field is dedicated to the Unix timestamp in
//!   milliseconds.
//! - The 4-bit `ver` field is set at `0111`.
//! - The 12-bit `seq` field accommodates the sequence counter that ensures the
//!   monotonic order of IDs generated within the same millisecond. `seq` is
//!   incremented by one for each new ID generated within the same timestamp and is
//!   randomly initialized whenever the `unix_ts_ms` changes.
//! - The 2-bit `var` field is set at `10`.
//! - The remaining 62 `rand_b` bits are filled with a cryptographically strong random
//!   number drawn from the operating system for each ID.
//!
//! In the very rare circumstances where the 12-bit `seq` field reaches the maximum value and can
//! no more be incremented within the same timestamp, this library increments the `unix_ts_ms`.
//! The same policy applies when the system clock rolls back: the `unix_ts_ms` of the previous ID
//! is kept, whatever the size of the rollback, so the monotonic order of generated IDs never
//! breaks. The `unix_ts_ms` field may accordingly run ahead of the real-time clock until the
//! clock catches up.
//!
//! # Entropy failures
//!
//! The only error this library produces is [`EntropyError`]: the operating system's entropy
//! source could not supply random bits. It is surfaced immediately through [`try_pkuid`] and
//! [`Generator::try_generate`] and never masked by a fallback to a weaker source; the panicking
//! entry points treat it as fatal.
//!
//! # Crate features
//!
//! - `global_gen` (default): the process-wide default generator and the [`pkuid`],
//!   [`try_pkuid`], and [`pkuid_string`] entry point functions.
//! - `serde`: the serialization and deserialization of [`Uuid`] objects.
//! - `uuid`: the conversions between [`Uuid`] objects of this crate and those of the `uuid`
//!   crate.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod id;
pub use id::{ParseError, Uuid, Variant};

mod generator;
pub use generator::{EntropyError, Generator, OsEntropy, RandSource, StdSystemTime, TimeSource};

mod entry;
#[cfg(feature = "global_gen")]
pub use entry::{pkuid, pkuid_string, try_pkuid};
