//! Default generator and entry point functions.

#![cfg(feature = "global_gen")]
#![cfg_attr(docsrs, doc(cfg(feature = "global_gen")))]

use std::sync;

use crate::{EntropyError, Generator, Uuid};

/// Returns the process-wide global generator, creating one if none exists.
fn global_gen() -> &'static Generator {
    static G: sync::OnceLock<Generator> = sync::OnceLock::new();
    G.get_or_init(Default::default)
}

/// Generates a UUIDv7 object.
///
/// This function employs a global generator and guarantees the process-wide monotonic order of
/// UUIDs generated within the same millisecond. The generator draws its random bits from the
/// operating system per call, so forked child processes share no random number generator state
/// with their parent.
///
/// # Examples
///
/// ```rust
/// let uuid = pkuid::pkuid();
/// println!("{}", uuid); // e.g., "01809424-3e59-7c05-9219-566f82fff672"
/// println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
/// ```
///
/// # Panics
///
/// Panics if the operating system's entropy source cannot supply random bits. Use
/// [`try_pkuid`] to handle that failure as a value.
pub fn pkuid() -> Uuid {
    global_gen().generate()
}

/// Generates a UUIDv7 object, or returns [`EntropyError`] if the operating system's entropy
/// source cannot supply random bits.
///
/// This is the non-panicking variant of [`pkuid`], backed by the same global generator.
pub fn try_pkuid() -> Result<Uuid, EntropyError> {
    global_gen().try_generate()
}

/// Generates a UUIDv7 object and returns it as the 8-4-4-4-12 canonical hexadecimal string.
///
/// Use this function when a textual identifier, such as a primary-key default, is all that is
/// needed.
///
/// # Examples
///
/// ```rust
/// println!("{}", pkuid::pkuid_string()); // e.g., "01809424-3e59-7c05-9219-566f82fff672"
/// ```
pub fn pkuid_string() -> String {
    pkuid().into()
}
