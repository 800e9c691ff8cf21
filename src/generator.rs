//! UUIDv7 generator and the clock/entropy capabilities it draws on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::{error, fmt, time};

use crate::Uuid;

const MAX_SEQ: u64 = (1 << 12) - 1;
const MAX_RAND_B: u64 = (1 << 62) - 1;

/// A trait that supplies [`Generator`] with the current Unix timestamp.
///
/// Implementations must return values that fit in 48 bits (i.e., less than `2^48` milliseconds
/// since the Unix epoch), or the generator panics.
pub trait TimeSource {
    /// Returns the current number of milliseconds since the Unix epoch.
    fn unix_ts_ms(&self) -> u64;
}

/// The default [`TimeSource`] that reads the system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdSystemTime;

impl TimeSource for StdSystemTime {
    fn unix_ts_ms(&self) -> u64 {
        time::SystemTime::now()
            .duration_since(time::UNIX_EPOCH)
            .expect("clock may have gone backwards")
            .as_millis() as u64
    }
}

/// A trait that supplies [`Generator`] with random bits.
///
/// The receiver is shared so that one generator instance can serve concurrent callers without
/// external locking; implementations that keep mutable state must synchronize it internally.
pub trait RandSource {
    /// Returns the next random `u64`, or [`EntropyError`] if no bits can be drawn.
    fn try_next_u64(&self) -> Result<u64, EntropyError>;
}

/// The default [`RandSource`] that draws every call from the operating system's entropy source
/// via [`rand::rngs::OsRng`].
///
/// Each call is an independent draw; there is no userspace RNG state to seed or to duplicate
/// across process forks. A failing OS source surfaces as [`EntropyError`].
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl RandSource for OsEntropy {
    fn try_next_u64(&self) -> Result<u64, EntropyError> {
        use rand::RngCore as _;
        let mut buffer = [0u8; 8];
        rand::rngs::OsRng.try_fill_bytes(&mut buffer)?;
        Ok(u64::from_be_bytes(buffer))
    }
}

/// Error drawing random bits from the underlying entropy source.
///
/// This is the only error the generator produces. It is never retried internally and is not a
/// signal to degrade to a weaker source; callers should treat it as fatal.
#[derive(Debug)]
pub struct EntropyError {
    source: rand::Error,
}

impl fmt::Display for EntropyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not draw random bits from entropy source")
    }
}

impl error::Error for EntropyError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.source)
    }
}

impl From<rand::Error> for EntropyError {
    fn from(source: rand::Error) -> Self {
        Self { source }
    }
}

/// Represents a UUIDv7 generator that encapsulates a per-millisecond sequence counter and
/// guarantees the monotonic order of UUIDs generated within the same millisecond.
///
/// The generator state is a single atomic word packing the last-used `(unix_ts_ms, seq)` pair,
/// claimed through a compare-and-swap loop. Generation therefore takes `&self`, never blocks,
/// and one shared instance keeps the process-wide order without any external lock:
///
/// # Examples
///
/// ```rust
/// use pkuid::Generator;
/// use std::thread;
///
/// let g: Generator = Generator::default();
/// thread::scope(|s| {
///     for i in 0..4 {
///         let g = &g;
///         s.spawn(move || {
///             for _ in 0..8 {
///                 println!("{} by thread {}", g.generate(), i);
///                 thread::yield_now();
///             }
///         });
///     }
/// });
/// ```
///
/// # Clock rollback handling
///
/// The timestamp field never regresses: when the clock reports a value at or before the
/// last-used timestamp, the generator keeps the previous timestamp and increments the 12-bit
/// `seq` field, and when `seq` overflows it advances the timestamp by one millisecond instead.
/// There is no rollback allowance and no reset path; the generated order stays strictly
/// increasing even if the system clock jumps backwards arbitrarily far, at the cost of the
/// timestamp field running ahead of the real-time clock until it catches up.
#[derive(Debug, Default)]
pub struct Generator<R = OsEntropy, C = StdSystemTime> {
    /// Packed `unix_ts_ms << 12 | seq` of the last generated UUID (zero before the first call).
    state: AtomicU64,

    rng: R,
    clock: C,
}

impl<R> Generator<R> {
    /// Creates a generator instance that reads the system clock.
    pub const fn new(rng: R) -> Self {
        Self::with_rand_and_time_sources(rng, StdSystemTime)
    }
}

impl<R, C> Generator<R, C> {
    /// Creates a generator instance with the specified random number and system clock sources.
    pub const fn with_rand_and_time_sources(rng: R, clock: C) -> Self {
        Self {
            state: AtomicU64::new(0),
            rng,
            clock,
        }
    }
}

impl<R: RandSource, C: TimeSource> Generator<R, C> {
    /// Generates a new UUIDv7 object, or returns [`EntropyError`] if the random number source
    /// cannot supply bits.
    ///
    /// On error, the generator state is left untouched; a subsequent call continues the sequence
    /// exactly where the last successful call left it.
    ///
    /// # Panics
    ///
    /// Panics if the time source reports a timestamp that does not fit in 48 bits.
    pub fn try_generate(&self) -> Result<Uuid, EntropyError> {
        // drawn before the state is touched so that a failure has no side effects
        let rand_b = self.rng.try_next_u64()? & MAX_RAND_B;

        let mut witness = self.state.load(Ordering::Relaxed);
        loop {
            // re-read per attempt; a retry under contention picks up clock progress
            let now = self.clock.unix_ts_ms();
            let last_ts_ms = witness >> 12;
            let next = if now > last_ts_ms {
                // fresh millisecond: randomize seq rather than zeroing it to keep collision
                // probability low when another process starts within the same millisecond
                now << 12 | (self.rng.try_next_u64()? & MAX_SEQ)
            } else if (witness & MAX_SEQ) < MAX_SEQ {
                // same millisecond, or clock went backwards: keep the timestamp, bump seq
                witness + 1
            } else {
                // seq overflow: borrow the next millisecond
                (last_ts_ms + 1) << 12 | (self.rng.try_next_u64()? & MAX_SEQ)
            };

            match self
                .state
                .compare_exchange_weak(witness, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => {
                    return Ok(Uuid::from_fields_v7(
                        next >> 12,
                        (next & MAX_SEQ) as u16,
                        rand_b,
                    ))
                }
                Err(seen) => witness = seen,
            }
        }
    }

    /// Generates a new UUIDv7 object.
    ///
    /// # Panics
    ///
    /// Panics if the random number source cannot supply bits or the time source reports a
    /// timestamp that does not fit in 48 bits. See [`try_generate`](Generator::try_generate) for
    /// the non-panicking variant.
    pub fn generate(&self) -> Uuid {
        self.try_generate()
            .expect("pkuid: could not draw random bits from entropy source")
    }
}

/// Supports operations as an infinite iterator that produces a new UUIDv7 object for each call
/// of `next()`.
///
/// # Examples
///
/// ```rust
/// use pkuid::Generator;
///
/// <Generator>::default()
///     .enumerate()
///     .skip(4)
///     .take(4)
///     .for_each(|(i, e)| println!("[{}] {}", i, e));
/// ```
impl<R: RandSource, C: TimeSource> Iterator for Generator<R, C> {
    type Item = Uuid;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.generate())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl<R: RandSource, C: TimeSource> std::iter::FusedIterator for Generator<R, C> {}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha12Rng;

    use super::{EntropyError, Generator, RandSource, TimeSource};

    /// A settable clock for driving the generator through prepared timestamp sequences.
    struct TestClock(Cell<u64>);

    impl TimeSource for TestClock {
        fn unix_ts_ms(&self) -> u64 {
            self.0.get()
        }
    }

    /// A reproducible entropy source seeded from a constant.
    struct SeededEntropy(RefCell<ChaCha12Rng>);

    impl SeededEntropy {
        fn new(seed: u64) -> Self {
            Self(RefCell::new(ChaCha12Rng::seed_from_u64(seed)))
        }
    }

    impl RandSource for SeededEntropy {
        fn try_next_u64(&self) -> Result<u64, EntropyError> {
            Ok(self.0.borrow_mut().next_u64())
        }
    }

    /// An entropy source that returns one fixed value, pinning the randomized seq field.
    struct ConstEntropy(u64);

    impl RandSource for ConstEntropy {
        fn try_next_u64(&self) -> Result<u64, EntropyError> {
            Ok(self.0)
        }
    }

    fn test_generator(seed: u64, ts: u64) -> Generator<SeededEntropy, TestClock> {
        Generator::with_rand_and_time_sources(SeededEntropy::new(seed), TestClock(Cell::new(ts)))
    }

    /// Generates increasing UUIDs even with decreasing or constant timestamp
    #[test]
    fn generates_increasing_uuids_even_with_decreasing_or_constant_timestamp() {
        let ts = 0x0123_4567_89abu64;
        let g = test_generator(42, ts);
        let mut prev = g.try_generate().unwrap();
        assert_eq!(prev.unix_ts_ms(), ts);
        for i in 0..100_000u64 {
            g.clock.0.set(ts - i.min(4_000));
            let curr = g.try_generate().unwrap();
            assert!(prev < curr);
            if curr.unix_ts_ms() == prev.unix_ts_ms() {
                assert_eq!(curr.seq(), prev.seq() + 1);
            } else {
                assert_eq!(curr.unix_ts_ms(), prev.unix_ts_ms() + 1);
            }
            prev = curr;
        }
        assert!(prev.unix_ts_ms() >= ts);
    }

    /// Keeps the last timestamp when the clock goes backwards
    #[test]
    fn keeps_the_last_timestamp_when_the_clock_goes_backwards(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let ts = 0x0123_4567_89abu64;
        let g = Generator::with_rand_and_time_sources(ConstEntropy(0), TestClock(Cell::new(ts)));
        let first = g.try_generate()?;
        assert_eq!(first.unix_ts_ms(), ts);
        assert_eq!(first.seq(), 0);

        g.clock.0.set(ts - 5_000);
        let second = g.try_generate()?;
        assert_eq!(second.unix_ts_ms(), ts);
        assert_eq!(second.seq(), 1);
        assert!(first < second);

        g.clock.0.set(1);
        let third = g.try_generate()?;
        assert_eq!(third.unix_ts_ms(), ts);
        assert_eq!(third.seq(), 2);
        assert!(second < third);
        Ok(())
    }

    /// Reflects forward clock steps exactly in the timestamp field
    #[test]
    fn reflects_forward_clock_steps_exactly_in_the_timestamp_field(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let ts = 0x0123_4567_89abu64;
        let g = test_generator(123, ts);
        let first = g.try_generate()?;

        g.clock.0.set(ts + 2);
        let second = g.try_generate()?;
        assert_eq!(first.unix_ts_ms(), ts);
        assert_eq!(second.unix_ts_ms(), ts + 2);
        assert!(first.encode() < second.encode());
        Ok(())
    }

    /// Borrows the next millisecond when seq overflows within one millisecond
    #[test]
    fn borrows_the_next_millisecond_when_seq_overflows() {
        let ts = 0x0123_4567_89abu64;
        let g = test_generator(999, ts);
        let mut prev = g.try_generate().unwrap();
        let mut overflowed = false;
        // a 12-bit seq cannot absorb 10k calls at one timestamp
        for _ in 0..10_000 {
            let curr = g.try_generate().unwrap();
            assert!(prev < curr);
            if curr.unix_ts_ms() != prev.unix_ts_ms() {
                assert_eq!(curr.unix_ts_ms(), prev.unix_ts_ms() + 1);
                assert_eq!(prev.seq(), 0xfff);
                overflowed = true;
            }
            prev = curr;
        }
        assert!(overflowed);
    }

    /// Advances the timestamp by one per call with seq pinned at the maximum
    #[test]
    fn advances_the_timestamp_by_one_per_call_with_seq_pinned_at_the_maximum() {
        let ts = 0x0123_4567_89abu64;
        let g = Generator::with_rand_and_time_sources(ConstEntropy(!0), TestClock(Cell::new(ts)));
        let mut prev = g.try_generate().unwrap();
        assert_eq!((prev.unix_ts_ms(), prev.seq()), (ts, 0xfff));
        for i in 1..=100 {
            let curr = g.try_generate().unwrap();
            assert_eq!((curr.unix_ts_ms(), curr.seq()), (ts + i, 0xfff));
            assert!(prev < curr);
            prev = curr;
        }
    }

    /// Surfaces entropy failure without mutating the generator state
    #[test]
    fn surfaces_entropy_failure_without_mutating_the_generator_state() {
        struct FlakyEntropy {
            fail: Cell<bool>,
        }

        impl RandSource for FlakyEntropy {
            fn try_next_u64(&self) -> Result<u64, EntropyError> {
                if self.fail.get() {
                    Err(rand::Error::new("entropy depleted").into())
                } else {
                    Ok(0)
                }
            }
        }

        let ts = 0x0123_4567_89abu64;
        let g = Generator::with_rand_and_time_sources(
            FlakyEntropy {
                fail: Cell::new(false),
            },
            TestClock(Cell::new(ts)),
        );
        let first = g.try_generate().unwrap();
        assert_eq!((first.unix_ts_ms(), first.seq()), (ts, 0));

        g.rng.fail.set(true);
        for _ in 0..3 {
            let err = g.try_generate().unwrap_err();
            assert!(std::error::Error::source(&err).is_some());
        }

        // failed calls consumed no (timestamp, seq) slot
        g.rng.fail.set(false);
        let second = g.try_generate().unwrap();
        assert_eq!((second.unix_ts_ms(), second.seq()), (ts, 1));
    }

    /// Encodes the invocation-time timestamp with the default clock
    #[test]
    fn encodes_the_invocation_time_timestamp_with_the_default_clock() {
        fn now_ms() -> u64 {
            use std::time;
            time::SystemTime::now()
                .duration_since(time::UNIX_EPOCH)
                .expect("clock may have gone backwards")
                .as_millis() as u64
        }

        let g = Generator::new(SeededEntropy::new(2026));
        let before = now_ms();
        let e = g.try_generate().unwrap();
        let after = now_ms();
        assert!(before <= e.unix_ts_ms() && e.unix_ts_ms() <= after);
    }

    /// Claims each (timestamp, seq) pair at most once across threads
    #[test]
    fn claims_each_timestamp_seq_pair_at_most_once_across_threads() {
        use std::collections::HashSet;
        use std::sync::{mpsc, Mutex};
        use std::thread;

        struct SharedEntropy(Mutex<ChaCha12Rng>);

        impl RandSource for SharedEntropy {
            fn try_next_u64(&self) -> Result<u64, EntropyError> {
                Ok(self.0.lock().unwrap().next_u64())
            }
        }

        let g = Generator::new(SharedEntropy(Mutex::new(ChaCha12Rng::seed_from_u64(8))));
        let (tx, rx) = mpsc::channel();
        thread::scope(|s| {
            for _ in 0..8 {
                let g = &g;
                let tx = tx.clone();
                s.spawn(move || {
                    for _ in 0..1_000 {
                        tx.send(g.try_generate().unwrap()).unwrap();
                    }
                });
            }
        });
        drop(tx);

        let mut pairs = HashSet::new();
        let mut strings = HashSet::new();
        while let Ok(e) = rx.recv() {
            pairs.insert((e.unix_ts_ms(), e.seq()));
            strings.insert(e.to_string());
        }
        assert_eq!(pairs.len(), 8 * 1_000);
        assert_eq!(strings.len(), 8 * 1_000);
    }
}
