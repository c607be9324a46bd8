//! Stop reading a message body at a line containing a single dot

use std::io::{self, Read};

/// Smallest destination buffer `TerminatorFilter::read` accepts.
///
/// Up to two withheld bytes are copied back into the buffer ahead of the
/// fresh data, and at least two fresh bytes are needed to move past an
/// ambiguous state.
pub const MIN_READ_LEN: usize = 4;

/// Bytes that may be withheld between two reads.
const CARRY_LEN: usize = 2;

/// How far into the `<break> . <break>` terminator the scanner is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    /// Not inside a terminator
    Idle,
    /// The last byte was a line break
    SawBreak,
    /// A line break followed by a dot
    SawDot,
    /// The terminator has been matched, nothing more is delivered
    Done,
}

impl FilterState {
    /// Apply one input byte to the state.
    ///
    /// A second dot after `SawDot` is a false alarm and goes back to `Idle`,
    /// so `..` lines are delivered as they are.
    pub fn advance(self, byte: u8) -> Self {
        match (self, byte) {
            (FilterState::Done, _) => FilterState::Done,
            (FilterState::Idle, b'\r' | b'\n') => FilterState::SawBreak,
            (FilterState::Idle, _) => FilterState::Idle,
            (FilterState::SawBreak, b'\r' | b'\n') => FilterState::SawBreak,
            (FilterState::SawBreak, b'.') => FilterState::SawDot,
            (FilterState::SawBreak, _) => FilterState::Idle,
            (FilterState::SawDot, b'\r' | b'\n') => FilterState::Done,
            (FilterState::SawDot, _) => FilterState::Idle,
        }
    }

    /// Number of trailing bytes that belong to a (possible) terminator
    fn pattern_len(self) -> usize {
        match self {
            FilterState::Idle => 0,
            FilterState::SawBreak => 1,
            FilterState::SawDot => 2,
            FilterState::Done => 3,
        }
    }
}

/// Reader adapter that ends the stream at the first `<break> . <break>`.
///
/// The terminator itself is never delivered, and anything after it is left
/// unread. Bytes that might start a terminator at the end of one read are
/// held back and rescanned with the next chunk, so the output does not depend
/// on how the inner reader fragments its data.
#[derive(Debug)]
pub struct TerminatorFilter<R> {
    inner: R,
    state: FilterState,
    carry: [u8; CARRY_LEN],
    carried: usize,
    exhausted: bool,
}

impl<R: Read> TerminatorFilter<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: FilterState::Idle,
            carry: [0; CARRY_LEN],
            carried: 0,
            exhausted: false,
        }
    }

    /// State at the end of the last scan
    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for TerminatorFilter<R> {
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`MIN_READ_LEN`].
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        assert!(
            buf.len() >= MIN_READ_LEN,
            "TerminatorFilter::read needs a buffer of at least {MIN_READ_LEN} bytes, got {}",
            buf.len()
        );

        loop {
            if self.state == FilterState::Done {
                return Ok(0);
            }

            let carried = self.carried;
            buf[..carried].copy_from_slice(&self.carry[..carried]);

            if self.exhausted {
                // Held bytes never completed a terminator
                self.carried = 0;
                return Ok(carried);
            }

            let fresh = self.inner.read(&mut buf[carried..])?;
            self.carried = 0;
            if fresh == 0 {
                self.exhausted = true;
                return Ok(carried);
            }

            let mut len = carried + fresh;
            let mut state = FilterState::Idle;
            for (i, &byte) in buf[..len].iter().enumerate() {
                state = state.advance(byte);
                if state == FilterState::Done {
                    len = i + 1;
                    break;
                }
            }

            let held = state.pattern_len();
            len -= held;
            self.state = state;

            if state == FilterState::Done {
                tracing::debug!("end-of-message dot line reached");
                return Ok(len);
            }

            self.carry[..held].copy_from_slice(&buf[len..len + held]);
            self.carried = held;

            if len > 0 {
                return Ok(len);
            }
            // Everything read so far is withheld; pull more before answering
        }
    }
}
