// Defines a trait for time-like objects and the cycle clock used by the positional controller
// Copyright © 2025 Hs293Go
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included
// in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES
// OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
// TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE
// OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use core::fmt::Debug;
use core::ops::Add;
use core::time::Duration;

/// A trait for time-like objects that can be used to measure elapsed time.
///
/// The PID controller uses this trait to compare the time elapsed since its last computation to
/// the sample time, computing a new output only once a full sample period has passed.
pub trait InstantLike: Sized + Add<Duration, Output = Self> + Clone + Copy + Debug + PartialEq {
    /// Returns the amount of time elapsed from another instant to this one.
    ///
    /// Saturates to zero if `earlier` is actually later than `self`.
    #[must_use]
    fn duration_since(&self, earlier: Self) -> Duration;
}

/// A wrapper around an unsigned 64-bit integer representing milliseconds.
///
/// Sub-millisecond parts of a [`Duration`] added to it are truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Millis(pub u64);

impl InstantLike for Millis {
    fn duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Millis {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Millis(self.0 + rhs.as_millis() as u64)
    }
}

/// Time elapsed since a controller started, accumulated exactly.
///
/// Robot control loops are driven by a fixed-period scheduler, so the positional controller keeps
/// one of these as a cycle clock and advances it by one sample period per tick. Any sample time
/// the PID configuration accepts advances it, including ones that are not whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct CycleClock(pub Duration);

impl InstantLike for CycleClock {
    fn duration_since(&self, earlier: Self) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for CycleClock {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        CycleClock(self.0.saturating_add(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_duration_saturates() {
        let early = Millis(20);
        let late = early + Duration::from_millis(40);
        assert_eq!(late, Millis(60));
        assert_eq!(late.duration_since(early), Duration::from_millis(40));
        assert_eq!(early.duration_since(late), Duration::ZERO);
    }

    #[test]
    fn test_cycle_clock_keeps_sub_millisecond_steps() {
        let step = Duration::from_micros(500);
        let start = CycleClock::default();
        let next = start + step;
        assert_eq!(next.duration_since(start), step);
        assert_eq!((next + step).duration_since(start), Duration::from_millis(1));
        assert_eq!(start.duration_since(next), Duration::ZERO);

        let odd = Duration::from_micros(10_500);
        assert_eq!((start + odd).duration_since(start), odd);
    }
}
