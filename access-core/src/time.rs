use std::convert::TryInto;
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use serde::{de, ser, Deserialize, Serialize};

/// Duration in seconds, signed so that relaxation costs and negative
/// offsets (e.g. "9 minutes short of the transfer margin") fall out of
/// plain subtraction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Duration {
    seconds: i32,
}

impl Duration {
    pub fn seconds(seconds: i32) -> Duration {
        Duration { seconds }
    }

    pub fn minutes(minutes: i32) -> Duration {
        Duration { seconds: minutes * 60 }
    }

    pub fn to_mins(&self) -> i32 {
        self.seconds / 60
    }

    pub fn to_secs(&self) -> i32 {
        self.seconds
    }
}

impl AddAssign<Duration> for Duration {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Duration) {
        self.seconds += rhs.seconds;
    }
}

/// A local time within a day. Seconds since local midnight, 32-bit signed
/// so that after-midnight arrivals (`> 86400`) and relaxation
/// arithmetic (which can transiently underflow zero before a clamp) both
/// fit without wrapping.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Time {
    seconds_since_midnight: i32,
}

impl Time {
    pub fn from_hms(hours: i32, minutes: i32, seconds: i32) -> Time {
        Time {
            seconds_since_midnight: (hours * 60 + minutes) * 60 + seconds,
        }
    }

    pub fn from_secs(seconds_since_midnight: i32) -> Time {
        Time { seconds_since_midnight }
    }

    pub fn as_secs(self) -> i32 {
        self.seconds_since_midnight
    }

    fn hour(self) -> i32 {
        self.seconds_since_midnight / 60 / 60
    }

    fn minute(self) -> u8 {
        ((self.seconds_since_midnight / 60).rem_euclid(60)).try_into().unwrap()
    }

    fn second(self) -> u8 {
        self.seconds_since_midnight.rem_euclid(60).try_into().unwrap()
    }
}

impl ser::Serialize for Time {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        self.seconds_since_midnight.serialize(serializer)
    }
}

impl<'de> de::Deserialize<'de> for Time {
    fn deserialize<D>(deserializer: D) -> Result<Time, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        de::Deserialize::deserialize(deserializer).map(|seconds_since_midnight| Time {
            seconds_since_midnight,
        })
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    #[inline(always)]
    fn add(self, rhs: Duration) -> Self::Output {
        Time {
            seconds_since_midnight: self.seconds_since_midnight + rhs.seconds,
        }
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    /// Subtracts two `Time`s, returning the `Duration` between. Assumes
    /// both `Time`s are in the same calendar day.
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        Duration::seconds(self.seconds_since_midnight - rhs.seconds_since_midnight)
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour(), self.minute(), self.second())
    }
}

/// A period between 2 `Time`s on the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    start: Time,
    end: Time,
}

impl Period {
    /// # Panics
    /// if `start > end`
    pub fn between(start: Time, end: Time) -> Period {
        assert!(start < end);
        Period { start, end }
    }

    pub fn with_start(&self, start: Time) -> Period {
        Self::between(start, self.end)
    }

    /// Containership, inclusive of start, exclusive of end.
    pub fn contains(&self, time: Time) -> bool {
        self.start <= time && time < self.end
    }

    pub fn start(&self) -> Time {
        self.start
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl std::ops::RangeBounds<Time> for Period {
    fn start_bound(&self) -> std::ops::Bound<&Time> {
        std::ops::Bound::Included(&self.start)
    }
    fn end_bound(&self) -> std::ops::Bound<&Time> {
        std::ops::Bound::Excluded(&self.end)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// # String representations
/// ```rust
/// use access_core::time::Time;
/// let time: Time = "0:00:00".parse().unwrap();
/// let time: Time = "1:00:00".parse().unwrap();
/// let time: Time = "09:00:00".parse().unwrap();
/// let time: Time = "23:59:59".parse().unwrap();
/// let time: Time = "25:00:00".parse().unwrap();
/// ```
impl std::str::FromStr for Time {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let (hh, mm, ss) = if bytes.len() == 8 {
            if bytes[2] != b':' || bytes[5] != b':' {
                return Err(TimeParseError::InvalidFormat);
            }
            (&bytes[0..2], &bytes[3..5], &bytes[6..8])
        } else if bytes.len() == 7 {
            if bytes[1] != b':' || bytes[4] != b':' {
                return Err(TimeParseError::InvalidFormat);
            }
            (&bytes[0..1], &bytes[2..4], &bytes[5..7])
        } else {
            return Err(TimeParseError::InvalidFormat);
        };
        use std::str::from_utf8;
        let hours: i32 = from_utf8(hh)?.parse()?;
        let minutes: i32 = from_utf8(mm)?.parse()?;
        let seconds: i32 = from_utf8(ss)?.parse()?;
        if seconds > 59 || minutes > 59 {
            return Err(TimeParseError::TooManySecondsOrMinutes);
        }
        Ok(Time {
            seconds_since_midnight: hours * 60 * 60 + minutes * 60 + seconds,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("Time should use format eg. 23:59:59")]
    InvalidFormat,
    #[error("Maximum minutes or seconds is 59")]
    TooManySecondsOrMinutes,
    #[error(transparent)]
    ParseIntError(#[from] std::num::ParseIntError),
}

impl From<std::str::Utf8Error> for TimeParseError {
    fn from(_err: std::str::Utf8Error) -> TimeParseError {
        TimeParseError::InvalidFormat
    }
}
