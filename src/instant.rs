use std::time::SystemTime;

use crate::{
    civil::{self, CivilTime, DateTime, Weekday},
    error::{err, Error},
    fmt::timestring::TimestringPrinter,
    tz::{self, TimeZone},
};

/// The day count of 1970-01-01, the Unix epoch.
const UNIX_EPOCH_DAY: i64 = -11017;

/// Seconds from 1900-01-01T00:00:00Z, the universal epoch, to the Unix
/// epoch.
const UNIVERSAL_UNIX_OFFSET: i64 = 2_208_988_800;

/// The day count whose astronomical Julian day number is 0.
const JULIAN_EPOCH_DAY: i64 = -2_451_605;

/// The day count whose modified Julian day number is 0.
const MODIFIED_JULIAN_EPOCH_DAY: i64 = -51_604;

/// An absolute point in time, paired with a time zone.
///
/// An instant is a day count from the epoch of 2000-03-01, a second within
/// that day and a microsecond within that second. The fields are a civil
/// datetime read off the clock of the instant's own time zone. Moving an
/// instant to another zone with [`Instant::in_time_zone`] shifts the
/// fields by the difference in UTC offset, so that both values name the
/// same point in absolute time.
///
/// Two instants in different zones are therefore comparable, but not by
/// looking at their fields alone. [`Instant::compare`] and the relational
/// predicates first express both values in a common zone. Since that may
/// need to load time zone data, comparisons return a `Result`, and this
/// type deliberately implements neither `Ord` nor `PartialEq`.
///
/// The conversions from civil fields and back are in [`DateTime`] and
/// [`Instant::to_datetime`]. Text conversions are in [`crate::fmt`], with
/// the common cases wired up as [`Instant::parse`]
/// and the `Display` impl here.
#[derive(Clone, Debug)]
pub struct Instant {
    day: i64,
    second: i32,
    microsecond: i32,
    time_zone: TimeZone,
}

impl Instant {
    /// Creates an instant from a count of seconds since the Unix epoch,
    /// in the UTC time zone.
    pub fn from_unix_seconds(seconds: i64) -> Instant {
        let day = seconds.div_euclid(86400) + UNIX_EPOCH_DAY;
        let second = seconds.rem_euclid(86400) as i32;
        Instant { day, second, microsecond: 0, time_zone: TimeZone::UTC }
    }

    /// Creates an instant from a count of seconds since the universal
    /// epoch, 1900-01-01T00:00:00Z, in the UTC time zone.
    ///
    /// # Errors
    ///
    /// When the count is too far below zero to express as Unix seconds.
    pub fn from_universal_seconds(seconds: i64) -> Result<Instant, Error> {
        let unix = seconds.checked_sub(UNIVERSAL_UNIX_OFFSET).ok_or_else(|| {
            err!("universal second count {seconds} is out of range")
        })?;
        Ok(Instant::from_unix_seconds(unix))
    }

    /// Returns the current time in the default time zone.
    ///
    /// # Errors
    ///
    /// When the default time zone's data cannot be loaded. See
    /// [`tz::default_time_zone`] for how the default is chosen.
    pub fn now() -> Result<Instant, Error> {
        Instant::try_from(SystemTime::now())?
            .in_time_zone(&tz::default_time_zone())
    }

    /// Creates an instant directly from a day count, a second of the day
    /// and a microsecond, all in the given zone's frame.
    ///
    /// The second must be in `0..86400` and the microsecond in
    /// `0..1000000`.
    pub(crate) fn from_datetime_parts(
        day: i64,
        second: i32,
        microsecond: i32,
        time_zone: TimeZone,
    ) -> Instant {
        debug_assert!((0..86400).contains(&second));
        debug_assert!((0..1_000_000).contains(&microsecond));
        Instant { day, second, microsecond, time_zone }
    }

    /// Returns this instant with the given microsecond in place of its
    /// current one.
    ///
    /// # Errors
    ///
    /// When the microsecond is not in `0..=999999`.
    pub fn with_microsecond(self, microsecond: i32) -> Result<Instant, Error> {
        if !(0..=999_999).contains(&microsecond) {
            return Err(Error::range("microsecond", microsecond, 0, 999_999));
        }
        Ok(Instant { microsecond, ..self })
    }

    /// The day count: the number of days from 2000-03-01 to this
    /// instant's date, on its own zone's clock.
    pub fn day(&self) -> i64 {
        self.day
    }

    /// The second of the day, in `0..86400`.
    pub fn second(&self) -> i32 {
        self.second
    }

    /// The microsecond of the second, in `0..1000000`.
    pub fn microsecond(&self) -> i32 {
        self.microsecond
    }

    /// The time zone this instant's fields are expressed in.
    pub fn time_zone(&self) -> &TimeZone {
        &self.time_zone
    }

    /// The day of the week of this instant's date.
    pub fn weekday(&self) -> Weekday {
        Weekday::from_day_count(self.day)
    }

    /// Returns this instant's fields as a count of seconds since the Unix
    /// epoch.
    ///
    /// The fields are read directly, without shifting into UTC first, so
    /// this is the exact inverse of [`Instant::from_unix_seconds`]. For an
    /// instant in some other zone, the result is offset from real epoch
    /// seconds by that zone's UTC offset. Move the instant with
    /// `instant.in_time_zone(&TimeZone::UTC)` first when the absolute
    /// count is wanted.
    ///
    /// # Errors
    ///
    /// When the day count is too far from the epoch for the total to fit
    /// in an `i64`.
    pub fn unix_seconds(&self) -> Result<i64, Error> {
        // The multiplication alone can step outside of `i64` for values
        // whose final total still fits, like the instant for `i64::MIN`
        // seconds, so the intermediate math is widened.
        let days = i128::from(self.day) - i128::from(UNIX_EPOCH_DAY);
        let total = days * 86400 + i128::from(self.second);
        i64::try_from(total).map_err(|_| {
            err!(
                "instant with day count {day} is out of range \
                 for a Unix second count",
                day = self.day,
            )
        })
    }

    /// Returns this instant's fields as a count of seconds since the
    /// universal epoch, 1900-01-01T00:00:00Z.
    ///
    /// The same frame caveat as [`Instant::unix_seconds`] applies.
    ///
    /// # Errors
    ///
    /// When the count does not fit in an `i64`.
    pub fn universal_seconds(&self) -> Result<i64, Error> {
        self.unix_seconds()?
            .checked_add(UNIVERSAL_UNIX_OFFSET)
            .ok_or_else(|| {
                err!(
                    "instant with day count {day} is out of range \
                     for a universal second count",
                    day = self.day,
                )
            })
    }

    /// The astronomical Julian day number of this instant's date.
    ///
    /// The time of day is not folded in. Midnight and noon of the same
    /// date give the same number.
    pub fn julian_day(&self) -> i64 {
        self.day - JULIAN_EPOCH_DAY
    }

    /// The modified Julian day number of this instant's date.
    pub fn modified_julian_day(&self) -> i64 {
        self.day - MODIFIED_JULIAN_EPOCH_DAY
    }

    /// Expresses this instant in the given time zone.
    ///
    /// The fields are shifted by the difference between the target zone's
    /// UTC offset and the current zone's, so the result names the same
    /// absolute time with a clock reading local to the new zone.
    ///
    /// # Errors
    ///
    /// When either zone's data cannot be loaded, or the shifted day count
    /// overflows.
    pub fn in_time_zone(&self, time_zone: &TimeZone) -> Result<Instant, Error> {
        let lookup = self.lookup_seconds();
        let target = time_zone.to_offset(lookup)?;
        let source = self.time_zone.to_offset(lookup)?;
        let delta = i64::from(target.seconds()) - i64::from(source.seconds());
        let mut day = self
            .day
            .checked_add(delta.div_euclid(86400))
            .ok_or_else(|| err!("day count overflowed changing time zones"))?;
        let mut second = self.second + delta.rem_euclid(86400) as i32;
        if second >= 86400 {
            second -= 86400;
            day = day
                .checked_add(1)
                .ok_or_else(|| err!("day count overflowed changing time zones"))?;
        }
        Ok(Instant {
            day,
            second,
            microsecond: self.microsecond,
            time_zone: time_zone.clone(),
        })
    }

    /// Compares this instant with another, after expressing this one in
    /// the other's time zone.
    ///
    /// The ordering is total: exactly one of less, equal or greater.
    ///
    /// # Errors
    ///
    /// When time zone data needed for the conversion cannot be loaded.
    pub fn compare(&self, other: &Instant) -> Result<core::cmp::Ordering, Error> {
        let this = self.in_time_zone(&other.time_zone)?;
        let lhs = (this.day, this.second, this.microsecond);
        let rhs = (other.day, other.second, other.microsecond);
        Ok(lhs.cmp(&rhs))
    }

    /// Returns true when this instant is strictly before the other.
    pub fn before(&self, other: &Instant) -> Result<bool, Error> {
        Ok(self.compare(other)?.is_lt())
    }

    /// Returns true when this instant is before or equal to the other.
    pub fn not_after(&self, other: &Instant) -> Result<bool, Error> {
        Ok(self.compare(other)?.is_le())
    }

    /// Returns true when this instant is strictly after the other.
    pub fn after(&self, other: &Instant) -> Result<bool, Error> {
        Ok(self.compare(other)?.is_gt())
    }

    /// Returns true when this instant is after or equal to the other.
    pub fn not_before(&self, other: &Instant) -> Result<bool, Error> {
        Ok(self.compare(other)?.is_ge())
    }

    /// Returns true when this instant and the other name the same time.
    pub fn equal_to(&self, other: &Instant) -> Result<bool, Error> {
        Ok(self.compare(other)?.is_eq())
    }

    /// Returns true when this instant and the other name different times.
    pub fn not_equal_to(&self, other: &Instant) -> Result<bool, Error> {
        Ok(self.compare(other)?.is_ne())
    }

    /// Subtracts the other instant from this one, componentwise.
    ///
    /// This instant is first expressed in the other's zone. The result
    /// carries the difference in its fields and the other's time zone, so
    /// `a.difference(b)?.sum(b)?` gets back to `a` expressed in `b`'s
    /// zone.
    ///
    /// # Errors
    ///
    /// When time zone data cannot be loaded or the day count overflows.
    pub fn difference(&self, other: &Instant) -> Result<Instant, Error> {
        let this = self.in_time_zone(&other.time_zone)?;
        let mut microsecond = this.microsecond - other.microsecond;
        let mut second = this.second - other.second;
        let mut day = this
            .day
            .checked_sub(other.day)
            .ok_or_else(|| err!("day count overflowed in subtraction"))?;
        if microsecond < 0 {
            microsecond += 1_000_000;
            second -= 1;
        }
        if second < 0 {
            second += 86400;
            day = day
                .checked_sub(1)
                .ok_or_else(|| err!("day count overflowed in subtraction"))?;
        }
        Ok(Instant {
            day,
            second,
            microsecond,
            time_zone: other.time_zone.clone(),
        })
    }

    /// Adds the other instant to this one, componentwise.
    ///
    /// This instant is first expressed in the other's zone, and the result
    /// stays in that zone. Microseconds carry into seconds at one million
    /// and seconds carry into days at 86400, so the fields of the result
    /// are always in their canonical ranges.
    ///
    /// # Errors
    ///
    /// When time zone data cannot be loaded or the day count overflows.
    pub fn sum(&self, other: &Instant) -> Result<Instant, Error> {
        let this = self.in_time_zone(&other.time_zone)?;
        let mut microsecond = this.microsecond + other.microsecond;
        let mut second = this.second + other.second;
        let mut day = this
            .day
            .checked_add(other.day)
            .ok_or_else(|| err!("day count overflowed in addition"))?;
        if microsecond >= 1_000_000 {
            microsecond -= 1_000_000;
            second += 1;
        }
        if second >= 86400 {
            second -= 86400;
            day = day
                .checked_add(1)
                .ok_or_else(|| err!("day count overflowed in addition"))?;
        }
        Ok(Instant {
            day,
            second,
            microsecond,
            time_zone: other.time_zone.clone(),
        })
    }

    /// Decodes this instant's fields into a civil datetime.
    ///
    /// # Errors
    ///
    /// When the date falls outside the years `-9999..=9999`.
    pub fn to_datetime(&self) -> Result<DateTime, Error> {
        let (year, month, day) = civil::from_day_count(self.day);
        let year = i16::try_from(year)
            .map_err(|_| Error::range("year", year, -9999, 9999))?;
        let (hour, minute, second) = civil::from_second_of_day(self.second);
        DateTime::new(year, month, day, hour, minute, second, self.microsecond)
    }

    /// Decodes this instant into a civil datetime along with its weekday
    /// and the time zone state in effect.
    ///
    /// The state comes from the zone's local frame lookup, the same one
    /// the formatter uses when printing an offset suffix.
    ///
    /// # Errors
    ///
    /// When the date is out of range or zone data cannot be loaded.
    pub fn to_civil(&self) -> Result<CivilTime, Error> {
        let datetime = self.to_datetime()?;
        let subzone = self.time_zone.to_local_subzone(self.lookup_seconds())?;
        Ok(CivilTime::new(datetime, self.weekday(), subzone))
    }

    /// Parses an instant from a timestamp string, with the default
    /// permissive options.
    ///
    /// See [`TimestringParser`](crate::fmt::timestring::TimestringParser)
    /// for the accepted forms and the knobs.
    pub fn parse(input: &str) -> Result<Instant, Error> {
        crate::fmt::timestring::TimestringParser::new().parse(input)
    }

    /// Refuses to convert this instant to a monotonic clock reading.
    ///
    /// A wall clock instant carries no information about the process
    /// monotonic clock, so no meaningful conversion exists. This always
    /// returns an unsupported operation error rather than approximating.
    pub fn to_monotonic(&self) -> Result<std::time::Instant, Error> {
        Err(Error::unsupported(
            "converting a wall clock instant to a monotonic clock reading",
        ))
    }

    /// The instant's fields flattened into a single count of seconds in
    /// the frame the transition tables are searched in.
    ///
    /// Saturates at the extremes of `i64`. Values that far from the epoch
    /// are beyond every transition table's last entry, so saturation does
    /// not change what any lookup resolves to.
    pub(crate) fn lookup_seconds(&self) -> i64 {
        self.day
            .saturating_sub(UNIX_EPOCH_DAY)
            .saturating_mul(86400)
            .saturating_add(i64::from(self.second))
    }
}

impl core::fmt::Display for Instant {
    /// Formats this instant with the default timestring layout: full date
    /// and time, fraction when non-zero and `Z` for the UTC zone.
    ///
    /// Formatting goes through the instant's time zone. In the unlikely
    /// case that its data cannot be loaded here, this reports
    /// `core::fmt::Error`.
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use crate::fmt::FmtWrite;

        TimestringPrinter::new()
            .print(self, FmtWrite(f))
            .map_err(|_| core::fmt::Error)
    }
}

impl TryFrom<SystemTime> for Instant {
    type Error = Error;

    /// Converts a `SystemTime` to an instant in the UTC time zone,
    /// truncating nanoseconds to microsecond precision.
    fn try_from(time: SystemTime) -> Result<Instant, Error> {
        let (seconds, microsecond) =
            match time.duration_since(SystemTime::UNIX_EPOCH) {
                Ok(duration) => {
                    let seconds =
                        i64::try_from(duration.as_secs()).map_err(|_| {
                            err!("system time is too far past the Unix epoch")
                        })?;
                    (seconds, duration.subsec_micros() as i32)
                }
                Err(before_epoch) => {
                    let duration = before_epoch.duration();
                    let seconds =
                        i64::try_from(duration.as_secs()).map_err(|_| {
                            err!("system time is too far before the Unix epoch")
                        })?;
                    let microsecond = duration.subsec_micros() as i32;
                    if microsecond == 0 {
                        (-seconds, 0)
                    } else {
                        (-seconds - 1, 1_000_000 - microsecond)
                    }
                }
            };
        let mut instant = Instant::from_unix_seconds(seconds);
        instant.microsecond = microsecond;
        Ok(instant)
    }
}

impl TryFrom<Instant> for SystemTime {
    type Error = Error;

    /// Converts an instant to a `SystemTime`.
    ///
    /// Unlike [`Instant::unix_seconds`], this names the instant's real
    /// absolute time. The instant is expressed in UTC first, so an
    /// instant in any zone converts to the `SystemTime` it actually
    /// denotes.
    fn try_from(instant: Instant) -> Result<SystemTime, Error> {
        let utc = instant.in_time_zone(&TimeZone::UTC)?;
        let seconds = utc.unix_seconds()?;
        let nanos = u32::try_from(utc.microsecond)
            .map_err(|_| Error::range("microsecond", utc.microsecond, 0, 999_999))?
            * 1_000;
        let time = if seconds >= 0 {
            SystemTime::UNIX_EPOCH
                .checked_add(std::time::Duration::new(seconds as u64, nanos))
        } else {
            // A negative count with a fractional part reaches back one
            // extra second, like -1.25s being 1.25s before the epoch at
            // second -2 plus 750ms.
            let whole = seconds
                .checked_neg()
                .map(|secs| std::time::Duration::new(secs as u64, 0));
            whole.and_then(|d| {
                SystemTime::UNIX_EPOCH
                    .checked_sub(d)?
                    .checked_add(std::time::Duration::new(0, nanos))
            })
        };
        time.ok_or_else(|| {
            err!("instant is out of range for the platform system time")
        })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Instant {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut formatted = String::new();
        TimestringPrinter::new()
            .print(self, &mut formatted)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Instant {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Instant, D::Error> {
        struct InstantVisitor;

        impl<'de> serde::de::Visitor<'de> for InstantVisitor {
            type Value = Instant;

            fn expecting(
                &self,
                f: &mut core::fmt::Formatter,
            ) -> core::fmt::Result {
                f.write_str("a timestamp string with date, time and offset")
            }

            fn visit_str<E: serde::de::Error>(
                self,
                value: &str,
            ) -> Result<Instant, E> {
                // The strict profile keeps deserialization deterministic:
                // nothing is backfilled from the current time.
                crate::fmt::timestring::TimestringParser::strict()
                    .parse(value)
                    .map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(InstantVisitor)
    }
}
