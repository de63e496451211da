/*!
Civil datetimes on the proleptic Gregorian calendar.

A [`DateTime`] is a calendar date paired with a clock time, with no time
zone attached. Converting between civil datetimes and [`Instant`]s is the
job of the calendar codec in this module.

# The day count

Instants number their days from an epoch of 2000-03-01, chosen so that a
year begins in March and ends in February. This puts the leap day at the
very end of a year, which in turn lets the codec treat the calendar as a
sequence of identical 1461 day blocks of four years each. Day counts encode
with one multiplication against the 1461/4 ratio plus a table lookup, and
decode with the matching divisions. No per-year leap test appears anywhere.

The proleptic calendar here follows the quadrennial leap rule alone, so
the years 1900 and 2100 are treated as leap years. Within a century or so
of the epoch this agrees with the Gregorian calendar exactly.
*/

use crate::{error::Error, instant::Instant, tz::TimeZone};

/// The number of days before each month of the March based computational
/// year. Index 0 is March, index 11 is February.
const CUMULATIVE_DAYS: [i64; 12] =
    [0, 31, 61, 92, 122, 153, 184, 214, 245, 275, 306, 337];

/// The number of days in one four year leap cycle.
const DAYS_IN_CYCLE: i64 = 1461;

/// Returns the number of days from 2000-03-01 to the given calendar date.
///
/// The date is assumed to have passed the field range checks in
/// [`DateTime::new`]. Out of range day-of-month values simply run into the
/// following month.
pub(crate) fn day_count(year: i16, month: i8, day: i8) -> i64 {
    // Count years from the most recent March 1st. January and February
    // belong to the computational year before their calendar year.
    let (shifted_month, shifted_year) = if month < 3 {
        (i64::from(month) + 9, i64::from(year) - 2001)
    } else {
        (i64::from(month) - 3, i64::from(year) - 2000)
    };
    (shifted_year * DAYS_IN_CYCLE).div_euclid(4)
        + CUMULATIVE_DAYS[shifted_month as usize]
        + i64::from(day)
        - 1
}

/// Returns the calendar date of the given day count.
///
/// This is the inverse of [`day_count`]. The year is returned widened,
/// since day counts far from the epoch name years beyond what a
/// [`DateTime`] can hold. Callers convert and range check.
pub(crate) fn from_day_count(day_count: i64) -> (i64, i8, i8) {
    let cycle = day_count.div_euclid(DAYS_IN_CYCLE);
    let day_of_cycle = day_count.rem_euclid(DAYS_IN_CYCLE);
    let mut year_of_cycle = day_of_cycle / 365;
    let mut day_of_year = day_of_cycle % 365;
    // Day 1460 is the leap day. Dividing by 365 calls it day 0 of a fifth
    // year, but it is really day 365 of the fourth.
    if year_of_cycle == 4 {
        year_of_cycle = 3;
        day_of_year = 365;
    }
    let mut shifted_month = 0;
    for (i, &cumulative) in CUMULATIVE_DAYS.iter().enumerate() {
        if cumulative <= day_of_year {
            shifted_month = i;
        }
    }
    let day = day_of_year - CUMULATIVE_DAYS[shifted_month] + 1;
    // Undo the March shift. Months 10 and 11 are January and February of
    // the following calendar year.
    let (year, month) = if shifted_month >= 10 {
        (cycle * 4 + year_of_cycle + 2001, shifted_month as i8 - 9)
    } else {
        (cycle * 4 + year_of_cycle + 2000, shifted_month as i8 + 3)
    };
    (year, month, day as i8)
}

/// Returns the second of the day for the given clock time.
pub(crate) fn second_of_day(hour: i8, minute: i8, second: i8) -> i32 {
    i32::from(hour) * 3600 + i32::from(minute) * 60 + i32::from(second)
}

/// Splits a second of the day into hour, minute and second components.
///
/// The given value is assumed to be in `0..86400`.
pub(crate) fn from_second_of_day(second_of_day: i32) -> (i8, i8, i8) {
    let hour = second_of_day / 3600;
    let minute = (second_of_day % 3600) / 60;
    let second = second_of_day % 60;
    (hour as i8, minute as i8, second as i8)
}

/// A civil datetime: a calendar date and a clock time, with no time zone.
///
/// Values of this type order chronologically and support equality, since
/// without a zone there is nothing to resolve. Attach a zone with
/// [`DateTime::to_instant`] to get an absolute time.
///
/// # Ranges
///
/// Years run from `-9999` to `9999`. The day of the month is checked
/// against `1..=31` without consulting the month, mirroring the lenient
/// field checks of the text parser. A day that overshoots its month, like
/// April 31, encodes to the first day of the following month.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DateTime {
    year: i16,
    month: i8,
    day: i8,
    hour: i8,
    minute: i8,
    second: i8,
    microsecond: i32,
}

impl DateTime {
    /// The minimum representable datetime.
    pub const MIN: DateTime = DateTime {
        year: -9999,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
        microsecond: 0,
    };

    /// The maximum representable datetime.
    pub const MAX: DateTime = DateTime {
        year: 9999,
        month: 12,
        day: 31,
        hour: 23,
        minute: 59,
        second: 59,
        microsecond: 999_999,
    };

    /// Creates a new datetime from its constituent fields.
    ///
    /// # Errors
    ///
    /// Returns a range error naming the offending field when any value is
    /// out of range: year `-9999..=9999`, month `1..=12`, day `1..=31`,
    /// hour `0..=23`, minute `0..=59`, second `0..=59` and microsecond
    /// `0..=999999`.
    pub fn new(
        year: i16,
        month: i8,
        day: i8,
        hour: i8,
        minute: i8,
        second: i8,
        microsecond: i32,
    ) -> Result<DateTime, Error> {
        if !(-9999..=9999).contains(&year) {
            return Err(Error::range("year", year, -9999, 9999));
        }
        if !(1..=12).contains(&month) {
            return Err(Error::range("month", month, 1, 12));
        }
        if !(1..=31).contains(&day) {
            return Err(Error::range("day", day, 1, 31));
        }
        if !(0..=23).contains(&hour) {
            return Err(Error::range("hour", hour, 0, 23));
        }
        if !(0..=59).contains(&minute) {
            return Err(Error::range("minute", minute, 0, 59));
        }
        if !(0..=59).contains(&second) {
            return Err(Error::range("second", second, 0, 59));
        }
        if !(0..=999_999).contains(&microsecond) {
            return Err(Error::range("microsecond", microsecond, 0, 999_999));
        }
        Ok(DateTime { year, month, day, hour, minute, second, microsecond })
    }

    /// Creates a new datetime in a `const` context.
    ///
    /// # Panics
    ///
    /// When any field is out of range. Use [`DateTime::new`] for values
    /// not known at compile time.
    pub const fn constant(
        year: i16,
        month: i8,
        day: i8,
        hour: i8,
        minute: i8,
        second: i8,
        microsecond: i32,
    ) -> DateTime {
        if year < -9999 || year > 9999 {
            panic!("invalid year");
        }
        if month < 1 || month > 12 {
            panic!("invalid month");
        }
        if day < 1 || day > 31 {
            panic!("invalid day");
        }
        if hour < 0 || hour > 23 {
            panic!("invalid hour");
        }
        if minute < 0 || minute > 59 {
            panic!("invalid minute");
        }
        if second < 0 || second > 59 {
            panic!("invalid second");
        }
        if microsecond < 0 || microsecond > 999_999 {
            panic!("invalid microsecond");
        }
        DateTime { year, month, day, hour, minute, second, microsecond }
    }

    /// The year. Negative years are BCE, with year 0 meaning 1 BCE.
    pub fn year(&self) -> i16 {
        self.year
    }

    /// The month, from 1 to 12.
    pub fn month(&self) -> i8 {
        self.month
    }

    /// The day of the month, from 1 to 31.
    pub fn day(&self) -> i8 {
        self.day
    }

    /// The hour, from 0 to 23.
    pub fn hour(&self) -> i8 {
        self.hour
    }

    /// The minute, from 0 to 59.
    pub fn minute(&self) -> i8 {
        self.minute
    }

    /// The second, from 0 to 59.
    pub fn second(&self) -> i8 {
        self.second
    }

    /// The microsecond, from 0 to 999999.
    pub fn microsecond(&self) -> i32 {
        self.microsecond
    }

    /// The day of the week.
    pub fn weekday(&self) -> Weekday {
        Weekday::from_day_count(day_count(self.year, self.month, self.day))
    }

    /// Converts this datetime to an instant in the given time zone.
    ///
    /// The fields are read as a civil time in that zone. No offset
    /// arithmetic happens here, so the same fields paired with different
    /// zones yield instants that compare unequal by exactly the offset
    /// difference.
    pub fn to_instant(&self, time_zone: &TimeZone) -> Instant {
        Instant::from_datetime_parts(
            day_count(self.year, self.month, self.day),
            second_of_day(self.hour, self.minute, self.second),
            self.microsecond,
            time_zone.clone(),
        )
    }
}

impl core::fmt::Display for DateTime {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if self.year < 0 {
            write!(f, "-{:04}", -i32::from(self.year))?;
        } else {
            write!(f, "{:04}", self.year)?;
        }
        write!(
            f,
            "-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.month, self.day, self.hour, self.minute, self.second,
        )?;
        if self.microsecond != 0 {
            write!(f, ".{:06}", self.microsecond)?;
        }
        Ok(())
    }
}

/// A civil datetime along with the time zone state in effect at it.
///
/// This is what [`Instant::to_civil`] produces: the broken out calendar
/// fields of an instant, its weekday and the [`Subzone`] its own zone was
/// occupying, so callers can get at the UTC offset, the DST flag and the
/// abbreviation without further lookups.
///
/// [`Subzone`]: crate::tz::Subzone
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CivilTime {
    datetime: DateTime,
    weekday: Weekday,
    subzone: crate::tz::Subzone,
}

impl CivilTime {
    pub(crate) fn new(
        datetime: DateTime,
        weekday: Weekday,
        subzone: crate::tz::Subzone,
    ) -> CivilTime {
        CivilTime { datetime, weekday, subzone }
    }

    /// The calendar date and clock time.
    pub fn datetime(&self) -> DateTime {
        self.datetime
    }

    /// The day of the week.
    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    /// The UTC offset in effect.
    pub fn offset(&self) -> crate::tz::Offset {
        self.subzone.offset()
    }

    /// Whether daylight saving time is in effect.
    pub fn dst(&self) -> crate::tz::Dst {
        self.subzone.dst()
    }

    /// The time zone abbreviation in effect, like `EST`.
    pub fn abbreviation(&self) -> &str {
        self.subzone.abbreviation()
    }
}

/// A day of the week.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// Returns the weekday of the given day count. Day 0, 2000-03-01, is
    /// a Wednesday.
    pub(crate) fn from_day_count(day_count: i64) -> Weekday {
        match (day_count + 3).rem_euclid(7) {
            0 => Weekday::Sunday,
            1 => Weekday::Monday,
            2 => Weekday::Tuesday,
            3 => Weekday::Wednesday,
            4 => Weekday::Thursday,
            5 => Weekday::Friday,
            _ => Weekday::Saturday,
        }
    }

    /// The English name of this weekday, like `Wednesday`.
    pub fn name(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }
}

impl core::fmt::Display for Weekday {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the English name of the given month, like `June`.
///
/// # Errors
///
/// When the month is not in `1..=12`.
pub fn month_name(month: i8) -> Result<&'static str, Error> {
    let name = match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => return Err(Error::range("month", month, 1, 12)),
    };
    Ok(name)
}

/// Creates a new `DateTime` in a `const` context.
///
/// This is a convenience for writing down datetimes whose validity is
/// clear from the source text, most usefully in tests.
///
/// # Panics
///
/// When any field is out of range. See [`DateTime::new`] for the ranges.
pub const fn datetime(
    year: i16,
    month: i8,
    day: i8,
    hour: i8,
    minute: i8,
    second: i8,
    microsecond: i32,
) -> DateTime {
    DateTime::constant(year, month, day, hour, minute, second, microsecond)
}
