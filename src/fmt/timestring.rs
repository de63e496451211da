/*!
The timestring format: a configurable RFC3339-family timestamp syntax.

The canonical form is `2006-06-06T16:30:00Z`, with a date, a time and a
UTC offset. [`TimestringParser`] deviates from strict RFC3339 in a few
deliberate ways: the date, the time and the offset may each be left out
(unless configured otherwise), a comma is accepted as the decimal marker
for fractional seconds and all three separators are configurable. Fields a
string leaves out are backfilled from a reference instant, by default the
current time in the default time zone, so `10:15` means quarter past ten
today.

[`TimestringPrinter`] renders an instant back to this syntax, with
configurable precision on both the date and time portions and an optional
target time zone that the instant is expressed in before rendering.

```
use zonetime::{fmt::timestring::TimestringPrinter, Instant, TimeZone};

fn example() -> Result<(), zonetime::Error> {
    let instant = Instant::parse("2006-06-06T12:30:00-04:00")?;
    let printed = TimestringPrinter::new()
        .in_time_zone(TimeZone::UTC)
        .to_timestring(&instant)?;
    assert_eq!(printed, "2006-06-06T16:30:00Z");
    Ok(())
}
# example().unwrap();
```
*/

use crate::{
    civil::DateTime,
    error::Error,
    fmt::{util::DecimalFormatter, Write, WriteExt},
    instant::Instant,
    tz::{self, Offset, TimeZone},
    util::escape::{Byte, Bytes},
};

/// A parser for the timestring format.
///
/// The grammar, with every piece in brackets optional by default:
///
/// ```text
/// timestamp := [date] [datetime-sep] [time] [offset]
/// date      := year sep month sep day
/// time      := hour sep minute sep second[. fraction]
/// offset    := 'Z' | ('+'|'-') hours sep minutes
/// ```
///
/// A string with no datetime separator is classified as a time when it
/// contains the time separator and as a date when it contains the date
/// separator. Civil fields that the string does not pin down are
/// backfilled from a reference instant, the current time by default. The
/// offset, when present, decides the time zone of the parsed instant: a
/// bare `Z` or an exact zero offset produces the UTC zone and any other
/// offset produces a fixed zone at that offset. Without an offset the
/// parsed instant is in the reference's zone.
///
/// [`TimestringParser::strict`] turns all of the leniency off.
#[derive(Clone, Debug)]
pub struct TimestringParser {
    allow_missing_date: bool,
    allow_missing_time: bool,
    allow_missing_timezone: bool,
    allow_missing_elements: bool,
    date_separator: u8,
    time_separator: u8,
    datetime_separator: u8,
}

impl TimestringParser {
    /// Creates a new parser with the default (permissive) configuration.
    pub const fn new() -> TimestringParser {
        TimestringParser {
            allow_missing_date: true,
            allow_missing_time: true,
            allow_missing_timezone: true,
            allow_missing_elements: true,
            date_separator: b'-',
            time_separator: b':',
            datetime_separator: b'T',
        }
    }

    /// Creates a parser that accepts only complete timestamps: a full
    /// date, a full time and an offset.
    ///
    /// Since nothing can be left out, nothing is ever backfilled and
    /// parsing never consults the clock.
    pub const fn strict() -> TimestringParser {
        TimestringParser {
            allow_missing_date: false,
            allow_missing_time: false,
            allow_missing_timezone: false,
            allow_missing_elements: false,
            ..TimestringParser::new()
        }
    }

    /// Whether a timestamp may leave its date out entirely.
    pub const fn allow_missing_date(self, yes: bool) -> TimestringParser {
        TimestringParser { allow_missing_date: yes, ..self }
    }

    /// Whether a timestamp may leave its time out entirely.
    pub const fn allow_missing_time(self, yes: bool) -> TimestringParser {
        TimestringParser { allow_missing_time: yes, ..self }
    }

    /// Whether a timestamp may leave its UTC offset out.
    pub const fn allow_missing_timezone(self, yes: bool) -> TimestringParser {
        TimestringParser { allow_missing_timezone: yes, ..self }
    }

    /// Whether a date or time may leave individual fields empty or
    /// unmentioned, like `10:15` or `2006--06`.
    pub const fn allow_missing_elements(self, yes: bool) -> TimestringParser {
        TimestringParser { allow_missing_elements: yes, ..self }
    }

    /// Sets the separator between date fields.
    pub const fn date_separator(self, ascii_char: u8) -> TimestringParser {
        assert!(ascii_char.is_ascii(), "date separator must be ASCII");
        TimestringParser { date_separator: ascii_char, ..self }
    }

    /// Sets the separator between time fields, also used between the
    /// hours and minutes of a numeric offset.
    pub const fn time_separator(self, ascii_char: u8) -> TimestringParser {
        assert!(ascii_char.is_ascii(), "time separator must be ASCII");
        TimestringParser { time_separator: ascii_char, ..self }
    }

    /// Sets the separator between the date and the time.
    pub const fn datetime_separator(self, ascii_char: u8) -> TimestringParser {
        assert!(ascii_char.is_ascii(), "datetime separator must be ASCII");
        TimestringParser { datetime_separator: ascii_char, ..self }
    }

    /// Parses an instant from the given timestamp string.
    ///
    /// Civil fields the string leaves unset are backfilled from the
    /// current instant expressed in the default time zone, so a date-only
    /// string gets the current time of day and a time-only string gets
    /// today's date. The clock is consulted only when something is
    /// actually missing, so complete timestamps parse deterministically.
    /// To supply the fallback yourself, use
    /// [`TimestringParser::parse_with_reference`].
    pub fn parse(&self, input: &str) -> Result<Instant, Error> {
        let fields = self.split(input.as_bytes())?;
        self.assemble(fields, None)
    }

    /// Parses an instant from the given timestamp string, backfilling
    /// unset civil fields from the given reference instant.
    ///
    /// The reference's fields are read in its own time zone, and when the
    /// string carries no offset, the parsed instant is in the reference's
    /// zone as well.
    pub fn parse_with_reference(
        &self,
        reference: &Instant,
        input: &str,
    ) -> Result<Instant, Error> {
        let fields = self.split(input.as_bytes())?;
        self.assemble(fields, Some(reference))
    }

    /// Decomposes the input into raw civil fields and an offset.
    fn split(&self, input: &[u8]) -> Result<Fields, Error> {
        if input.is_empty() {
            return Err(Error::parse(format_args!(
                "an empty string is not a timestamp",
            )));
        }
        let mut fields = Fields::default();
        let (date, time) = match input
            .iter()
            .position(|&byte| byte == self.datetime_separator)
        {
            Some(at) => (Some(&input[..at]), Some(&input[at + 1..])),
            None if input.contains(&self.time_separator) => {
                (None, Some(input))
            }
            None if input.contains(&self.date_separator) => {
                (Some(input), None)
            }
            None => {
                return Err(Error::parse(format_args!(
                    "cannot tell whether '{}' is a date or a time, since \
                     it contains neither a '{}' nor a '{}'",
                    Bytes(input),
                    Byte(self.date_separator),
                    Byte(self.time_separator),
                )));
            }
        };
        match date {
            Some(date) if !date.is_empty() => {
                self.parse_date(date, &mut fields)?;
            }
            _ if !self.allow_missing_date => {
                return Err(Error::parse(format_args!(
                    "timestamp '{}' is missing its date",
                    Bytes(input),
                )));
            }
            _ => {}
        }
        match time {
            Some(time) if !time.is_empty() => {
                self.parse_time(time, &mut fields)?;
            }
            _ if !self.allow_missing_time => {
                return Err(Error::parse(format_args!(
                    "timestamp '{}' is missing its time",
                    Bytes(input),
                )));
            }
            _ => {}
        }
        if fields.offset.is_none() && !self.allow_missing_timezone {
            return Err(Error::parse(format_args!(
                "timestamp '{}' is missing a UTC offset",
                Bytes(input),
            )));
        }
        Ok(fields)
    }

    /// Parses the date portion, `year sep month sep day`.
    fn parse_date(
        &self,
        date: &[u8],
        fields: &mut Fields,
    ) -> Result<(), Error> {
        let sep = self.date_separator;
        let mut parts = [None::<&[u8]>; 4];
        let mut count = 0;
        for element in date.split(|&byte| byte == sep) {
            if count == parts.len() {
                return Err(Error::parse(format_args!(
                    "date '{}' has too many '{}' separated fields",
                    Bytes(date),
                    Byte(sep),
                )));
            }
            parts[count] = Some(element);
            count += 1;
        }
        match parts {
            // Four fields with an empty first one is a date whose year
            // carries a leading sign, like '-0044-03-15'.
            [Some(first), Some(year), Some(month), Some(day)]
                if first.is_empty() =>
            {
                fields.year = Some(-parse_number("year", year)?);
                self.assign("month", month, &mut fields.month)?;
                self.assign("day", day, &mut fields.day)?;
            }
            [Some(year), month, day, None] => {
                self.assign("year", year, &mut fields.year)?;
                match month {
                    Some(month) => {
                        self.assign("month", month, &mut fields.month)?;
                    }
                    None => self.missing_element("month")?,
                }
                match day {
                    Some(day) => self.assign("day", day, &mut fields.day)?,
                    None => self.missing_element("day")?,
                }
            }
            _ => {
                return Err(Error::parse(format_args!(
                    "expected a date as year, month and day separated \
                     by '{}', but got '{}'",
                    Byte(sep),
                    Bytes(date),
                )));
            }
        }
        Ok(())
    }

    /// Parses the time portion, `hour sep minute sep second[.fraction]`,
    /// along with the offset riding its end.
    fn parse_time(
        &self,
        time: &[u8],
        fields: &mut Fields,
    ) -> Result<(), Error> {
        let (time, offset) = match time
            .iter()
            .position(|&byte| matches!(byte, b'Z' | b'z' | b'+' | b'-'))
        {
            Some(at) => (&time[..at], Some(&time[at..])),
            None => (time, None),
        };
        if let Some(offset) = offset {
            fields.offset = Some(self.parse_offset(offset)?);
        }
        if time.is_empty() {
            if !self.allow_missing_time {
                return Err(Error::parse(format_args!(
                    "timestamp is missing its time",
                )));
            }
            return Ok(());
        }
        let sep = self.time_separator;
        let mut count = 0;
        for element in time.split(|&byte| byte == sep) {
            match count {
                0 => self.assign("hour", element, &mut fields.hour)?,
                1 => self.assign("minute", element, &mut fields.minute)?,
                2 => self.parse_second(element, fields)?,
                _ => {
                    return Err(Error::parse(format_args!(
                        "time '{}' has too many '{}' separated fields",
                        Bytes(time),
                        Byte(sep),
                    )));
                }
            }
            count += 1;
        }
        if count < 2 {
            self.missing_element("minute")?;
        }
        if count < 3 {
            self.missing_element("second")?;
        }
        Ok(())
    }

    /// Parses the seconds field, which may carry a fraction after a `.`
    /// or `,` marker, read together as one decimal number.
    fn parse_second(
        &self,
        element: &[u8],
        fields: &mut Fields,
    ) -> Result<(), Error> {
        let (second, fraction) = match element
            .iter()
            .position(|&byte| matches!(byte, b'.' | b','))
        {
            Some(at) => (&element[..at], Some(&element[at + 1..])),
            None => (element, None),
        };
        let Some(fraction) = fraction else {
            return self.assign("second", second, &mut fields.second);
        };
        // '.5' reads as the number 0.5, so an empty whole part is zero
        // seconds rather than an unset field.
        if second.is_empty() {
            fields.second = Some(0);
        } else {
            fields.second = Some(parse_number("second", second)?);
        }
        fields.microsecond = parse_fraction(fraction)?;
        Ok(())
    }

    /// Parses the offset suffix: `Z`, or a sign followed by hours and
    /// minutes.
    fn parse_offset(&self, offset: &[u8]) -> Result<ParsedOffset, Error> {
        // The caller hands us a slice starting at one of Z/z/+/-.
        match offset[0] {
            b'Z' | b'z' => {
                if offset.len() > 1 {
                    return Err(Error::parse(format_args!(
                        "unexpected input '{}' after the zulu indicator",
                        Bytes(&offset[1..]),
                    )));
                }
                Ok(ParsedOffset::Zulu)
            }
            sign_byte => {
                let sign = if sign_byte == b'-' { -1 } else { 1 };
                let rest = &offset[1..];
                let sep = self.time_separator;
                let mut parts = rest.split(|&byte| byte == sep);
                let (Some(hours), Some(minutes), None) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    return Err(Error::parse(format_args!(
                        "expected a UTC offset as hours and minutes \
                         separated by '{}', but got '{}'",
                        Byte(sep),
                        Bytes(rest),
                    )));
                };
                let hours = parse_number("offset hours", hours)?;
                let minutes = parse_number("offset minutes", minutes)?;
                if !(0..=23).contains(&hours) {
                    return Err(Error::range("offset hours", hours, 0, 23));
                }
                if !(0..=59).contains(&minutes) {
                    return Err(Error::range(
                        "offset minutes",
                        minutes,
                        0,
                        59,
                    ));
                }
                Ok(ParsedOffset::Numeric {
                    sign,
                    hours: hours as i32,
                    minutes: minutes as i32,
                })
            }
        }
    }

    /// Parses one delimited field into its slot, leaving it unset when
    /// the field is empty and emptiness is tolerated.
    fn assign(
        &self,
        what: &'static str,
        element: &[u8],
        field: &mut Option<i64>,
    ) -> Result<(), Error> {
        if element.is_empty() {
            return self.missing_element(what);
        }
        *field = Some(parse_number(what, element)?);
        Ok(())
    }

    /// Reports a field the input did not provide a value for.
    fn missing_element(&self, what: &'static str) -> Result<(), Error> {
        if self.allow_missing_elements {
            Ok(())
        } else {
            Err(Error::parse(format_args!(
                "the {what} field is missing from the timestamp",
            )))
        }
    }

    /// Builds an instant out of raw fields, backfilling unset ones from
    /// the reference. Without an explicit reference, the current instant
    /// in the default time zone is used, fetched only when needed.
    fn assemble(
        &self,
        mut fields: Fields,
        reference: Option<&Instant>,
    ) -> Result<Instant, Error> {
        let mut now = None;
        if fields.needs_backfill() {
            let reference = match reference {
                Some(reference) => reference,
                None => &*now.insert(Instant::now()?),
            };
            fields.backfill(&reference.to_datetime()?);
        }
        let Some((year, month, day, hour, minute, second)) = fields.finish()
        else {
            // Unreachable after the backfill above.
            return Err(Error::parse(format_args!(
                "timestamp is missing fields that cannot be backfilled",
            )));
        };
        let time_zone = match fields.offset {
            Some(offset) => {
                TimeZone::fixed(Offset::from_seconds(offset.seconds())?)
            }
            None => match reference.or(now.as_ref()) {
                Some(reference) => reference.time_zone().clone(),
                None => tz::default_time_zone(),
            },
        };
        let year: i16 = narrow("year", year, -9999, 9999)?;
        let month: i8 = narrow("month", month, 1, 12)?;
        let day: i8 = narrow("day", day, 1, 31)?;
        let hour: i8 = narrow("hour", hour, 0, 23)?;
        let minute: i8 = narrow("minute", minute, 0, 59)?;
        let second: i8 = narrow("second", second, 0, 59)?;
        let datetime = DateTime::new(
            year,
            month,
            day,
            hour,
            minute,
            second,
            fields.microsecond,
        )?;
        Ok(datetime.to_instant(&time_zone))
    }
}

impl Default for TimestringParser {
    fn default() -> TimestringParser {
        TimestringParser::new()
    }
}

/// The raw pieces of a timestamp, before backfilling.
#[derive(Debug, Default)]
struct Fields {
    year: Option<i64>,
    month: Option<i64>,
    day: Option<i64>,
    hour: Option<i64>,
    minute: Option<i64>,
    second: Option<i64>,
    microsecond: i32,
    offset: Option<ParsedOffset>,
}

impl Fields {
    fn needs_backfill(&self) -> bool {
        self.year.is_none()
            || self.month.is_none()
            || self.day.is_none()
            || self.hour.is_none()
            || self.minute.is_none()
            || self.second.is_none()
    }

    /// Fills every unset civil field from the given fallback datetime.
    /// The microsecond is never backfilled and defaults to zero.
    fn backfill(&mut self, fallback: &DateTime) {
        self.year.get_or_insert(i64::from(fallback.year()));
        self.month.get_or_insert(i64::from(fallback.month()));
        self.day.get_or_insert(i64::from(fallback.day()));
        self.hour.get_or_insert(i64::from(fallback.hour()));
        self.minute.get_or_insert(i64::from(fallback.minute()));
        self.second.get_or_insert(i64::from(fallback.second()));
    }

    fn finish(&self) -> Option<(i64, i64, i64, i64, i64, i64)> {
        Some((
            self.year?,
            self.month?,
            self.day?,
            self.hour?,
            self.minute?,
            self.second?,
        ))
    }
}

/// The UTC offset carved off the end of a timestamp, before it becomes a
/// time zone.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ParsedOffset {
    /// A bare `Z`, naming UTC exactly.
    Zulu,
    /// An explicit signed offset in hours and minutes.
    Numeric { sign: i32, hours: i32, minutes: i32 },
}

impl ParsedOffset {
    fn seconds(&self) -> i32 {
        match *self {
            ParsedOffset::Zulu => 0,
            ParsedOffset::Numeric { sign, hours, minutes } => {
                sign * (hours * 3600 + minutes * 60)
            }
        }
    }
}

/// Parses an ASCII decimal number spanning the entire given slice.
fn parse_number(what: &'static str, bytes: &[u8]) -> Result<i64, Error> {
    if bytes.is_empty() {
        return Err(Error::parse(format_args!(
            "expected digits for the {what} field, but found none",
        )));
    }
    let mut n: i64 = 0;
    for &byte in bytes {
        let digit = match byte.checked_sub(b'0') {
            Some(digit) if digit <= 9 => i64::from(digit),
            _ => {
                return Err(Error::parse(format_args!(
                    "invalid digit in the {what} field, \
                     expected 0-9 but got {}",
                    Byte(byte),
                )));
            }
        };
        n = n.checked_mul(10).and_then(|n| n.checked_add(digit)).ok_or_else(
            || {
                Error::parse(format_args!(
                    "number '{}' in the {what} field is too big",
                    Bytes(bytes),
                ))
            },
        )?;
    }
    Ok(n)
}

/// Parses fractional second digits into a count of microseconds.
///
/// The first six digits are significant. Digits past the sixth must still
/// be digits, but are truncated away.
fn parse_fraction(fraction: &[u8]) -> Result<i32, Error> {
    if fraction.is_empty() {
        return Err(Error::parse(format_args!(
            "expected fraction digits after the decimal marker",
        )));
    }
    let mut microsecond: i32 = 0;
    for (i, &byte) in fraction.iter().enumerate() {
        let digit = match byte.checked_sub(b'0') {
            Some(digit) if digit <= 9 => i32::from(digit),
            _ => {
                return Err(Error::parse(format_args!(
                    "invalid digit in the fraction, \
                     expected 0-9 but got {}",
                    Byte(byte),
                )));
            }
        };
        if i < 6 {
            microsecond = microsecond * 10 + digit;
        }
    }
    for _ in fraction.len()..6 {
        microsecond *= 10;
    }
    Ok(microsecond)
}

/// Narrows a parsed or backfilled field to its storage type, rejecting
/// values outside the given range with an error naming the field.
fn narrow<T: TryFrom<i64>>(
    what: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<T, Error> {
    if value < min || value > max {
        return Err(Error::range(what, value, min, max));
    }
    T::try_from(value).map_err(|_| Error::range(what, value, min, max))
}

/// A printer for the timestring format.
///
/// The default configuration prints the full date and time, a fraction
/// when the microsecond is non-zero and `Z` for the UTC zone, like
/// `2006-06-06T16:30:00Z`.
///
/// The date and time portions can each be truncated: the date field count
/// keeps the lowest `n` of year, month and day, so a count of 2 prints
/// `-06-06` with a leading separator standing in for the omitted year.
/// The time field count keeps the highest `n` of hour, minute, second and
/// fraction. A target time zone set with
/// [`TimestringPrinter::in_time_zone`] re-expresses the instant there
/// before rendering.
#[derive(Clone, Debug)]
pub struct TimestringPrinter {
    date_fields: u8,
    time_fields: u8,
    omit_timezone: bool,
    zulu: bool,
    date_separator: u8,
    time_separator: u8,
    datetime_separator: u8,
    time_zone: Option<TimeZone>,
}

impl TimestringPrinter {
    /// Creates a new printer with the default configuration.
    pub const fn new() -> TimestringPrinter {
        TimestringPrinter {
            date_fields: 3,
            time_fields: 4,
            omit_timezone: false,
            zulu: true,
            date_separator: b'-',
            time_separator: b':',
            datetime_separator: b'T',
            time_zone: None,
        }
    }

    /// How many date fields to print, from 0 (no date) to 3 (year, month
    /// and day). Counting starts at the day: a count of 1 prints only the
    /// day and a count of 2 prints month and day.
    pub const fn date_fields(mut self, count: u8) -> TimestringPrinter {
        assert!(count <= 3, "date field count must be at most 3");
        self.date_fields = count;
        self
    }

    /// How many time fields to print, from 0 (no time) to 4 (hour,
    /// minute, second and fraction). The fraction is printed only when
    /// the microsecond is non-zero.
    pub const fn time_fields(mut self, count: u8) -> TimestringPrinter {
        assert!(count <= 4, "time field count must be at most 4");
        self.time_fields = count;
        self
    }

    /// Whether to leave the timezone suffix off entirely.
    pub const fn omit_timezone(mut self, yes: bool) -> TimestringPrinter {
        self.omit_timezone = yes;
        self
    }

    /// Whether to print a bare `Z` instead of `+00:00` when the
    /// instant's zone is the UTC zone.
    pub const fn zulu(mut self, yes: bool) -> TimestringPrinter {
        self.zulu = yes;
        self
    }

    /// Sets the separator between date fields.
    pub const fn date_separator(mut self, ascii_char: u8) -> TimestringPrinter {
        assert!(ascii_char.is_ascii(), "date separator must be ASCII");
        self.date_separator = ascii_char;
        self
    }

    /// Sets the separator between time fields, also used between the
    /// hours and minutes of a printed offset.
    pub const fn time_separator(mut self, ascii_char: u8) -> TimestringPrinter {
        assert!(ascii_char.is_ascii(), "time separator must be ASCII");
        self.time_separator = ascii_char;
        self
    }

    /// Sets the separator between the date and the time.
    pub const fn datetime_separator(
        mut self,
        ascii_char: u8,
    ) -> TimestringPrinter {
        assert!(ascii_char.is_ascii(), "datetime separator must be ASCII");
        self.datetime_separator = ascii_char;
        self
    }

    /// Sets a target time zone. The instant is expressed in this zone
    /// before rendering, shifting its civil fields accordingly.
    pub fn in_time_zone(self, time_zone: TimeZone) -> TimestringPrinter {
        TimestringPrinter { time_zone: Some(time_zone), ..self }
    }

    /// Prints the given instant to the given writer.
    pub fn print<W: Write>(
        &self,
        instant: &Instant,
        mut wtr: W,
    ) -> Result<(), Error> {
        static FMT_YEAR: DecimalFormatter =
            DecimalFormatter::new().minimum_digits(4);
        static FMT_TWO: DecimalFormatter =
            DecimalFormatter::new().minimum_digits(2);
        static FMT_FRACTION: DecimalFormatter =
            DecimalFormatter::new().minimum_digits(6);

        let shifted;
        let instant = match self.time_zone {
            Some(ref time_zone) => {
                shifted = instant.in_time_zone(time_zone)?;
                &shifted
            }
            None => instant,
        };
        let datetime = instant.to_datetime()?;
        if self.date_fields >= 3 {
            wtr.write_int(&FMT_YEAR, datetime.year())?;
        }
        if self.date_fields >= 2 {
            wtr.write_char(char::from(self.date_separator))?;
            wtr.write_int(&FMT_TWO, datetime.month())?;
        }
        if self.date_fields >= 1 {
            wtr.write_char(char::from(self.date_separator))?;
            wtr.write_int(&FMT_TWO, datetime.day())?;
        }
        if self.date_fields >= 1 && self.time_fields >= 1 {
            wtr.write_char(char::from(self.datetime_separator))?;
        }
        if self.time_fields >= 1 {
            wtr.write_int(&FMT_TWO, datetime.hour())?;
        }
        if self.time_fields >= 2 {
            wtr.write_char(char::from(self.time_separator))?;
            wtr.write_int(&FMT_TWO, datetime.minute())?;
        }
        if self.time_fields >= 3 {
            wtr.write_char(char::from(self.time_separator))?;
            wtr.write_int(&FMT_TWO, datetime.second())?;
        }
        if self.time_fields >= 4 && datetime.microsecond() != 0 {
            wtr.write_str(".")?;
            wtr.write_int(&FMT_FRACTION, datetime.microsecond())?;
        }
        if !self.omit_timezone {
            self.print_suffix(instant, &mut wtr)?;
        }
        Ok(())
    }

    /// A convenience routine for printing to a freshly allocated string.
    pub fn to_timestring(&self, instant: &Instant) -> Result<String, Error> {
        let mut buf = String::new();
        self.print(instant, &mut buf)?;
        Ok(buf)
    }

    /// Prints the timezone suffix: a bare `Z` for the UTC zone when zulu
    /// shorthand is on, and otherwise the offset the instant's zone is at
    /// for this instant's civil time.
    fn print_suffix<W: Write>(
        &self,
        instant: &Instant,
        mut wtr: W,
    ) -> Result<(), Error> {
        static FMT_TWO: DecimalFormatter =
            DecimalFormatter::new().minimum_digits(2);

        if self.zulu && instant.time_zone().is_utc() {
            return wtr.write_str("Z");
        }
        let offset =
            instant.time_zone().to_local_offset(instant.lookup_seconds())?;
        let seconds = offset.seconds().unsigned_abs();
        wtr.write_str(if offset.is_negative() { "-" } else { "+" })?;
        wtr.write_int(&FMT_TWO, seconds / 3600)?;
        wtr.write_char(char::from(self.time_separator))?;
        wtr.write_int(&FMT_TWO, (seconds % 3600) / 60)?;
        Ok(())
    }
}

impl Default for TimestringPrinter {
    fn default() -> TimestringPrinter {
        TimestringPrinter::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::{civil::datetime, fmt::StdWrite, tz::Offset};

    use super::*;

    fn utc(
        year: i16,
        month: i8,
        day: i8,
        hour: i8,
        minute: i8,
        second: i8,
        microsecond: i32,
    ) -> Instant {
        datetime(year, month, day, hour, minute, second, microsecond)
            .to_instant(&TimeZone::UTC)
    }

    #[test]
    fn print_unix_epoch() {
        let instant = Instant::from_unix_seconds(0);
        let printed =
            TimestringPrinter::new().to_timestring(&instant).unwrap();
        assert_eq!(printed, "1970-01-01T00:00:00Z");
    }

    #[test]
    fn parse_offset_then_print_in_utc() {
        let instant =
            Instant::parse("2006-06-06T12:30:00-04:00").unwrap();
        // The fields stay as written, in a fixed -04:00 zone.
        let datetime = instant.to_datetime().unwrap();
        assert_eq!(datetime.hour(), 12);
        assert_eq!(datetime.minute(), 30);
        assert!(!instant.time_zone().is_utc());
        // But the absolute time is 16:30 UTC.
        let unix = Instant::from_unix_seconds(1149611400);
        assert!(instant.equal_to(&unix).unwrap());
        let printed = TimestringPrinter::new()
            .in_time_zone(TimeZone::UTC)
            .to_timestring(&instant)
            .unwrap();
        assert_eq!(printed, "2006-06-06T16:30:00Z");
    }

    #[test]
    fn parse_zulu() {
        let instant = Instant::parse("2006-06-06T16:30:00Z").unwrap();
        assert!(instant.time_zone().is_utc());
        assert!(instant
            .equal_to(&Instant::from_unix_seconds(1149611400))
            .unwrap());
        // Lowercase is accepted too.
        let instant = Instant::parse("2006-06-06T16:30:00z").unwrap();
        assert!(instant.time_zone().is_utc());
    }

    #[test]
    fn parse_zero_offset_is_utc_zone() {
        for input in ["2006-06-06T16:30:00+00:00", "2006-06-06T16:30:00-00:00"]
        {
            let instant = Instant::parse(input).unwrap();
            assert!(instant.time_zone().is_utc(), "input: {input}");
        }
    }

    #[test]
    fn parse_nonzero_offset_synthesizes_fixed_zone() {
        let instant = Instant::parse("2006-06-06T12:30:00+05:30").unwrap();
        let offset =
            instant.time_zone().to_offset(instant.lookup_seconds()).unwrap();
        assert_eq!(offset.seconds(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn parse_fraction() {
        let instant =
            Instant::parse("2006-06-06T16:30:00.000042Z").unwrap();
        assert_eq!(instant.microsecond(), 42);

        // Comma works as the decimal marker.
        let instant = Instant::parse("2006-06-06T16:30:00,5Z").unwrap();
        assert_eq!(instant.microsecond(), 500_000);

        // Digits past microsecond precision are dropped.
        let instant =
            Instant::parse("2006-06-06T16:30:00.123456789Z").unwrap();
        assert_eq!(instant.microsecond(), 123_456);

        // An empty whole part reads as a fraction of zero seconds.
        let instant = Instant::parse("2006-06-06T16:30:.25Z").unwrap();
        assert_eq!(instant.to_datetime().unwrap().second(), 0);
        assert_eq!(instant.microsecond(), 250_000);
    }

    #[test]
    fn backfill_from_reference() {
        let reference = utc(2006, 6, 6, 16, 30, 45, 123);
        let parser = TimestringParser::new();

        // A time-only string inherits the reference's date, and its
        // unmentioned seconds. The microsecond defaults to zero.
        let instant = parser.parse_with_reference(&reference, "10:15").unwrap();
        let datetime = instant.to_datetime().unwrap();
        assert_eq!(
            (datetime.year(), datetime.month(), datetime.day()),
            (2006, 6, 6),
        );
        assert_eq!(
            (datetime.hour(), datetime.minute(), datetime.second()),
            (10, 15, 45),
        );
        assert_eq!(instant.microsecond(), 0);
        assert!(instant.time_zone().is_utc());

        // A date-only string inherits the reference's time of day.
        let instant =
            parser.parse_with_reference(&reference, "2007-01-09").unwrap();
        let datetime = instant.to_datetime().unwrap();
        assert_eq!(
            (datetime.year(), datetime.month(), datetime.day()),
            (2007, 1, 9),
        );
        assert_eq!(
            (datetime.hour(), datetime.minute(), datetime.second()),
            (16, 30, 45),
        );
    }

    #[test]
    fn backfill_empty_elements() {
        let reference = utc(2006, 6, 6, 16, 30, 45, 0);
        let parser = TimestringParser::new();

        let instant = parser
            .parse_with_reference(&reference, "2004--29T12:00:00Z")
            .unwrap();
        let datetime = instant.to_datetime().unwrap();
        assert_eq!(
            (datetime.year(), datetime.month(), datetime.day()),
            (2004, 6, 29),
        );

        // A date with a leading separator and two fields has its year
        // backfilled, matching the printer's reduced date form.
        let instant = parser
            .parse_with_reference(&reference, "-03-29T12:00:00Z")
            .unwrap();
        let datetime = instant.to_datetime().unwrap();
        assert_eq!(
            (datetime.year(), datetime.month(), datetime.day()),
            (2006, 3, 29),
        );
    }

    #[test]
    fn backfill_against_the_clock() {
        // The live-clock path only gets a smoke test. Everything about
        // the result except well-formedness depends on when it runs.
        assert!(TimestringParser::new().parse("10:15").is_ok());
    }

    #[test]
    fn strict_requires_complete_timestamps() {
        let parser = TimestringParser::strict();
        assert!(parser.parse("2006-06-06T16:30:00Z").is_ok());
        assert!(parser.parse("2006-06-06T16:30:00+05:30").is_ok());
        for input in [
            "10:15",
            "10:15:00Z",
            "2006-06-06",
            "2006-06-06T16:30:00",
            "2006-06-06T16:30Z",
            "2006--06T16:30:00Z",
        ] {
            let err = parser.parse(input).unwrap_err();
            assert!(err.is_parse(), "input: {input}, err: {err}");
        }
    }

    #[test]
    fn field_range_errors_name_the_field() {
        let checks = [
            ("2006-13-06T00:00:00Z", "month"),
            ("2006-06-32T00:00:00Z", "day"),
            ("2006-06-06T24:00:00Z", "hour"),
            ("2006-06-06T00:61:00Z", "minute"),
            ("2006-06-06T00:00:60Z", "second"),
            ("2006-06-06T00:00:00+24:00", "offset hours"),
            ("2006-06-06T00:00:00+05:60", "offset minutes"),
        ];
        for (input, what) in checks {
            let err = Instant::parse(input).unwrap_err();
            assert!(err.is_range(), "input: {input}, err: {err}");
            let message = err.to_string();
            assert!(message.contains(what), "input: {input}, err: {err}");
        }
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for input in [
            "",
            "abc",
            "2006-0x-06T00:00:00Z",
            "2006-06-06T00:00:0aZ",
            "10:15:30:45",
            "2006-06-06-06T00:00:00Z",
            "2006-06-06T00:00:00Zjunk",
            "2006-06-06T00:00:00+04",
            "2006-06-06T00:00:00.Z",
        ] {
            let err = Instant::parse(input).unwrap_err();
            assert!(err.is_parse(), "input: {input}, err: {err}");
        }
    }

    #[test]
    fn negative_year_round_trips() {
        let instant = utc(-44, 3, 15, 12, 0, 0, 0);
        let printed =
            TimestringPrinter::new().to_timestring(&instant).unwrap();
        assert_eq!(printed, "-0044-03-15T12:00:00Z");
        let parsed = Instant::parse(&printed).unwrap();
        assert!(parsed.equal_to(&instant).unwrap());
    }

    #[test]
    fn reduced_date_forms() {
        let instant = utc(2006, 6, 6, 12, 30, 45, 123456);
        let print = |printer: TimestringPrinter| {
            printer.to_timestring(&instant).unwrap()
        };
        assert_eq!(
            print(TimestringPrinter::new()),
            "2006-06-06T12:30:45.123456Z",
        );
        assert_eq!(
            print(TimestringPrinter::new().date_fields(2)),
            "-06-06T12:30:45.123456Z",
        );
        assert_eq!(
            print(TimestringPrinter::new().date_fields(1)),
            "-06T12:30:45.123456Z",
        );
        assert_eq!(
            print(TimestringPrinter::new().date_fields(0)),
            "12:30:45.123456Z",
        );
    }

    #[test]
    fn reduced_time_forms() {
        let instant = utc(2006, 6, 6, 12, 30, 45, 123456);
        let print = |printer: TimestringPrinter| {
            printer.to_timestring(&instant).unwrap()
        };
        assert_eq!(
            print(TimestringPrinter::new().time_fields(3)),
            "2006-06-06T12:30:45Z",
        );
        assert_eq!(
            print(TimestringPrinter::new().time_fields(2)),
            "2006-06-06T12:30Z",
        );
        assert_eq!(
            print(TimestringPrinter::new().time_fields(1)),
            "2006-06-06T12Z",
        );
        assert_eq!(
            print(TimestringPrinter::new().time_fields(0).omit_timezone(true)),
            "2006-06-06",
        );
        // A zero microsecond means no fraction even at full precision.
        let whole = utc(2006, 6, 6, 12, 30, 45, 0);
        assert_eq!(
            TimestringPrinter::new().to_timestring(&whole).unwrap(),
            "2006-06-06T12:30:45Z",
        );
    }

    #[test]
    fn offset_suffix() {
        let zone = TimeZone::fixed(Offset::from_seconds(-14400).unwrap());
        let instant =
            datetime(2006, 6, 6, 12, 30, 0, 0).to_instant(&zone);
        let printed =
            TimestringPrinter::new().to_timestring(&instant).unwrap();
        assert_eq!(printed, "2006-06-06T12:30:00-04:00");

        let zone = TimeZone::fixed(Offset::from_seconds(19800).unwrap());
        let instant =
            datetime(2006, 6, 6, 12, 30, 0, 0).to_instant(&zone);
        let printed =
            TimestringPrinter::new().to_timestring(&instant).unwrap();
        assert_eq!(printed, "2006-06-06T12:30:00+05:30");

        // With zulu shorthand off, UTC prints as an explicit offset.
        let instant = utc(2006, 6, 6, 12, 30, 0, 0);
        let printed = TimestringPrinter::new()
            .zulu(false)
            .to_timestring(&instant)
            .unwrap();
        assert_eq!(printed, "2006-06-06T12:30:00+00:00");
    }

    #[test]
    fn custom_separators() {
        let instant = utc(2006, 6, 6, 12, 30, 45, 0);
        let printed = TimestringPrinter::new()
            .date_separator(b'/')
            .datetime_separator(b' ')
            .to_timestring(&instant)
            .unwrap();
        assert_eq!(printed, "2006/06/06 12:30:45Z");

        let parsed = TimestringParser::new()
            .date_separator(b'/')
            .datetime_separator(b' ')
            .parse(&printed)
            .unwrap();
        assert!(parsed.equal_to(&instant).unwrap());
    }

    #[test]
    fn print_through_io_writer() {
        let instant = Instant::from_unix_seconds(0);
        let mut wtr = StdWrite(Vec::new());
        TimestringPrinter::new().print(&instant, &mut wtr).unwrap();
        assert_eq!(wtr.0, b"1970-01-01T00:00:00Z");
    }

    quickcheck::quickcheck! {
        fn prop_parse_format_round_trips(
            day: i32,
            second: i32,
            microsecond: i32
        ) -> bool {
            // Stay within years -9999..=9999 so the printed year fits
            // the grammar.
            let day = i64::from(day) % 2_900_000;
            let second = second.rem_euclid(86400);
            let microsecond = microsecond.rem_euclid(1_000_000);
            let (year, month, dom) = crate::civil::from_day_count(day);
            let (hour, minute, sec) = crate::civil::from_second_of_day(second);
            let instant = datetime(
                year as i16, month, dom, hour, minute, sec, microsecond,
            )
            .to_instant(&TimeZone::UTC);

            let printed =
                TimestringPrinter::new().to_timestring(&instant).unwrap();
            let reparsed = Instant::parse(&printed).unwrap();
            let strict = TimestringParser::strict().parse(&printed).unwrap();
            reparsed.equal_to(&instant).unwrap()
                && strict.equal_to(&instant).unwrap()
                && reparsed.microsecond() == instant.microsecond()
        }
    }
}
