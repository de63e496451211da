/*!
Zonetime is a library for absolute instants in time paired with a time
zone, with lossless conversion to and from civil calendar fields.

The central type is [`Instant`]: a day count, a second of the day and a
microsecond, read off the clock of the instant's own [`TimeZone`].
Expressing an instant in another zone with [`Instant::in_time_zone`]
shifts those fields so that both values name the same absolute time,
which is what makes instants in different zones comparable.

Time zones come from precompiled binary transition tables in the TZif
format, the same files shipped under `/usr/share/zoneinfo` on most Unix
systems. Loading is lazy: constructing a [`TimeZone`] from a path does no
I/O until the zone's data is first needed.

# Examples

Parse a timestamp carrying a UTC offset, then express it in UTC:

```
use zonetime::{Instant, TimeZone};

fn example() -> Result<(), zonetime::Error> {
    let instant = Instant::parse("2006-06-06T12:30:00-04:00")?;
    let utc = instant.in_time_zone(&TimeZone::UTC)?;
    assert_eq!(utc.to_string(), "2006-06-06T16:30:00Z");
    Ok(())
}
# example().unwrap();
```

Convert civil calendar fields to an instant and back:

```
use zonetime::{civil::datetime, TimeZone};

fn example() -> Result<(), zonetime::Error> {
    let instant = datetime(2006, 6, 6, 16, 30, 0, 0)
        .to_instant(&TimeZone::UTC);
    assert_eq!(instant.unix_seconds()?, 1149611400);
    assert_eq!(instant.weekday().name(), "Tuesday");
    Ok(())
}
# example().unwrap();
```

# The calendar

Civil fields follow the proleptic Gregorian calendar with one deliberate
simplification: every fourth year is a leap year, with no century
exception. See [`civil`] for the details and the consequences. Leap
seconds are surfaced from timezone data via
[`TimeZone::leap_seconds`](crate::tz::TimeZone::leap_seconds) but never
applied to arithmetic.

# Crate features

* **logging** - Emits diagnostic messages about timezone data loading via
the `log` crate. There is no logging output by default.
* **serde** - Implements `serde::Serialize` and `serde::Deserialize` for
[`Instant`], using the canonical timestring form.
*/

#![deny(rustdoc::broken_intra_doc_links)]
// We generally want all types to impl Debug.
#![warn(missing_debug_implementations)]

pub use crate::{error::Error, instant::Instant, tz::TimeZone};

#[macro_use]
mod logging;

pub mod civil;
mod error;
pub mod fmt;
mod instant;
pub mod tz;
mod util;

#[cfg(test)]
mod tests {
    use super::*;

    // A whole-crate pass through the public API: text in, zone shift,
    // comparison, arithmetic and text back out.
    #[test]
    fn end_to_end() {
        let departure = Instant::parse("2006-06-06T12:30:00-04:00").unwrap();
        let arrival = Instant::parse("2006-06-06T22:15:30Z").unwrap();
        assert!(departure.before(&arrival).unwrap());

        let flight = arrival.difference(&departure).unwrap();
        assert_eq!(flight.day(), 0);
        assert_eq!(flight.second(), 5 * 3600 + 45 * 60 + 30);

        let utc = departure.in_time_zone(&TimeZone::UTC).unwrap();
        assert_eq!(utc.to_string(), "2006-06-06T16:30:00Z");
        assert_eq!(utc.unix_seconds().unwrap(), 1149611400);
    }
}
