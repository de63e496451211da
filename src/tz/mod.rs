/*!
Time zone support.

The central type here is [`TimeZone`]. It comes in three flavors: the
canonical UTC zone, a zone with a fixed offset from UTC and a zone backed by
a version 1 TZif file on disk. TZif backed zones read their file lazily, on
the first lookup, and then share the parsed data with every clone of the
zone.

A zone answers two kinds of questions. [`TimeZone::to_subzone`] maps a
timestamp to the [`Subzone`] in effect at that time, which carries a UTC
[`Offset`], a [`Dst`] flag and an abbreviation like `EST`. Its counterpart
[`TimeZone::to_local_subzone`] answers the same question for a datetime
expressed in the zone's own clock rather than in UTC.

This module also owns the process-wide default zone used when formatting and
parsing without an explicit zone. See [`default_time_zone`].
*/

use std::{
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use crate::error::Error;

use self::tzif::Tzif;

pub use self::tzif::LeapSecond;

#[cfg(test)]
pub(crate) mod testdata;
mod tzif;

/// The file read to discover the system time zone.
const LOCALTIME_PATH: &str = "/etc/localtime";

static DEFAULT_TIME_ZONE: RwLock<Option<TimeZone>> = RwLock::new(None);

/// Returns the process-wide default time zone.
///
/// On first use, this reads the system time zone from `/etc/localtime`.
/// When that file is missing or malformed, the default is UTC. The `TZ`
/// environment variable is never consulted. Callers that want different
/// discovery can perform it themselves and install the result with
/// [`set_default_time_zone`].
pub fn default_time_zone() -> TimeZone {
    {
        let guard = read_lock(&DEFAULT_TIME_ZONE);
        if let Some(time_zone) = &*guard {
            return time_zone.clone();
        }
    }
    let mut guard = write_lock(&DEFAULT_TIME_ZONE);
    // Another thread may have won the race to initialize.
    if let Some(time_zone) = &*guard {
        return time_zone.clone();
    }
    let time_zone = read_system_time_zone();
    *guard = Some(time_zone.clone());
    time_zone
}

/// Sets the process-wide default time zone.
///
/// This applies to every subsequent use of the default, in all threads.
pub fn set_default_time_zone(time_zone: TimeZone) {
    debug!("installing new default time zone: {time_zone:?}");
    *write_lock(&DEFAULT_TIME_ZONE) = Some(time_zone);
}

fn read_system_time_zone() -> TimeZone {
    let time_zone = TimeZone::from_path(LOCALTIME_PATH);
    match time_zone.load(false) {
        Ok(()) => time_zone,
        Err(_err) => {
            warn!("failed to load {LOCALTIME_PATH}, falling back to UTC: {_err}");
            TimeZone::UTC
        }
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// A representation of a time zone.
///
/// A time zone maps timestamps to the offset from UTC in effect at that
/// time, along with a DST flag and an abbreviation. Zones backed by TZif
/// files hold a table of transitions to search. The UTC and fixed offset
/// flavors have no transitions and resolve every timestamp to the same
/// subzone.
///
/// # Lazy loading
///
/// [`TimeZone::from_path`] does no I/O. The file is read and parsed on the
/// first lookup, or eagerly via [`TimeZone::load`]. Cloning a `TimeZone` is
/// cheap and clones share their parsed data, so loading through one clone
/// makes the data available to all of them.
///
/// Because loading can fail, every lookup on a TZif backed zone returns a
/// `Result`. Lookups on UTC and fixed offset zones never fail, but carry
/// the same signatures so that callers need not care which flavor they
/// hold.
#[derive(Clone, Debug)]
pub struct TimeZone {
    kind: Option<Arc<TimeZoneKind>>,
}

impl TimeZone {
    /// The UTC time zone.
    pub const UTC: TimeZone = TimeZone { kind: None };

    /// Creates a time zone with a fixed offset from UTC.
    ///
    /// A fixed offset zone has no transitions. Every timestamp resolves to
    /// the same offset, with no DST. Giving a zero offset returns the
    /// canonical UTC zone itself, so `TimeZone::fixed(Offset::UTC)` and
    /// [`TimeZone::UTC`] are indistinguishable.
    pub fn fixed(offset: Offset) -> TimeZone {
        if offset == Offset::UTC {
            return TimeZone::UTC;
        }
        TimeZone { kind: Some(Arc::new(TimeZoneKind::Fixed(offset))) }
    }

    /// Creates a time zone backed by the TZif file at the given path.
    ///
    /// No I/O is performed here. The file is read on first use. Callers
    /// that want load failures surfaced early should call
    /// [`TimeZone::load`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> TimeZone {
        let db = Database {
            path: path.as_ref().to_path_buf(),
            tzif: RwLock::new(None),
        };
        TimeZone { kind: Some(Arc::new(TimeZoneKind::Db(db))) }
    }

    /// Reads and parses this zone's TZif file.
    ///
    /// When data has already been loaded and `force` is false, this does
    /// nothing. With `force` set, the file is re-read even when data is
    /// present, which picks up changes made to the file since the last
    /// load. If the re-read fails, previously loaded data is retained.
    ///
    /// For the UTC and fixed offset flavors this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file is missing or truncated, and a
    /// format error when its contents are not valid TZif data. In both
    /// cases the error is annotated with the file path, and any previously
    /// loaded data remains in effect.
    pub fn load(&self, force: bool) -> Result<(), Error> {
        match self.kind.as_deref() {
            None | Some(TimeZoneKind::Fixed(_)) => Ok(()),
            Some(TimeZoneKind::Db(db)) => db.load(force).map(|_| ()),
        }
    }

    /// Returns true when lookups on this zone can be answered without I/O.
    ///
    /// This is always true for the UTC and fixed offset flavors.
    pub fn is_loaded(&self) -> bool {
        match self.kind.as_deref() {
            None | Some(TimeZoneKind::Fixed(_)) => true,
            Some(TimeZoneKind::Db(db)) => read_lock(&db.tzif).is_some(),
        }
    }

    /// Returns true when this is the canonical UTC time zone.
    ///
    /// This is an identity test, not a semantic one. A TZif backed zone
    /// whose data happens to describe UTC is not the canonical UTC zone.
    pub fn is_utc(&self) -> bool {
        self.kind.is_none()
    }

    /// Returns the path to the backing TZif file, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self.kind.as_deref() {
            Some(TimeZoneKind::Db(db)) => Some(&db.path),
            _ => None,
        }
    }

    /// Returns the subzone in effect at the given timestamp, expressed in
    /// seconds since the Unix epoch.
    pub fn to_subzone(&self, timestamp: i64) -> Result<Subzone, Error> {
        match self.kind.as_deref() {
            None => Ok(Subzone::utc()),
            Some(TimeZoneKind::Fixed(offset)) => Ok(Subzone::fixed(*offset)),
            Some(TimeZoneKind::Db(db)) => {
                Ok(db.get()?.to_subzone(timestamp).clone())
            }
        }
    }

    /// Returns the offset from UTC in effect at the given timestamp,
    /// expressed in seconds since the Unix epoch.
    pub fn to_offset(&self, timestamp: i64) -> Result<Offset, Error> {
        match self.kind.as_deref() {
            None => Ok(Offset::UTC),
            Some(TimeZoneKind::Fixed(offset)) => Ok(*offset),
            Some(TimeZoneKind::Db(db)) => {
                Ok(db.get()?.to_subzone(timestamp).offset())
            }
        }
    }

    /// Returns the subzone in effect at the given datetime read off this
    /// zone's own clock, expressed as seconds from the Unix epoch to that
    /// datetime as if it were UTC.
    ///
    /// This differs from [`TimeZone::to_subzone`] in which frame the
    /// transition search happens. Transition boundaries are stored as UTC
    /// timestamps, so answering a question about the zone's local clock
    /// shifts each boundary by the offset it introduces before comparing.
    pub fn to_local_subzone(&self, local_timestamp: i64) -> Result<Subzone, Error> {
        match self.kind.as_deref() {
            None => Ok(Subzone::utc()),
            Some(TimeZoneKind::Fixed(offset)) => Ok(Subzone::fixed(*offset)),
            Some(TimeZoneKind::Db(db)) => {
                Ok(db.get()?.to_local_subzone(local_timestamp).clone())
            }
        }
    }

    /// Returns the offset from UTC in effect at the given datetime read
    /// off this zone's own clock.
    ///
    /// See [`TimeZone::to_local_subzone`] for what "local" means here.
    pub fn to_local_offset(&self, local_timestamp: i64) -> Result<Offset, Error> {
        match self.kind.as_deref() {
            None => Ok(Offset::UTC),
            Some(TimeZoneKind::Fixed(offset)) => Ok(*offset),
            Some(TimeZoneKind::Db(db)) => {
                Ok(db.get()?.to_local_subzone(local_timestamp).offset())
            }
        }
    }

    /// Returns the leap second records carried by this zone's TZif data.
    ///
    /// Most zoneinfo files carry none. The `right/` set is the exception.
    /// Nothing in this crate consults these records. Offset resolution and
    /// instant arithmetic both ignore leap seconds entirely. They are
    /// surfaced only so that callers can inspect what the file declares.
    pub fn leap_seconds(&self) -> Result<Vec<LeapSecond>, Error> {
        match self.kind.as_deref() {
            None | Some(TimeZoneKind::Fixed(_)) => Ok(Vec::new()),
            Some(TimeZoneKind::Db(db)) => Ok(db.get()?.leap_seconds().to_vec()),
        }
    }
}

impl PartialEq for TimeZone {
    fn eq(&self, other: &TimeZone) -> bool {
        match (&self.kind, &other.kind) {
            (None, None) => true,
            (Some(a), Some(b)) => match (a.as_ref(), b.as_ref()) {
                (TimeZoneKind::Fixed(x), TimeZoneKind::Fixed(y)) => x == y,
                // TZif backed zones compare by identity. Two zones built
                // from the same path independently may disagree about
                // what they have loaded.
                (TimeZoneKind::Db(_), TimeZoneKind::Db(_)) => Arc::ptr_eq(a, b),
                _ => false,
            },
            _ => false,
        }
    }
}

impl Eq for TimeZone {}

#[derive(Debug)]
enum TimeZoneKind {
    Fixed(Offset),
    Db(Database),
}

/// A lazily read TZif file.
#[derive(Debug)]
struct Database {
    path: PathBuf,
    tzif: RwLock<Option<Arc<Tzif>>>,
}

impl Database {
    /// Returns the parsed TZif data, reading the file if none is present.
    fn get(&self) -> Result<Arc<Tzif>, Error> {
        {
            let guard = read_lock(&self.tzif);
            if let Some(tzif) = &*guard {
                return Ok(Arc::clone(tzif));
            }
        }
        self.load(false)
    }

    /// Reads and parses the file, stores the result and returns it.
    ///
    /// Without `force`, data already present is returned untouched. The
    /// write lock is held across the read so concurrent first loads do the
    /// work once.
    fn load(&self, force: bool) -> Result<Arc<Tzif>, Error> {
        let mut guard = write_lock(&self.tzif);
        if !force {
            if let Some(tzif) = &*guard {
                return Ok(Arc::clone(tzif));
            }
        }
        let bytes = std::fs::read(&self.path)
            .map_err(|err| Error::io(err).path(&self.path))?;
        let tzif = Tzif::parse(&bytes).map_err(|err| err.path(&self.path))?;
        debug!(
            "loaded time zone from {path}",
            path = self.path.display(),
        );
        let tzif = Arc::new(tzif);
        *guard = Some(Arc::clone(&tzif));
        Ok(tzif)
    }
}

/// One of the states a time zone can occupy: an offset from UTC, whether
/// that offset is daylight saving time and an abbreviation for it.
///
/// For a TZif backed zone these correspond to the file's subzone records.
/// The UTC and fixed offset zones have exactly one state each.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Subzone {
    offset: Offset,
    dst: Dst,
    abbreviation: Box<str>,
}

impl Subzone {
    pub(crate) fn new(offset: Offset, dst: Dst, abbreviation: Box<str>) -> Subzone {
        Subzone { offset, dst, abbreviation }
    }

    fn utc() -> Subzone {
        Subzone::new(Offset::UTC, Dst::No, "UTC".into())
    }

    /// The synthetic subzone of a fixed offset zone. Its abbreviation is
    /// the offset itself, like `-04`.
    fn fixed(offset: Offset) -> Subzone {
        Subzone::new(offset, Dst::No, offset.to_string().into())
    }

    /// The offset from UTC in this state.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// Whether this state is daylight saving time.
    pub fn dst(&self) -> Dst {
        self.dst
    }

    /// The abbreviation for this state, like `EST` or `EDT`.
    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }
}

/// An offset from UTC, in seconds, where positive offsets are east of the
/// prime meridian.
///
/// An offset is limited to the range `-25:59:59..=25:59:59`, which covers
/// everything a TZif subzone record may legally carry with room to spare.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Offset {
    seconds: i32,
}

impl Offset {
    /// The zero offset.
    pub const UTC: Offset = Offset { seconds: 0 };

    /// The minimum allowed offset, `-25:59:59`.
    pub const MIN: Offset = Offset { seconds: -93599 };

    /// The maximum allowed offset, `25:59:59`.
    pub const MAX: Offset = Offset { seconds: 93599 };

    /// Creates an offset of the given number of hours.
    ///
    /// # Panics
    ///
    /// When the number of hours is out of range. This is meant for writing
    /// down offsets known at compile time, like `Offset::constant(-5)`.
    /// Use [`Offset::from_seconds`] for offsets computed at runtime.
    pub const fn constant(hours: i8) -> Offset {
        if hours <= -26 || 26 <= hours {
            panic!("invalid fixed offset hours");
        }
        Offset { seconds: hours as i32 * 3600 }
    }

    /// Creates an offset of the given number of seconds east of UTC.
    ///
    /// # Errors
    ///
    /// When the given value falls outside `-93599..=93599`.
    pub fn from_seconds(seconds: i32) -> Result<Offset, Error> {
        if seconds < Offset::MIN.seconds || Offset::MAX.seconds < seconds {
            return Err(Error::range(
                "offset seconds",
                seconds,
                Offset::MIN.seconds,
                Offset::MAX.seconds,
            ));
        }
        Ok(Offset { seconds })
    }

    /// Returns this offset as a number of seconds east of UTC.
    pub fn seconds(self) -> i32 {
        self.seconds
    }

    /// Returns true when this offset is west of UTC.
    pub fn is_negative(self) -> bool {
        self.seconds < 0
    }
}

impl core::fmt::Display for Offset {
    /// Writes this offset in the format `{sign}{hours}[:{minutes}[:{seconds}]]`,
    /// where the minutes and seconds are only written when non-zero.
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let sign = if self.seconds < 0 { "-" } else { "+" };
        let total = self.seconds.unsigned_abs();
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        if minutes == 0 && seconds == 0 {
            write!(f, "{sign}{hours:02}")
        } else if seconds == 0 {
            write!(f, "{sign}{hours:02}:{minutes:02}")
        } else {
            write!(f, "{sign}{hours:02}:{minutes:02}:{seconds:02}")
        }
    }
}

impl core::fmt::Debug for Offset {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Offset({self})")
    }
}

/// Whether a particular subzone is in daylight saving time or not.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Dst {
    /// DST is in effect.
    Yes,
    /// DST is not in effect.
    No,
}

impl Dst {
    /// Converts from a boolean where `true` means DST is in effect.
    pub fn from(is_dst: bool) -> Dst {
        if is_dst {
            Dst::Yes
        } else {
            Dst::No
        }
    }

    /// Returns true when DST is in effect.
    pub fn is_dst(self) -> bool {
        matches!(self, Dst::Yes)
    }
}
