/*!
A parser for version 1 TZif binary data, as found in a system `zoneinfo`
directory.

Only the version 1 data block is read. When a file advertises version 2 or
higher, the trailing 64-bit block and footer are ignored, since the 32-bit
data that precedes them is required to be present and is sufficient for
offset resolution in this crate.
*/

use crate::{
    error::{Error, ErrorContext},
    tz::{Dst, Offset, Subzone},
    util::{escape::Bytes, parse},
};

/// The first four bytes of any valid TZif file.
const MAGIC: &[u8] = b"TZif";

/// The parsed representation of TZif binary data.
///
/// Transitions are in ascending order by timestamp. Every transition's
/// subzone index has been bounds checked at parse time, so resolution can
/// index without failing.
#[derive(Debug)]
pub(crate) struct Tzif {
    transitions: Vec<Transition>,
    subzones: Vec<Subzone>,
    leap_seconds: Vec<LeapSecond>,
}

impl Tzif {
    /// Parses the given TZif bytes.
    ///
    /// Truncated data results in an I/O error, while data that is present
    /// but inconsistent (bad magic, out-of-range offsets, dangling subzone
    /// indices) results in a format error.
    pub(crate) fn parse(bytes: &[u8]) -> Result<Tzif, Error> {
        let (header, rest) = Header::parse(bytes)?;
        let (timestamps, rest) = parse_transition_times(&header, rest)?;
        let (indices, rest) = parse_transition_indices(&header, rest)?;
        let (records, rest) = parse_subzone_records(&header, rest)?;
        let (designations, rest) = parse_designations(&header, rest)?;
        let (leap_seconds, rest) = parse_leap_seconds(&header, rest)?;
        // Wall/standard and UT/local indicators close out the version 1
        // data block. They play no role in offset resolution, so the flags
        // are consumed and dropped.
        let (_, rest) = parse::try_split_at("wall/standard indicators", rest, header.wall_count)?;
        let (_, _) = parse::try_split_at("UT/local indicators", rest, header.utc_count)?;
        // Anything after the indicators belongs to a version 2+ data block,
        // which we ignore.

        let mut subzones = Vec::with_capacity(records.len());
        for (i, &(offset_seconds, is_dst, designation_offset)) in records.iter().enumerate() {
            let offset = Offset::from_seconds(offset_seconds).map_err(|_| {
                Error::format(format_args!(
                    "subzone record {i} has out-of-range \
                     UTC offset of {offset_seconds} seconds",
                ))
            })?;
            let dst = Dst::from(is_dst);
            let abbreviation = parse::read_cstring(designations, usize::from(designation_offset))
                .with_context(|| {
                    format!("invalid abbreviation for subzone record {i}")
                })?;
            subzones.push(Subzone::new(offset, dst, abbreviation.into()));
        }

        let mut transitions = Vec::with_capacity(timestamps.len());
        for (i, (&timestamp, &index)) in timestamps.iter().zip(indices.iter()).enumerate() {
            if usize::from(index) >= subzones.len() {
                return Err(Error::format(format_args!(
                    "transition {i} refers to subzone record {index}, \
                     but only {} records exist",
                    subzones.len(),
                )));
            }
            transitions.push(Transition { timestamp, index });
        }
        if let Some(i) =
            transitions.windows(2).position(|w| w[0].timestamp >= w[1].timestamp)
        {
            return Err(Error::format(format_args!(
                "transition times are not in strictly ascending order \
                 (transition {} does not come before transition {})",
                i,
                i + 1,
            )));
        }
        trace!(
            "parsed TZif data with {} transitions across {} subzones",
            transitions.len(),
            subzones.len(),
        );
        Ok(Tzif { transitions, subzones, leap_seconds })
    }

    /// Returns the subzone in effect at the given timestamp.
    ///
    /// The timestamp is interpreted in the same frame as the transition
    /// table, that is, as seconds since the Unix epoch.
    pub(crate) fn to_subzone(&self, unix_seconds: i64) -> &Subzone {
        let search =
            self.transitions.binary_search_by_key(&unix_seconds, |t| t.timestamp);
        let index = match search {
            // Exact hit on a transition means the transition applies.
            Ok(i) => self.transitions[i].index,
            // No transitions at or before the given timestamp, so the
            // first subzone record applies.
            Err(0) => 0,
            // The last transition lower than the given timestamp applies.
            Err(i) => self.transitions[i - 1].index,
        };
        &self.subzones[usize::from(index)]
    }

    /// Returns the subzone in effect at the given local datetime, given as
    /// the number of seconds from the Unix epoch to that datetime read as
    /// if it were UTC.
    ///
    /// Each transition boundary is shifted by the offset of the subzone it
    /// introduces before comparing, since the boundaries themselves are
    /// stored as Unix timestamps. The shifted boundaries are not guaranteed
    /// to be sorted, so this scans instead of bisecting. Scanning from the
    /// most recent transition backwards picks the latest boundary at or
    /// before the given datetime.
    pub(crate) fn to_local_subzone(&self, local_seconds: i64) -> &Subzone {
        for t in self.transitions.iter().rev() {
            let subzone = &self.subzones[usize::from(t.index)];
            let shifted = t.timestamp - i64::from(subzone.offset().seconds());
            if shifted <= local_seconds {
                return subzone;
            }
        }
        &self.subzones[0]
    }

    /// Returns the leap second records, in the order they were stored.
    ///
    /// Leap seconds never participate in offset resolution or instant
    /// arithmetic. They are retained purely for inspection.
    pub(crate) fn leap_seconds(&self) -> &[LeapSecond] {
        &self.leap_seconds
    }
}

/// A single transition out of a TZif transition table.
#[derive(Debug)]
struct Transition {
    /// The number of seconds since the Unix epoch at which the subzone
    /// referred to by `index` comes into effect.
    timestamp: i64,
    /// An index into the subzone record table. Guaranteed in bounds.
    index: u8,
}

/// A leap second record out of a TZif file.
///
/// Records like these only occur in the `right/` set of zoneinfo files. The
/// crate never applies them. They are exposed through
/// [`TimeZone::leap_seconds`](crate::tz::TimeZone::leap_seconds) for callers
/// that want to inspect them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LeapSecond {
    occurrence: i64,
    correction: i32,
}

impl LeapSecond {
    /// The timestamp, in seconds since the Unix epoch, at which this leap
    /// second occurs.
    pub fn occurrence(&self) -> i64 {
        self.occurrence
    }

    /// The total number of leap seconds to apply at and after the
    /// occurrence time.
    pub fn correction(&self) -> i32 {
        self.correction
    }
}

/// The fixed size header of a TZif file: magic, reserved block and six
/// record counts.
#[derive(Debug)]
struct Header {
    /// The number of UT/local indicator bytes.
    utc_count: usize,
    /// The number of wall/standard indicator bytes.
    wall_count: usize,
    /// The number of leap second records.
    leap_count: usize,
    /// The number of transitions.
    transition_count: usize,
    /// The number of subzone records.
    type_count: usize,
    /// The total length, in bytes, of the abbreviation data block.
    abbreviation_len: usize,
}

impl Header {
    /// Parses the 44 byte TZif header and returns it along with everything
    /// after it.
    fn parse(bytes: &[u8]) -> Result<(Header, &[u8]), Error> {
        let (header, rest) = parse::try_split_at("TZif header", bytes, 44)?;
        let (magic, header) = header.split_at(4);
        if magic != MAGIC {
            return Err(Error::format(format_args!(
                "invalid magic bytes {got}, expected {want}",
                got = Bytes(magic),
                want = Bytes(MAGIC),
            )));
        }
        // One version byte and 15 bytes reserved for future use. The
        // version is irrelevant since we only read the version 1 block,
        // which every version is required to carry.
        let (_reserved, header) = header.split_at(16);

        let (bytes, header) = header.split_at(4);
        let utc_count = parse::from_be_bytes_u32_to_usize("UT/local count", bytes)?;
        let (bytes, header) = header.split_at(4);
        let wall_count = parse::from_be_bytes_u32_to_usize("wall/standard count", bytes)?;
        let (bytes, header) = header.split_at(4);
        let leap_count = parse::from_be_bytes_u32_to_usize("leap second count", bytes)?;
        let (bytes, header) = header.split_at(4);
        let transition_count = parse::from_be_bytes_u32_to_usize("transition count", bytes)?;
        let (bytes, header) = header.split_at(4);
        let type_count = parse::from_be_bytes_u32_to_usize("subzone record count", bytes)?;
        let (bytes, _) = header.split_at(4);
        let abbreviation_len = parse::from_be_bytes_u32_to_usize("abbreviation length", bytes)?;

        if type_count == 0 {
            return Err(Error::format(format_args!(
                "at least one subzone record is required, but found 0",
            )));
        }
        let header = Header {
            utc_count,
            wall_count,
            leap_count,
            transition_count,
            type_count,
            abbreviation_len,
        };
        Ok((header, rest))
    }
}

/// Parses the transition time table: one 4 byte big endian signed integer
/// per transition.
fn parse_transition_times<'b>(
    header: &Header,
    bytes: &'b [u8],
) -> Result<(Vec<i64>, &'b [u8]), Error> {
    let len = section_len("transition times", header.transition_count, 4)?;
    let (bytes, rest) = parse::try_split_at("transition times", bytes, len)?;
    let mut timestamps = Vec::with_capacity(header.transition_count);
    for chunk in bytes.chunks_exact(4) {
        timestamps.push(i64::from(parse::from_be_bytes_i32(chunk)));
    }
    Ok((timestamps, rest))
}

/// Parses the table mapping each transition to a subzone record: one byte
/// per transition.
fn parse_transition_indices<'b>(
    header: &Header,
    bytes: &'b [u8],
) -> Result<(Vec<u8>, &'b [u8]), Error> {
    let (bytes, rest) =
        parse::try_split_at("transition indices", bytes, header.transition_count)?;
    Ok((bytes.to_vec(), rest))
}

/// Parses the subzone record table. Each record is 6 bytes: a 4 byte big
/// endian signed UTC offset in seconds, a DST flag byte and an index into
/// the abbreviation data block.
fn parse_subzone_records<'b>(
    header: &Header,
    bytes: &'b [u8],
) -> Result<(Vec<(i32, bool, u8)>, &'b [u8]), Error> {
    let len = section_len("subzone records", header.type_count, 6)?;
    let (bytes, rest) = parse::try_split_at("subzone records", bytes, len)?;
    let mut records = Vec::with_capacity(header.type_count);
    for chunk in bytes.chunks_exact(6) {
        let offset = parse::from_be_bytes_i32(&chunk[..4]);
        let is_dst = chunk[4] == 1;
        let designation_offset = chunk[5];
        records.push((offset, is_dst, designation_offset));
    }
    Ok((records, rest))
}

/// Splits off the abbreviation data block: a sequence of NUL terminated
/// byte strings that subzone records index into.
fn parse_designations<'b>(
    header: &Header,
    bytes: &'b [u8],
) -> Result<(&'b [u8], &'b [u8]), Error> {
    parse::try_split_at("abbreviation data", bytes, header.abbreviation_len)
}

/// Parses the leap second records. Each record is 8 bytes: a 4 byte big
/// endian occurrence timestamp followed by a 4 byte big endian cumulative
/// correction.
fn parse_leap_seconds<'b>(
    header: &Header,
    bytes: &'b [u8],
) -> Result<(Vec<LeapSecond>, &'b [u8]), Error> {
    let len = section_len("leap second records", header.leap_count, 8)?;
    let (bytes, rest) = parse::try_split_at("leap second records", bytes, len)?;
    let mut leap_seconds = Vec::with_capacity(header.leap_count);
    for chunk in bytes.chunks_exact(8) {
        let occurrence = i64::from(parse::from_be_bytes_i32(&chunk[..4]));
        let correction = parse::from_be_bytes_i32(&chunk[4..]);
        leap_seconds.push(LeapSecond { occurrence, correction });
    }
    Ok((leap_seconds, rest))
}

/// Returns `count * width`, or an error when that length overflows `usize`.
fn section_len(
    what: &'static str,
    count: usize,
    width: usize,
) -> Result<usize, Error> {
    count.checked_mul(width).ok_or_else(|| {
        Error::format(format_args!(
            "{what} length would overflow ({count} records of {width} bytes)",
        ))
    })
}

/// Returns true when the given bytes start with the TZif magic.
///
/// This is a quick filter for directory crawls over `/usr/share/zoneinfo`,
/// which contains non-TZif files like `tzdata.zi` and `leapseconds`.
pub(crate) fn is_possibly_tzif(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC)
}

#[cfg(test)]
mod tests {
    use crate::tz::testdata::TzifBuilder;

    use super::*;

    fn new_york_2006() -> Tzif {
        Tzif::parse(&crate::tz::testdata::new_york_2006()).unwrap()
    }

    #[test]
    fn parse_counts() {
        let tzif = new_york_2006();
        assert_eq!(2, tzif.transitions.len());
        assert_eq!(2, tzif.subzones.len());
        assert_eq!(0, tzif.leap_seconds.len());
    }

    #[test]
    fn to_subzone_picks_latest_transition_at_or_before() {
        let tzif = new_york_2006();
        // 2006-04-02T07:00:00Z, the exact instant EDT begins.
        assert_eq!("EDT", tzif.to_subzone(1143961200).abbreviation());
        assert_eq!(-4 * 3600, tzif.to_subzone(1143961200).offset().seconds());
        // One second before.
        assert_eq!("EST", tzif.to_subzone(1143961199).abbreviation());
        // Midsummer.
        assert_eq!("EDT", tzif.to_subzone(1149611400).abbreviation());
        // 2006-10-29T06:00:00Z, the exact instant EST resumes.
        assert_eq!("EST", tzif.to_subzone(1162101600).abbreviation());
        assert_eq!(-5 * 3600, tzif.to_subzone(1162101600).offset().seconds());
    }

    #[test]
    fn to_subzone_defaults_to_first_record() {
        let tzif = new_york_2006();
        // Long before the first transition.
        assert_eq!("EST", tzif.to_subzone(0).abbreviation());
        assert_eq!("EST", tzif.to_subzone(i64::from(i32::MIN)).abbreviation());
    }

    #[test]
    fn to_subzone_without_transitions() {
        let bytes = TzifBuilder::new()
            .subzone(2 * 3600, false, "FOO")
            .build();
        let tzif = Tzif::parse(&bytes).unwrap();
        assert_eq!("FOO", tzif.to_subzone(0).abbreviation());
        assert_eq!("FOO", tzif.to_subzone(i64::MAX).abbreviation());
        assert_eq!("FOO", tzif.to_local_subzone(i64::MIN).abbreviation());
    }

    #[test]
    fn to_local_subzone_shifts_boundaries() {
        let tzif = new_york_2006();
        // The boundary into EDT is 1143961200 shifted by the EDT offset of
        // -14400, so 1143975600 in the local frame.
        assert_eq!("EST", tzif.to_local_subzone(1143975599).abbreviation());
        assert_eq!("EDT", tzif.to_local_subzone(1143975600).abbreviation());
        // The boundary back into EST is 1162101600 shifted by -18000.
        assert_eq!("EDT", tzif.to_local_subzone(1162119599).abbreviation());
        assert_eq!("EST", tzif.to_local_subzone(1162119600).abbreviation());
    }

    #[test]
    fn parse_leap_seconds() {
        let bytes = TzifBuilder::new()
            .subzone(0, false, "UTC")
            .leap_second(78796800, 1)
            .leap_second(94694401, 2)
            .build();
        let tzif = Tzif::parse(&bytes).unwrap();
        assert_eq!(
            &[
                LeapSecond { occurrence: 78796800, correction: 1 },
                LeapSecond { occurrence: 94694401, correction: 2 },
            ],
            tzif.leap_seconds(),
        );
        // Leap second records have no bearing on resolution.
        assert_eq!("UTC", tzif.to_subzone(94694401).abbreviation());
    }

    #[test]
    fn reject_bad_magic() {
        let mut bytes = crate::tz::testdata::new_york_2006();
        bytes[0] = b'S';
        let err = Tzif::parse(&bytes).unwrap_err();
        assert!(err.is_format(), "unexpected error: {err}");
    }

    #[test]
    fn reject_truncated() {
        let bytes = crate::tz::testdata::new_york_2006();
        for len in [0, 4, 43, 44, bytes.len() - 1] {
            let err = Tzif::parse(&bytes[..len]).unwrap_err();
            assert!(err.is_io(), "length {len} gave unexpected error: {err}");
        }
    }

    #[test]
    fn reject_dangling_subzone_index() {
        let bytes = TzifBuilder::new()
            .subzone(0, false, "UTC")
            .transition(1143961200, 9)
            .build();
        let err = Tzif::parse(&bytes).unwrap_err();
        assert!(err.is_format(), "unexpected error: {err}");
    }

    #[test]
    fn reject_unsorted_transitions() {
        let bytes = TzifBuilder::new()
            .subzone(0, false, "UTC")
            .subzone(3600, true, "UTX")
            .transition(1000, 1)
            .transition(999, 0)
            .build();
        let err = Tzif::parse(&bytes).unwrap_err();
        assert!(err.is_format(), "unexpected error: {err}");
    }

    #[test]
    fn reject_out_of_range_offset() {
        let bytes = TzifBuilder::new()
            .subzone(200000, false, "BAD")
            .build();
        let err = Tzif::parse(&bytes).unwrap_err();
        assert!(err.is_format(), "unexpected error: {err}");
    }

    /// Parses every TZif file in the system zoneinfo directory.
    ///
    /// This is the greatest coverage we can get from real data, but since
    /// not all environments have a zoneinfo directory, it quietly passes
    /// when there is nothing to read.
    #[test]
    fn crawl_system_zoneinfo() {
        const TZDIR: &str = "/usr/share/zoneinfo";

        for result in walkdir::WalkDir::new(TZDIR) {
            let Ok(dent) = result else { continue };
            if !dent.file_type().is_file() {
                continue;
            }
            // The `right` set bakes leap seconds into its transition
            // tables and `posix` is just a mirror of the main set. Neither
            // adds coverage here.
            let path_str = dent.path().to_string_lossy();
            if path_str.contains("right/") || path_str.contains("posix/") {
                continue;
            }
            let Ok(bytes) = std::fs::read(dent.path()) else { continue };
            if !is_possibly_tzif(&bytes) {
                continue;
            }
            if let Err(err) = Tzif::parse(&bytes) {
                panic!("failed to parse TZif file {:?}: {err}", dent.path());
            }
        }
    }
}
