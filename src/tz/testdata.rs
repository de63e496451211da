/*!
Fixtures for time zone tests.

Rather than shipping binary files, tests assemble the TZif data they need
with [`TzifBuilder`]. That keeps each fixture's transition table in plain
sight next to the assertions that depend on it.
*/

use std::path::PathBuf;

/// A builder for version 1 TZif binary data.
///
/// The builder performs no validation. Tests that exercise parser errors
/// rely on being able to produce inconsistent data, like transitions that
/// refer to subzone records that don't exist.
#[derive(Debug, Default)]
pub(crate) struct TzifBuilder {
    transitions: Vec<(i32, u8)>,
    subzones: Vec<(i32, bool, String)>,
    leap_seconds: Vec<(i32, i32)>,
}

impl TzifBuilder {
    pub(crate) fn new() -> TzifBuilder {
        TzifBuilder::default()
    }

    /// Adds a transition to the subzone record at `index`, effective at
    /// `timestamp` seconds after the Unix epoch.
    pub(crate) fn transition(mut self, timestamp: i32, index: u8) -> TzifBuilder {
        self.transitions.push((timestamp, index));
        self
    }

    /// Adds a subzone record with the given UTC offset in seconds.
    pub(crate) fn subzone(
        mut self,
        offset: i32,
        dst: bool,
        abbreviation: &str,
    ) -> TzifBuilder {
        self.subzones.push((offset, dst, abbreviation.to_string()));
        self
    }

    /// Adds a leap second record.
    pub(crate) fn leap_second(
        mut self,
        occurrence: i32,
        correction: i32,
    ) -> TzifBuilder {
        self.leap_seconds.push((occurrence, correction));
        self
    }

    /// Serializes the accumulated tables into TZif bytes.
    pub(crate) fn build(&self) -> Vec<u8> {
        let mut designations = Vec::new();
        let mut designation_offsets = Vec::new();
        for (_, _, abbreviation) in &self.subzones {
            designation_offsets.push(u8::try_from(designations.len()).unwrap());
            designations.extend_from_slice(abbreviation.as_bytes());
            designations.push(0);
        }

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"TZif");
        // A version byte of NUL marks version 1 data, followed by 15
        // unused bytes.
        bytes.extend_from_slice(&[0; 16]);
        let counts = [
            // UT/local and wall/standard indicators, one per subzone
            // record, as zic emits them.
            self.subzones.len(),
            self.subzones.len(),
            self.leap_seconds.len(),
            self.transitions.len(),
            self.subzones.len(),
            designations.len(),
        ];
        for count in counts {
            bytes.extend_from_slice(&u32::try_from(count).unwrap().to_be_bytes());
        }
        for &(timestamp, _) in &self.transitions {
            bytes.extend_from_slice(&timestamp.to_be_bytes());
        }
        for &(_, index) in &self.transitions {
            bytes.push(index);
        }
        for (i, &(offset, dst, _)) in self.subzones.iter().enumerate() {
            bytes.extend_from_slice(&offset.to_be_bytes());
            bytes.push(u8::from(dst));
            bytes.push(designation_offsets[i]);
        }
        bytes.extend_from_slice(&designations);
        for &(occurrence, correction) in &self.leap_seconds {
            bytes.extend_from_slice(&occurrence.to_be_bytes());
            bytes.extend_from_slice(&correction.to_be_bytes());
        }
        // Wall/standard indicators, then UT/local indicators, all zero.
        bytes.extend(std::iter::repeat(0).take(2 * self.subzones.len()));
        bytes
    }
}

/// TZif bytes for a zone equivalent to America/New_York during 2006.
///
/// Two transitions: into EDT at 2006-04-02T07:00:00Z and back to EST at
/// 2006-10-29T06:00:00Z. Subzone record 0 is EST, so timestamps before the
/// first transition also resolve to standard time.
pub(crate) fn new_york_2006() -> Vec<u8> {
    TzifBuilder::new()
        .subzone(-5 * 3600, false, "EST")
        .subzone(-4 * 3600, true, "EDT")
        .transition(1143961200, 1)
        .transition(1162101600, 0)
        .build()
}

/// Writes the given bytes to a fresh file in the system temp directory and
/// returns its path.
///
/// The name must be unique within the test binary. The file is left behind
/// on purpose so that a failing test can be inspected.
pub(crate) fn write_fixture(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir()
        .join(format!("zonetime-test-{}-{name}.tzif", std::process::id()));
    std::fs::write(&path, bytes).unwrap();
    path
}
