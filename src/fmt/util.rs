/// A simple formatter for converting `i64` values to ASCII byte strings.
///
/// This avoids going through the standard library formatting machinery,
/// which seems to substantially slow things down.
///
/// The `itoa` crate does the same thing as this formatter, but is a bit
/// faster. We roll our own which is a bit slower, but gets us enough of a
/// win to be satisfied with and with pure safe code.
#[derive(Clone, Debug)]
pub(crate) struct DecimalFormatter {
    minimum_digits: Option<u8>,
}

impl DecimalFormatter {
    /// Creates a new decimal formatter using the default configuration.
    pub(crate) const fn new() -> DecimalFormatter {
        DecimalFormatter { minimum_digits: None }
    }

    /// Format the given value using this configuration as a decimal ASCII
    /// number.
    pub(crate) const fn format(&self, value: i64) -> Decimal {
        Decimal::new(self, value)
    }

    /// The minimum number of digits that this number should be formatted
    /// with. If the number would have fewer digits than this, then it is
    /// padded out with zeros until the minimum is reached. The sign is not
    /// counted as a digit, so `-44` at a minimum of 4 digits is `-0044`.
    ///
    /// The minimum number of digits is capped at the maximum number of
    /// digits for an i64 value (which is 19).
    pub(crate) const fn minimum_digits(
        self,
        mut digits: u8,
    ) -> DecimalFormatter {
        if digits > Decimal::MAX_I64_DIGITS {
            digits = Decimal::MAX_I64_DIGITS;
        }
        DecimalFormatter { minimum_digits: Some(digits) }
    }
}

impl Default for DecimalFormatter {
    fn default() -> DecimalFormatter {
        DecimalFormatter::new()
    }
}

/// A formatted decimal number that can be converted to a sequence of bytes.
#[derive(Debug)]
pub(crate) struct Decimal {
    buf: [u8; Self::MAX_I64_LEN as usize],
    start: u8,
}

impl Decimal {
    /// Discovered via `i64::MIN.to_string().len()`.
    const MAX_I64_LEN: u8 = 20;
    /// Discovered via `i64::MAX.to_string().len()`.
    const MAX_I64_DIGITS: u8 = 19;

    /// Using the given formatter, turn the value given into a decimal
    /// representation using ASCII bytes.
    pub(crate) const fn new(
        formatter: &DecimalFormatter,
        value: i64,
    ) -> Decimal {
        let sign = value.signum();
        let Some(mut value) = value.checked_abs() else {
            let buf = [
                b'-', b'9', b'2', b'2', b'3', b'3', b'7', b'2', b'0', b'3',
                b'6', b'8', b'5', b'4', b'7', b'7', b'5', b'8', b'0', b'8',
            ];
            return Decimal { buf, start: 0 };
        };
        let mut decimal = Decimal {
            buf: [0; Self::MAX_I64_LEN as usize],
            start: Self::MAX_I64_LEN,
        };
        loop {
            decimal.start -= 1;

            let digit = (value % 10) as u8;
            value /= 10;
            decimal.buf[decimal.start as usize] = b'0' + digit;
            if value == 0 {
                break;
            }
        }
        if let Some(minimum_digits) = formatter.minimum_digits {
            while decimal.len() < minimum_digits {
                decimal.start -= 1;
                decimal.buf[decimal.start as usize] = b'0';
            }
        }
        if sign < 0 {
            decimal.start -= 1;
            decimal.buf[decimal.start as usize] = b'-';
        }
        decimal
    }

    /// Returns the total number of ASCII bytes (including the sign) that
    /// are used to represent this decimal number.
    const fn len(&self) -> u8 {
        Self::MAX_I64_LEN - self.start
    }

    /// Returns the ASCII representation of this decimal as a byte slice.
    ///
    /// The slice returned is guaranteed to be valid ASCII.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[usize::from(self.start)..]
    }

    /// Returns the ASCII representation of this decimal as a string slice.
    pub(crate) fn as_str(&self) -> &str {
        // SAFETY: This is safe because all bytes written to `self.buf` are
        // guaranteed to be ASCII (including in its initial state), and thus,
        // any subsequence is guaranteed to be valid UTF-8.
        unsafe { core::str::from_utf8_unchecked(self.as_bytes()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal() {
        let x = DecimalFormatter::new().format(i64::MIN);
        assert_eq!(x.as_str(), "-9223372036854775808");

        let x = DecimalFormatter::new().format(i64::MIN + 1);
        assert_eq!(x.as_str(), "-9223372036854775807");

        let x = DecimalFormatter::new().format(i64::MAX);
        assert_eq!(x.as_str(), "9223372036854775807");

        let x = DecimalFormatter::new().format(0);
        assert_eq!(x.as_str(), "0");

        let x = DecimalFormatter::new().minimum_digits(4).format(0);
        assert_eq!(x.as_str(), "0000");

        let x = DecimalFormatter::new().minimum_digits(4).format(789);
        assert_eq!(x.as_str(), "0789");

        let x = DecimalFormatter::new().minimum_digits(4).format(2006);
        assert_eq!(x.as_str(), "2006");

        let x = DecimalFormatter::new().minimum_digits(4).format(-44);
        assert_eq!(x.as_str(), "-0044");

        let x = DecimalFormatter::new().minimum_digits(2).format(7);
        assert_eq!(x.as_str(), "07");

        let x = DecimalFormatter::new().minimum_digits(6).format(1234);
        assert_eq!(x.as_str(), "001234");

        let x = DecimalFormatter::new().minimum_digits(19).format(12);
        assert_eq!(x.as_str(), "0000000000000000012");

        // Requesting more digits than an i64 can hold caps at 19.
        let x = DecimalFormatter::new().minimum_digits(50).format(12);
        assert_eq!(x.as_str(), "0000000000000000012");
    }
}
