/*!
Converting instants to and from text.

The main entry points are [`TimestringPrinter`](timestring::TimestringPrinter)
and [`TimestringParser`](timestring::TimestringParser) in the
[`timestring`] sub-module. [`Instant::parse`](crate::Instant::parse) and
the `Display` impl on [`Instant`](crate::Instant) cover the common cases
with default options.

Printing goes through the [`Write`] trait defined here rather than
`core::fmt::Write` or `std::io::Write`, so that one printer implementation
can target a `String`, a byte buffer or an arbitrary I/O sink while
reporting this crate's own error type. The [`StdWrite`] and [`FmtWrite`]
adapters bridge to the standard library's writer traits.
*/

use crate::error::{err, Error};

use self::util::{Decimal, DecimalFormatter};

pub mod timestring;
mod util;

/// A trait for printing datetimes as text.
///
/// Implementations are provided for `String`, `Vec<u8>` and mutable
/// references to either, which should cover most uses. To write to an
/// implementation of `std::io::Write` or `core::fmt::Write` instead, wrap
/// it in [`StdWrite`] or [`FmtWrite`] respectively.
pub trait Write {
    /// Writes the given string to this writer.
    fn write_str(&mut self, string: &str) -> Result<(), Error>;

    /// Writes the given character to this writer.
    #[inline]
    fn write_char(&mut self, char: char) -> Result<(), Error> {
        self.write_str(char.encode_utf8(&mut [0; 4]))
    }
}

impl Write for String {
    #[inline]
    fn write_str(&mut self, string: &str) -> Result<(), Error> {
        self.push_str(string);
        Ok(())
    }
}

impl Write for Vec<u8> {
    #[inline]
    fn write_str(&mut self, string: &str) -> Result<(), Error> {
        self.extend_from_slice(string.as_bytes());
        Ok(())
    }
}

impl<W: Write> Write for &mut W {
    fn write_str(&mut self, string: &str) -> Result<(), Error> {
        (**self).write_str(string)
    }

    #[inline]
    fn write_char(&mut self, char: char) -> Result<(), Error> {
        (**self).write_char(char)
    }
}

/// An adapter for using implementations of `std::io::Write` with this
/// crate's [`Write`] trait.
#[derive(Clone, Debug)]
pub struct StdWrite<W>(pub W);

impl<W: std::io::Write> Write for StdWrite<W> {
    #[inline]
    fn write_str(&mut self, string: &str) -> Result<(), Error> {
        self.0
            .write_all(string.as_bytes())
            .map_err(|_| err!("an error occurred when writing to an I/O sink"))
    }
}

/// An adapter for using implementations of `core::fmt::Write` with this
/// crate's [`Write`] trait.
#[derive(Clone, Debug)]
pub struct FmtWrite<W>(pub W);

impl<W: core::fmt::Write> Write for FmtWrite<W> {
    #[inline]
    fn write_str(&mut self, string: &str) -> Result<(), Error> {
        self.0
            .write_str(string)
            .map_err(|_| err!("an error occurred when formatting an argument"))
    }
}

trait WriteExt: Write {
    /// Write the given number as a decimal using ASCII digits to this buffer.
    /// The given formatter controls how the decimal is formatted.
    #[inline]
    fn write_int(
        &mut self,
        formatter: &DecimalFormatter,
        n: impl Into<i64>,
    ) -> Result<(), Error> {
        self.write_decimal(&Decimal::new(formatter, n.into()))
    }

    /// Write the given decimal number to this buffer.
    #[inline]
    fn write_decimal(&mut self, decimal: &Decimal) -> Result<(), Error> {
        self.write_str(decimal.as_str())
    }
}

impl<W: Write> WriteExt for W {}
