use crate::{
    error::{err, Error},
    util::escape::Bytes,
};

/// Splits the given slice of bytes at the offset given.
///
/// If the offset is beyond the end of the slice, this returns an I/O error
/// indicating a truncated stream. The `what` label names the section being
/// sliced and lands in the error message.
pub(crate) fn try_split_at<'b>(
    what: &'static str,
    bytes: &'b [u8],
    at: usize,
) -> Result<(&'b [u8], &'b [u8]), Error> {
    if at > bytes.len() {
        Err(Error::io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!(
                "expected at least {at} bytes for {what}, \
                 but only {len} bytes remain",
                len = bytes.len(),
            ),
        )))
    } else {
        Ok(bytes.split_at(at))
    }
}

/// Interprets the given slice as a signed 32-bit big endian integer.
///
/// # Panics
///
/// When `bytes.len() != 4`.
pub(crate) fn from_be_bytes_i32(bytes: &[u8]) -> i32 {
    i32::from_be_bytes(bytes.try_into().unwrap())
}

/// Interprets the given slice as an unsigned 32-bit big endian integer and
/// attempts to convert it to a `usize`.
///
/// # Panics
///
/// When `bytes.len() != 4`.
pub(crate) fn from_be_bytes_u32_to_usize(
    what: &'static str,
    bytes: &[u8],
) -> Result<usize, Error> {
    let n = u32::from_be_bytes(bytes.try_into().unwrap());
    usize::try_from(n).map_err(|_| {
        err!("{what} count {n} does not fit in the address space")
    })
}

/// Reads a NUL-terminated string starting at `at` in the given blob.
///
/// The string runs to the next zero byte, or to the end of the blob when
/// there is no terminator. A start offset past the end of the blob is an I/O
/// error.
pub(crate) fn read_cstring(blob: &[u8], at: usize) -> Result<&str, Error> {
    if at > blob.len() {
        return Err(Error::io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!(
                "string offset {at} is beyond the end of \
                 a {len} byte buffer",
                len = blob.len(),
            ),
        )));
    }
    let suffix = &blob[at..];
    let end = suffix.iter().position(|&b| b == 0).unwrap_or(suffix.len());
    core::str::from_utf8(&suffix[..end]).map_err(|_| {
        err!("string '{}' is not valid UTF-8", Bytes(&suffix[..end]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_underrun() {
        let (left, right) = try_split_at("stuff", &[1, 2, 3], 2).unwrap();
        assert_eq!(left, &[1, 2]);
        assert_eq!(right, &[3]);

        let (left, right) = try_split_at("stuff", &[1, 2, 3], 3).unwrap();
        assert_eq!(left, &[1, 2, 3]);
        assert!(right.is_empty());

        let err = try_split_at("stuff", &[1, 2, 3], 4).unwrap_err();
        assert!(err.is_io());
        assert!(err.to_string().contains("stuff"));
    }

    #[test]
    fn big_endian() {
        assert_eq!(from_be_bytes_i32(&[0, 0, 0, 1]), 1);
        assert_eq!(from_be_bytes_i32(&[0xFF, 0xFF, 0xFF, 0xFF]), -1);
        assert_eq!(from_be_bytes_i32(&[0x80, 0, 0, 0]), i32::MIN);
        assert_eq!(
            from_be_bytes_u32_to_usize("test", &[0, 0, 1, 0]).unwrap(),
            256,
        );
    }

    #[test]
    fn cstrings() {
        let blob = b"UTC\x00EST\x00EDT\x00";
        assert_eq!(read_cstring(blob, 0).unwrap(), "UTC");
        assert_eq!(read_cstring(blob, 4).unwrap(), "EST");
        assert_eq!(read_cstring(blob, 8).unwrap(), "EDT");
        // Mid-string starts are fine. So are unterminated tails.
        assert_eq!(read_cstring(blob, 1).unwrap(), "TC");
        assert_eq!(read_cstring(b"GMT", 0).unwrap(), "GMT");
        assert_eq!(read_cstring(blob, 12).unwrap(), "");
        assert!(read_cstring(blob, 13).unwrap_err().is_io());
    }
}
