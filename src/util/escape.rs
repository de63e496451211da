/*!
Escaping routines for showing raw byte strings in error messages.
*/

/// A `u8` with a human readable `Display` impl.
///
/// ASCII bytes are shown as themselves (escaped where necessary) and
/// everything else is shown as a hex escape sequence.
#[derive(Clone, Copy)]
pub struct Byte(pub u8);

impl core::fmt::Display for Byte {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if self.0 == b' ' {
            return write!(f, " ");
        }
        for b in core::ascii::escape_default(self.0) {
            write!(f, "{}", char::from(b))?;
        }
        Ok(())
    }
}

impl core::fmt::Debug for Byte {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "\"")?;
        core::fmt::Display::fmt(self, f)?;
        write!(f, "\"")
    }
}

/// A `&[u8]` with a human readable `Display` impl.
///
/// Works best when the bytes are mostly UTF-8, but tolerates anything.
/// Invalid UTF-8 is shown as hex escape sequences.
pub struct Bytes<'a>(pub &'a [u8]);

impl<'a> core::fmt::Display for Bytes<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut bytes = self.0;
        while !bytes.is_empty() {
            let ch = match utf8_decode(bytes) {
                Ok(ch) => ch,
                Err(byte) => {
                    write!(f, r"\x{:02x}", byte)?;
                    bytes = &bytes[1..];
                    continue;
                }
            };
            bytes = &bytes[ch.len_utf8()..];
            match ch {
                '\0' => write!(f, "\\0")?,
                // ASCII control characters except \0, \n, \r, \t
                '\x01'..='\x08'
                | '\x0b'
                | '\x0c'
                | '\x0e'..='\x19'
                | '\x7f' => {
                    write!(f, "\\x{:02x}", u32::from(ch))?;
                }
                _ => {
                    write!(f, "{}", ch.escape_debug())?;
                }
            }
        }
        Ok(())
    }
}

impl<'a> core::fmt::Debug for Bytes<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "\"")?;
        core::fmt::Display::fmt(self, f)?;
        write!(f, "\"")
    }
}

/// Decodes the next UTF-8 encoded codepoint from the given non-empty byte
/// slice.
///
/// If no valid encoding of a codepoint exists at the beginning of the given
/// byte slice, then the first byte is returned instead.
fn utf8_decode(bytes: &[u8]) -> Result<char, u8> {
    let len = match utf8_len(bytes[0]) {
        None => return Err(bytes[0]),
        Some(len) if len > bytes.len() => return Err(bytes[0]),
        Some(1) => return Ok(char::from(bytes[0])),
        Some(len) => len,
    };
    match core::str::from_utf8(&bytes[..len]) {
        Ok(s) => Ok(s.chars().next().unwrap()),
        Err(_) => Err(bytes[0]),
    }
}

/// Given a UTF-8 leading byte, returns the total number of code units in the
/// following encoded codepoint, or `None` if the byte can't lead.
fn utf8_len(byte: u8) -> Option<usize> {
    if byte <= 0x7F {
        Some(1)
    } else if byte & 0b1100_0000 == 0b1000_0000 {
        None
    } else if byte <= 0b1101_1111 {
        Some(2)
    } else if byte <= 0b1110_1111 {
        Some(3)
    } else if byte <= 0b1111_0111 {
        Some(4)
    } else {
        None
    }
}
