//! Shared helpers for the index-stream serialization format.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ReadError, Result};

/// Writes a length-prefixed UTF-8 string
pub(crate) fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    writer.write_u32::<LittleEndian>(value.len() as u32)?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

/// Reads a length-prefixed UTF-8 string
pub(crate) fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = reader.read_u32::<LittleEndian>()? as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| ReadError::MalformedString.into())
}

#[cfg(test)]
mod testing {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_string_roundtrip() -> Result<()> {
        let mut buf = Vec::new();
        write_string(&mut buf, "phyloP100way")?;
        write_string(&mut buf, "")?;
        write_string(&mut buf, "äöü ✓")?;

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_string(&mut cursor)?, "phyloP100way");
        assert_eq!(read_string(&mut cursor)?, "");
        assert_eq!(read_string(&mut cursor)?, "äöü ✓");
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&[0xff, 0xfe]);
        let err = read_string(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Read(ReadError::MalformedString)
        ));
    }
}
