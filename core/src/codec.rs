//! Little-endian binary serialization of replay records.
//!
//! The wire format is schema-less: scalars are written as their raw
//! little-endian representation, sequences as a `u64` element count
//! followed by the elements, and aggregates field-by-field in declaration
//! order with no tags or field names. The reader's static type *is* the
//! schema - a reader/writer pair must agree on layout out-of-band.
//!
//! Declared sequence lengths are checked against [`MAX_SEQUENCE_LEN`]
//! before any buffer is reserved, so a corrupt length field fails with a
//! decode error instead of an enormous allocation.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::{Error, Result};

/// Largest element count accepted when decoding a sequence.
///
/// Anything above this is treated as a corrupt length field.
pub const MAX_SEQUENCE_LEN: u64 = 1_000_000_000;

/// Round-trip binary serialization to/from a byte stream.
pub trait Codec: Sized {
    fn encode<W: Write>(&self, writer: &mut W) -> Result<()>;
    fn decode<R: Read>(reader: &mut R) -> Result<Self>;
}

macro_rules! codec_scalar {
    ($($ty:ty => $write:ident / $read:ident),+ $(,)?) => {
        $(
            impl Codec for $ty {
                fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
                    writer.$write::<LittleEndian>(*self)?;
                    Ok(())
                }

                fn decode<R: Read>(reader: &mut R) -> Result<Self> {
                    Ok(reader.$read::<LittleEndian>()?)
                }
            }
        )+
    };
}

codec_scalar! {
    u16 => write_u16 / read_u16,
    u32 => write_u32 / read_u32,
    u64 => write_u64 / read_u64,
    i16 => write_i16 / read_i16,
    i32 => write_i32 / read_i32,
    i64 => write_i64 / read_i64,
    f32 => write_f32 / read_f32,
    f64 => write_f64 / read_f64,
}

// Single-byte types have no endianness parameter on byteorder's API.
impl Codec for u8 {
    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(*self)?;
        Ok(())
    }

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(reader.read_u8()?)
    }
}

impl Codec for i8 {
    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i8(*self)?;
        Ok(())
    }

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(reader.read_i8()?)
    }
}

impl Codec for bool {
    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(u8::from(*self))?;
        Ok(())
    }

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(reader.read_u8()? != 0)
    }
}

impl<T: Codec> Codec for Vec<T> {
    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.len() as u64)?;
        for item in self {
            item.encode(writer)?;
        }
        Ok(())
    }

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let len = read_sequence_len(reader)?;
        let mut items = Vec::new();
        items.try_reserve(len)?;
        for _ in 0..len {
            items.push(T::decode(reader)?);
        }
        Ok(items)
    }
}

impl Codec for String {
    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_byte_block(self.as_bytes(), writer)
    }

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let bytes = read_byte_block(reader)?;
        String::from_utf8(bytes).map_err(|_| Error::CorruptData("invalid utf-8 in string".into()))
    }
}

/// Read and sanity-check a sequence length prefix.
pub(crate) fn read_sequence_len<R: Read>(reader: &mut R) -> Result<usize> {
    let len = reader.read_u64::<LittleEndian>()?;
    if len > MAX_SEQUENCE_LEN {
        return Err(Error::CorruptData(format!(
            "sequence length {len} exceeds sanity bound"
        )));
    }
    Ok(len as usize)
}

/// Write a length-prefixed contiguous byte block.
pub(crate) fn write_byte_block<W: Write>(bytes: &[u8], writer: &mut W) -> Result<()> {
    writer.write_u64::<LittleEndian>(bytes.len() as u64)?;
    writer.write_all(bytes)?;
    Ok(())
}

/// Read a length-prefixed contiguous byte block.
pub(crate) fn read_byte_block<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let len = read_sequence_len(reader)?;
    let mut bytes = Vec::new();
    bytes.try_reserve(len)?;
    bytes.resize(len, 0);
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// Implement [`Codec`] for an aggregate by listing its fields.
///
/// Fields are written and read in the listed order, which must be the
/// struct's declaration order - the wire carries no tags or names.
macro_rules! codec_struct {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::codec::Codec for $ty {
            fn encode<W: std::io::Write>(&self, writer: &mut W) -> $crate::error::Result<()> {
                $( $crate::codec::Codec::encode(&self.$field, writer)?; )+
                Ok(())
            }

            fn decode<R: std::io::Read>(reader: &mut R) -> $crate::error::Result<Self> {
                Ok(Self {
                    $( $field: $crate::codec::Codec::decode(reader)?, )+
                })
            }
        }
    };
}
pub(crate) use codec_struct;

/// Implement [`Codec`] for a `#[repr(u8)]` enum with explicit discriminants.
///
/// Unknown tag values decode to a [`Error::CorruptData`].
macro_rules! codec_enum {
    ($ty:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        impl $crate::codec::Codec for $ty {
            fn encode<W: std::io::Write>(&self, writer: &mut W) -> $crate::error::Result<()> {
                $crate::codec::Codec::encode(&(*self as u8), writer)
            }

            fn decode<R: std::io::Read>(reader: &mut R) -> $crate::error::Result<Self> {
                match <u8 as $crate::codec::Codec>::decode(reader)? {
                    $( $value => Ok($ty::$variant), )+
                    other => Err($crate::error::Error::CorruptData(format!(
                        concat!("invalid ", stringify!($ty), " tag {}"),
                        other
                    ))),
                }
            }
        }
    };
}
pub(crate) use codec_enum;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip<T: Codec + PartialEq + std::fmt::Debug>(value: &T) {
        let mut buffer = Vec::new();
        value.encode(&mut buffer).unwrap();
        let decoded = T::decode(&mut Cursor::new(&buffer)).unwrap();
        assert_eq!(&decoded, value);
    }

    #[test]
    fn test_scalar_roundtrip() {
        roundtrip(&0x1234_5678_u32);
        roundtrip(&-42_i64);
        roundtrip(&3.25_f32);
        roundtrip(&u8::MAX);
        roundtrip(&true);
        roundtrip(&false);
    }

    #[test]
    fn test_scalars_are_little_endian() {
        let mut buffer = Vec::new();
        0x0102_0304_u32.encode(&mut buffer).unwrap();
        assert_eq!(buffer, [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_string_roundtrip() {
        roundtrip(&String::from("FooBarBaz"));
        roundtrip(&String::new());
    }

    #[test]
    fn test_vec_roundtrip() {
        roundtrip(&vec![1_u32, 2, 3]);
        roundtrip(&Vec::<u32>::new());
        roundtrip(&vec![String::from("a"), String::from("bc")]);
    }

    #[test]
    fn test_vec_length_prefix() {
        let mut buffer = Vec::new();
        vec![7_u16, 9].encode(&mut buffer).unwrap();
        // u64 count then two little-endian u16 elements
        assert_eq!(buffer.len(), 8 + 4);
        assert_eq!(buffer[0], 2);
        assert_eq!(&buffer[8..], [7, 0, 9, 0]);
    }

    #[test]
    fn test_corrupt_length_rejected() {
        let mut buffer = Vec::new();
        (MAX_SEQUENCE_LEN + 1).encode(&mut buffer).unwrap();
        let result = Vec::<u8>::decode(&mut Cursor::new(&buffer));
        assert!(matches!(result, Err(Error::CorruptData(_))));
    }

    #[test]
    fn test_truncated_stream_is_io_error() {
        let mut buffer = Vec::new();
        vec![1_u32, 2, 3].encode(&mut buffer).unwrap();
        buffer.truncate(buffer.len() - 2);
        let result = Vec::<u32>::decode(&mut Cursor::new(&buffer));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut buffer = Vec::new();
        write_byte_block(&[0xFF, 0xFE], &mut buffer).unwrap();
        let result = String::decode(&mut Cursor::new(&buffer));
        assert!(matches!(result, Err(Error::CorruptData(_))));
    }
}
