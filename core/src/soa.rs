//! Array-of-Structures <-> Structure-of-Arrays conversion.
//!
//! A [`Columnar`] type holds one growable array per field of its `Item`
//! record, all kept the same length. Scatter (`push`) and gather (`get`)
//! match columns to record fields *by name*, so a SoA type is free to
//! declare its columns in a different order than the record - useful for
//! grouping similar columns together for compression. The mapping is
//! spelled out once per record type by the [`soa_struct!`] macro
//! invocation, where a misnamed column is a compile error.

use crate::error::{Error, Result};

/// Structure-of-Arrays counterpart of a record type.
pub trait Columnar: Default {
    /// The record type one row assembles into.
    type Item;

    /// Create with all columns preallocated for `capacity` rows.
    fn with_capacity(capacity: usize) -> Self;

    /// Number of rows (length of the first column).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scatter one record across the columns.
    fn push(&mut self, item: Self::Item);

    /// Gather the record at `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()` or the columns disagree in length.
    fn get(&self, index: usize) -> Self::Item;

    /// Length of every column, in declaration order.
    fn column_lengths(&self) -> Vec<usize>;
}

/// Convert a slice of records into its columnar form.
pub fn to_columnar<C>(records: &[C::Item]) -> C
where
    C: Columnar,
    C::Item: Clone,
{
    let mut soa = C::with_capacity(records.len());
    for record in records {
        soa.push(record.clone());
    }
    soa
}

/// Convert a columnar container back into a vector of records.
///
/// Fails with [`Error::CorruptData`] if the columns disagree in length,
/// rather than silently truncating to the shortest.
pub fn from_columnar<C: Columnar>(soa: &C) -> Result<Vec<C::Item>> {
    let lengths = soa.column_lengths();
    if lengths.windows(2).any(|pair| pair[0] != pair[1]) {
        return Err(Error::CorruptData(format!(
            "inconsistent column lengths: {lengths:?}"
        )));
    }
    Ok((0..soa.len()).map(|index| soa.get(index)).collect())
}

/// Declare a Structure-of-Arrays type for a record.
///
/// Generates the struct (one `Vec` per column), its [`Columnar`] impl and
/// a [`crate::codec::Codec`] impl that writes the columns in declaration
/// order. Every column must name a field of the record with the same
/// element type; columns may be declared in any order.
macro_rules! soa_struct {
    (
        $(#[$meta:meta])*
        pub struct $name:ident of $item:ty {
            $( $(#[$fmeta:meta])* $field:ident : $ftype:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: Vec<$ftype>, )+
        }

        impl $crate::soa::Columnar for $name {
            type Item = $item;

            fn with_capacity(capacity: usize) -> Self {
                Self {
                    $( $field: Vec::with_capacity(capacity), )+
                }
            }

            fn len(&self) -> usize {
                $crate::soa::soa_struct!(@first self, $($field),+)
            }

            fn push(&mut self, item: Self::Item) {
                $( self.$field.push(item.$field); )+
            }

            fn get(&self, index: usize) -> Self::Item {
                Self::Item {
                    $( $field: self.$field[index].clone(), )+
                }
            }

            fn column_lengths(&self) -> Vec<usize> {
                vec![ $( self.$field.len(), )+ ]
            }
        }

        impl $crate::codec::Codec for $name {
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
    (@first $self:ident, $first:ident $(, $rest:ident)*) => {
        $self.$first.len()
    };
}
pub(crate) use soa_struct;
