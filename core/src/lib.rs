//! Replaydb Core - Append-only replay observation database
//!
//! This crate stores large columnar game-replay observations in a compact
//! append-only file with random access: a fixed-capacity offset lookup
//! table at the head of the file locates each zlib-compressed entry.
//!
//! # Architecture
//!
//! - [`Codec`] - Little-endian binary serialization of records and columns
//! - [`Columnar`] - Array-of-Structures <-> Structure-of-Arrays conversion
//! - [`flatten_and_sort`] / [`recover`] - Instance-major reordering of
//!   per-step unit collections for better compressibility
//! - [`ReplayDatabase`] - The on-disk container, generic over a
//!   [`DatabaseEntry`] schema adapter
//!
//! # File Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      .rdb Database File                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [0..8)               u64 entry count N                     │
//! │  [8..8 + 1M*8)        1M i64 offsets (first N meaningful)   │
//! │  [8 + 1M*8..EOF)      N zlib-compressed entries             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers and floats on the wire are little-endian.

pub mod codec;
pub mod data;
pub mod database;
pub mod error;
pub mod soa;
pub mod transform;

// Re-export the serialization and transform layers
pub use codec::{Codec, MAX_SEQUENCE_LEN};
pub use error::{Error, Result};
pub use soa::{Columnar, from_columnar, to_columnar};
pub use transform::{Flattened, IotaRange, flatten_and_sort, recover};

// Re-export the database engine
pub use database::{DatabaseEntry, MAX_ENTRIES, ReplayDatabase};

// Re-export the observation schema
pub use data::{
    Action, ActionTarget, AddOn, Alliance, BitImage, CloakState, GameResult, Image, NeutralUnit,
    NeutralUnitSoA, Point2d, Point3f, Race, ReplayData, ReplayDataSoA, ReplayInfo, Score, StepData,
    StepDataSoA, UID, Unit, UnitOrder, UnitSoA, Visibility,
};
