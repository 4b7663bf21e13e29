//! Instance-major reordering of per-step record collections.
//!
//! Replay observations arrive time-major: one list of units per game
//! step. Consecutive steps mostly repeat the same entities with small
//! deltas (position, health), but interleaved with unrelated entities, so
//! the raw layout compresses poorly. Flattening every step's records into
//! one array and stable-sorting by entity identity places each entity's
//! time series contiguously, which compresses far better.
//!
//! The original step structure is recovered from a compact side channel:
//! after sorting, the sequence of originating step indices decomposes
//! into runs of consecutive increasing values (each entity is typically
//! present over a contiguous span of steps), stored as one
//! [`IotaRange`] per run instead of one index per record.

use std::cmp::Ordering;

use crate::codec::{Codec, codec_struct};
use crate::error::{Error, Result};
use crate::soa::Columnar;

/// A run of `num` consecutive original step indices starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IotaRange {
    pub start: u32,
    pub num: u32,
}

codec_struct!(IotaRange { start, num });

/// Step-collections flattened to instance-major order.
///
/// `data` holds every record of every step, grouped by the sort key and
/// in original step order within a group. `step_count` run-length encodes
/// the originating step index of each record; the counts always sum to
/// `data.len()`. `max_step` is the number of input step slots, which may
/// exceed the largest index present when trailing steps were empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flattened<C> {
    pub data: C,
    pub step_count: Vec<IotaRange>,
    pub max_step: u32,
}

impl<C: Columnar> Flattened<C> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<C: Codec> Codec for Flattened<C> {
    fn encode<W: std::io::Write>(&self, writer: &mut W) -> Result<()> {
        self.data.encode(writer)?;
        self.step_count.encode(writer)?;
        self.max_step.encode(writer)
    }

    fn decode<R: std::io::Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            data: C::decode(reader)?,
            step_count: Vec::decode(reader)?,
            max_step: u32::decode(reader)?,
        })
    }
}

/// Flatten per-step record lists into instance-major order.
///
/// Records are paired with their originating step index, stable-sorted by
/// `compare` (ties keep step order, which the range encoding relies on),
/// scattered into the columnar container, and the step indices run-length
/// encoded into [`IotaRange`]s. Sorting by entity id gives runs spanning
/// each entity's consecutive appearances.
pub fn flatten_and_sort<C, F>(steps: &[Vec<C::Item>], compare: F) -> Flattened<C>
where
    C: Columnar,
    C::Item: Clone,
    F: Fn(&C::Item, &C::Item) -> Ordering,
{
    let total: usize = steps.iter().map(Vec::len).sum();
    let mut flat: Vec<(u32, C::Item)> = Vec::with_capacity(total);
    for (step, records) in steps.iter().enumerate() {
        for record in records {
            flat.push((step as u32, record.clone()));
        }
    }

    // Stable: equal keys keep (step, intra-step) order
    flat.sort_by(|a, b| compare(&a.1, &b.1));

    let step_count = encode_step_runs(flat.iter().map(|(step, _)| *step));

    let mut data = C::with_capacity(flat.len());
    for (_, record) in flat {
        data.push(record);
    }

    Flattened {
        data,
        step_count,
        max_step: steps.len() as u32,
    }
}

/// Run-length encode maximal runs of consecutive increasing step indices.
fn encode_step_runs(steps: impl Iterator<Item = u32>) -> Vec<IotaRange> {
    let mut runs = Vec::new();
    let mut current: Option<IotaRange> = None;
    let mut prev = 0_u32;
    for step in steps {
        match current {
            Some(ref mut run) if step == prev + 1 => run.num += 1,
            Some(run) => {
                runs.push(run);
                current = Some(IotaRange { start: step, num: 1 });
            }
            None => current = Some(IotaRange { start: step, num: 1 }),
        }
        prev = step;
    }
    if let Some(run) = current {
        runs.push(run);
    }
    runs
}

/// Restore time-major per-step record lists from a flattened container.
///
/// The inverse of [`flatten_and_sort`] up to ordering within a step: each
/// step's multiset of records is restored exactly, but not their original
/// order within the step.
///
/// Malformed inputs (range counts disagreeing with the record count, a
/// zero-length range, a destination step past `max_step`) fail with
/// [`Error::CorruptData`].
pub fn recover<C: Columnar>(flat: &Flattened<C>) -> Result<Vec<Vec<C::Item>>> {
    let counted: u64 = flat.step_count.iter().map(|range| u64::from(range.num)).sum();
    if counted != flat.len() as u64 {
        return Err(Error::CorruptData(format!(
            "step ranges cover {counted} records but {} are present",
            flat.len()
        )));
    }
    if flat.step_count.iter().any(|range| range.num == 0) {
        return Err(Error::CorruptData("empty step range".into()));
    }

    let mut steps: Vec<Vec<C::Item>> = Vec::new();
    steps.resize_with(flat.max_step as usize, Vec::new);

    let mut ranges = flat.step_count.iter();
    let mut current = ranges.next();
    let mut offset = 0_u32;
    for index in 0..flat.len() {
        let range = current.ok_or_else(|| Error::CorruptData("step ranges exhausted".into()))?;
        let step = range.start + offset;
        let bucket = steps.get_mut(step as usize).ok_or_else(|| {
            Error::CorruptData(format!("step {step} outside of {} steps", flat.max_step))
        })?;
        bucket.push(flat.data.get(index));
        if offset + 1 < range.num {
            offset += 1;
        } else {
            current = ranges.next();
            offset = 0;
        }
    }

    Ok(steps)
}
