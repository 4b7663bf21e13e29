//! The replay entry schema: header metadata plus per-step observations.
//!
//! An entry on the wire is the header followed by one length-prefixed
//! column per step field. The unit and neutral-unit step collections are
//! not written time-major: they go through the instance-major flatten
//! transform, which is where most of the compression win comes from.

use std::io::{Read, Write};

use crate::codec::{Codec, codec_struct};
use crate::data::common::{Action, BitImage, GameResult, Image, Race, Score};
use crate::data::units::{NeutralUnit, NeutralUnitSoA, Unit, UnitSoA};
use crate::database::DatabaseEntry;
use crate::error::Result;
use crate::soa::{Columnar, from_columnar, soa_struct, to_columnar};
use crate::transform::{Flattened, flatten_and_sort, recover};

/// General information about a replay from one player's perspective.
///
/// The first three fields identify the replay; [`DatabaseEntry::read_uid`]
/// decodes only these before stopping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayInfo {
    pub replay_hash: String,
    pub game_version: String,
    pub player_id: u32,
    pub duration_steps: u32,
    pub player_race: Race,
    pub player_result: GameResult,
    pub player_mmr: i32,
    pub player_apm: i32,
    pub map_width: i32,
    pub map_height: i32,
    pub height_map: Image<u8>,
}

codec_struct!(ReplayInfo {
    replay_hash,
    game_version,
    player_id,
    duration_steps,
    player_race,
    player_result,
    player_mmr,
    player_apm,
    map_width,
    map_height,
    height_map,
});

/// Observation data sampled at one game step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepData {
    pub game_step: u32,
    pub minerals: u16,
    pub vespene: u16,
    pub pop_max: u16,
    pub pop_army: u16,
    pub pop_workers: u16,
    pub score: Score,
    pub visibility: Image<u8>,
    pub creep: BitImage,
    pub player_relative: Image<u8>,
    pub alerts: Image<u8>,
    pub buildable: BitImage,
    pub pathable: BitImage,
    pub actions: Vec<Action>,
    pub units: Vec<Unit>,
    pub neutral_units: Vec<NeutralUnit>,
}

soa_struct! {
    /// Step observations as one column per field, column index = step.
    pub struct StepDataSoA of StepData {
        game_step: u32,
        minerals: u16,
        vespene: u16,
        pop_max: u16,
        pop_army: u16,
        pop_workers: u16,
        score: Score,
        visibility: Image<u8>,
        creep: BitImage,
        player_relative: Image<u8>,
        alerts: Image<u8>,
        buildable: BitImage,
        pathable: BitImage,
        actions: Vec<Action>,
        units: Vec<Unit>,
        neutral_units: Vec<NeutralUnit>,
    }
}

/// A complete replay, time-major: one [`StepData`] per sample step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayData {
    pub header: ReplayInfo,
    pub data: Vec<StepData>,
}

impl ReplayData {
    pub fn to_soa(&self) -> ReplayDataSoA {
        ReplayDataSoA {
            header: self.header.clone(),
            data: to_columnar(&self.data),
        }
    }
}

/// A complete replay with step observations held column-wise.
///
/// This is the form the database stores; producers convert once after
/// capture and consumers gather individual steps on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayDataSoA {
    pub header: ReplayInfo,
    pub data: StepDataSoA,
}

impl ReplayDataSoA {
    pub fn num_steps(&self) -> usize {
        self.data.len()
    }

    /// Gather the observation at one step back into record form.
    pub fn step(&self, index: usize) -> StepData {
        self.data.get(index)
    }

    pub fn to_aos(&self) -> Result<ReplayData> {
        Ok(ReplayData {
            header: self.header.clone(),
            data: from_columnar(&self.data)?,
        })
    }
}

impl DatabaseEntry for ReplayDataSoA {
    type Header = ReplayInfo;

    fn read_header<R: Read>(reader: &mut R) -> Result<ReplayInfo> {
        ReplayInfo::decode(reader)
    }

    fn read_uid<R: Read>(reader: &mut R) -> Result<String> {
        let replay_hash = String::decode(reader)?;
        let _game_version = String::decode(reader)?;
        let player_id = u32::decode(reader)?;
        Ok(format!("{replay_hash}{player_id}"))
    }

    fn read_entry<R: Read>(reader: &mut R) -> Result<Self> {
        let header = ReplayInfo::decode(reader)?;
        let mut data = StepDataSoA {
            game_step: Vec::decode(reader)?,
            minerals: Vec::decode(reader)?,
            vespene: Vec::decode(reader)?,
            pop_max: Vec::decode(reader)?,
            pop_army: Vec::decode(reader)?,
            pop_workers: Vec::decode(reader)?,
            score: Vec::decode(reader)?,
            visibility: Vec::decode(reader)?,
            creep: Vec::decode(reader)?,
            player_relative: Vec::decode(reader)?,
            alerts: Vec::decode(reader)?,
            buildable: Vec::decode(reader)?,
            pathable: Vec::decode(reader)?,
            actions: Vec::decode(reader)?,
            units: Vec::new(),
            neutral_units: Vec::new(),
        };
        data.units = recover(&Flattened::<UnitSoA>::decode(reader)?)?;
        data.neutral_units = recover(&Flattened::<NeutralUnitSoA>::decode(reader)?)?;
        Ok(Self { header, data })
    }

    fn write_entry<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.header.encode(writer)?;
        self.data.game_step.encode(writer)?;
        self.data.minerals.encode(writer)?;
        self.data.vespene.encode(writer)?;
        self.data.pop_max.encode(writer)?;
        self.data.pop_army.encode(writer)?;
        self.data.pop_workers.encode(writer)?;
        self.data.score.encode(writer)?;
        self.data.visibility.encode(writer)?;
        self.data.creep.encode(writer)?;
        self.data.player_relative.encode(writer)?;
        self.data.alerts.encode(writer)?;
        self.data.buildable.encode(writer)?;
        self.data.pathable.encode(writer)?;
        self.data.actions.encode(writer)?;

        let units: Flattened<UnitSoA> =
            flatten_and_sort(&self.data.units, |a: &Unit, b: &Unit| a.id.cmp(&b.id));
        units.encode(writer)?;
        let neutral_units: Flattened<NeutralUnitSoA> =
            flatten_and_sort(&self.data.neutral_units, |a: &NeutralUnit, b: &NeutralUnit| a.id.cmp(&b.id));
        neutral_units.encode(writer)
    }
}
