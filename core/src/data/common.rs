//! Basic observation data types shared by every replay schema.

use crate::codec::{Codec, codec_enum, codec_struct, read_byte_block, write_byte_block};
use crate::error::{Error, Result};

/// Unique in-game entity identifier.
pub type UID = u64;

/// Integer map coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point2d {
    pub x: i32,
    pub y: i32,
}

codec_struct!(Point2d { x, y });

/// World-space position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

codec_struct!(Point3f { x, y, z });

/// Relationship of a unit to the observing player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Alliance {
    #[default]
    Own = 1,
    Ally = 2,
    Neutral = 3,
    Enemy = 4,
}

codec_enum!(Alliance { Own = 1, Ally = 2, Neutral = 3, Enemy = 4 });

/// Cloak status of a unit as seen by the observer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CloakState {
    #[default]
    Unknown = 0,
    Cloaked = 1,
    Detected = 2,
    UnCloaked = 3,
    Allied = 4,
}

codec_enum!(CloakState {
    Unknown = 0,
    Cloaked = 1,
    Detected = 2,
    UnCloaked = 3,
    Allied = 4,
});

/// Whether a unit is directly visible, remembered, or hidden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Visibility {
    #[default]
    Visible = 1,
    Snapshot = 2,
    Hidden = 3,
}

codec_enum!(Visibility { Visible = 1, Snapshot = 2, Hidden = 3 });

/// Add-on structure attached to a production building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AddOn {
    #[default]
    None = 0,
    Reactor = 1,
    TechLab = 2,
}

codec_enum!(AddOn { None = 0, Reactor = 1, TechLab = 2 });

/// Player race.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Race {
    Terran = 0,
    Zerg = 1,
    Protoss = 2,
    #[default]
    Random = 3,
}

codec_enum!(Race { Terran = 0, Zerg = 1, Protoss = 2, Random = 3 });

/// Outcome of the game from the observed player's perspective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GameResult {
    Win = 0,
    Loss = 1,
    Tie = 2,
    #[default]
    Undecided = 3,
}

codec_enum!(GameResult { Win = 0, Loss = 1, Tie = 2, Undecided = 3 });

/// Economy, damage and healing totals for one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    pub score_float: f32,
    pub idle_production_time: f32,
    pub idle_worker_time: f32,
    pub total_value_units: f32,
    pub total_value_structures: f32,
    pub killed_value_units: f32,
    pub killed_value_structures: f32,
    pub collected_minerals: f32,
    pub collected_vespene: f32,
    pub collection_rate_minerals: f32,
    pub collection_rate_vespene: f32,
    pub spent_minerals: f32,
    pub spent_vespene: f32,
    pub total_damage_dealt_life: f32,
    pub total_damage_dealt_shields: f32,
    pub total_damage_dealt_energy: f32,
    pub total_damage_taken_life: f32,
    pub total_damage_taken_shields: f32,
    pub total_damage_taken_energy: f32,
    pub total_healed_life: f32,
    pub total_healed_shields: f32,
    pub total_healed_energy: f32,
}

codec_struct!(Score {
    score_float,
    idle_production_time,
    idle_worker_time,
    total_value_units,
    total_value_structures,
    killed_value_units,
    killed_value_structures,
    collected_minerals,
    collected_vespene,
    collection_rate_minerals,
    collection_rate_vespene,
    spent_minerals,
    spent_vespene,
    total_damage_dealt_life,
    total_damage_dealt_shields,
    total_damage_dealt_energy,
    total_damage_taken_life,
    total_damage_taken_shields,
    total_damage_taken_energy,
    total_healed_life,
    total_healed_shields,
    total_healed_energy,
});

/// Typed minimap buffer with row-major storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image<T> {
    height: i32,
    width: i32,
    data: Vec<T>,
}

impl<T: Copy + Default> Image<T> {
    pub fn new(height: i32, width: i32) -> Self {
        Self {
            height,
            width,
            data: vec![T::default(); (height as usize) * (width as usize)],
        }
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    /// Number of pixels.
    pub fn nelem(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: i32, col: i32) -> T {
        self.data[(row * self.width + col) as usize]
    }

    pub fn set(&mut self, row: i32, col: i32, value: T) {
        self.data[(row * self.width + col) as usize] = value;
    }

    pub fn pixels(&self) -> &[T] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Codec> Codec for Image<T> {
    fn encode<W: std::io::Write>(&self, writer: &mut W) -> Result<()> {
        self.height.encode(writer)?;
        self.width.encode(writer)?;
        self.data.encode(writer)
    }

    fn decode<R: std::io::Read>(reader: &mut R) -> Result<Self> {
        let height = i32::decode(reader)?;
        let width = i32::decode(reader)?;
        let data = Vec::<T>::decode(reader)?;
        if height < 0 || width < 0 || data.len() != (height as usize) * (width as usize) {
            return Err(Error::CorruptData(format!(
                "image shape {height}x{width} does not match {} pixels",
                data.len()
            )));
        }
        Ok(Self { height, width, data })
    }
}

/// Boolean minimap packed 8 pixels per byte, most significant bit first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitImage {
    height: i32,
    width: i32,
    data: Vec<u8>,
}

impl BitImage {
    pub fn new(height: i32, width: i32) -> Self {
        let nelem = (height as usize) * (width as usize);
        Self {
            height,
            width,
            data: vec![0; nelem.div_ceil(8)],
        }
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    /// Number of pixels.
    pub fn nelem(&self) -> usize {
        (self.height as usize) * (self.width as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.nelem() == 0
    }

    pub fn get(&self, row: i32, col: i32) -> bool {
        let index = (row * self.width + col) as usize;
        (self.data[index / 8] >> (7 - index % 8)) & 1 == 1
    }

    pub fn set(&mut self, row: i32, col: i32, value: bool) {
        let index = (row * self.width + col) as usize;
        let mask = 1 << (7 - index % 8);
        if value {
            self.data[index / 8] |= mask;
        } else {
            self.data[index / 8] &= !mask;
        }
    }

    /// Packed backing bytes.
    pub fn packed(&self) -> &[u8] {
        &self.data
    }
}

impl Codec for BitImage {
    fn encode<W: std::io::Write>(&self, writer: &mut W) -> Result<()> {
        self.height.encode(writer)?;
        self.width.encode(writer)?;
        write_byte_block(&self.data, writer)
    }

    fn decode<R: std::io::Read>(reader: &mut R) -> Result<Self> {
        let height = i32::decode(reader)?;
        let width = i32::decode(reader)?;
        let data = read_byte_block(reader)?;
        let nelem = (height.max(0) as usize) * (width.max(0) as usize);
        if height < 0 || width < 0 || data.len() != nelem.div_ceil(8) {
            return Err(Error::CorruptData(format!(
                "bit image shape {height}x{width} does not match {} bytes",
                data.len()
            )));
        }
        Ok(Self { height, width, data })
    }
}

/// What a player action was aimed at.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ActionTarget {
    /// The acting units themselves
    #[default]
    None,
    /// Another unit
    Unit(UID),
    /// A map position
    Position(Point2d),
}

/// One player command issued during a step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Action {
    /// Units the command was issued to
    pub unit_ids: Vec<UID>,
    /// Ability being used
    pub ability_id: i32,
    pub target: ActionTarget,
}

impl Codec for Action {
    fn encode<W: std::io::Write>(&self, writer: &mut W) -> Result<()> {
        self.unit_ids.encode(writer)?;
        self.ability_id.encode(writer)?;
        match self.target {
            ActionTarget::None => 0_u8.encode(writer),
            ActionTarget::Unit(uid) => {
                1_u8.encode(writer)?;
                uid.encode(writer)
            }
            ActionTarget::Position(point) => {
                2_u8.encode(writer)?;
                point.encode(writer)
            }
        }
    }

    fn decode<R: std::io::Read>(reader: &mut R) -> Result<Self> {
        let unit_ids = Vec::decode(reader)?;
        let ability_id = i32::decode(reader)?;
        let target = match u8::decode(reader)? {
            0 => ActionTarget::None,
            1 => ActionTarget::Unit(UID::decode(reader)?),
            2 => ActionTarget::Position(Point2d::decode(reader)?),
            other => {
                return Err(Error::CorruptData(format!("invalid action target tag {other}")));
            }
        };
        Ok(Self { unit_ids, ability_id, target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip<T: Codec + PartialEq + std::fmt::Debug>(value: &T) {
        let mut buffer = Vec::new();
        value.encode(&mut buffer).unwrap();
        assert_eq!(&T::decode(&mut Cursor::new(&buffer)).unwrap(), value);
    }

    #[test]
    fn test_point_roundtrip() {
        roundtrip(&Point2d { x: -3, y: 7 });
        roundtrip(&Point3f { x: 1.5, y: -2.25, z: 0.0 });
    }

    #[test]
    fn test_enum_roundtrip() {
        roundtrip(&Alliance::Enemy);
        roundtrip(&CloakState::Detected);
        roundtrip(&Visibility::Snapshot);
        roundtrip(&AddOn::TechLab);
        roundtrip(&Race::Protoss);
        roundtrip(&GameResult::Win);
    }

    #[test]
    fn test_enum_invalid_tag_rejected() {
        // Alliance has no 0 value
        let result = Alliance::decode(&mut Cursor::new(&[0_u8]));
        assert!(matches!(result, Err(Error::CorruptData(_))));
    }

    #[test]
    fn test_image_get_set() {
        let mut image = Image::<u8>::new(4, 8);
        image.set(1, 2, 42);
        image.set(3, 7, 255);
        assert_eq!(image.get(1, 2), 42);
        assert_eq!(image.get(3, 7), 255);
        assert_eq!(image.get(0, 0), 0);
        assert_eq!(image.nelem(), 32);
    }

    #[test]
    fn test_image_codec_roundtrip() {
        let mut image = Image::<u8>::new(4, 4);
        for (index, pixel) in image.pixels_mut().iter_mut().enumerate() {
            *pixel = index as u8;
        }
        roundtrip(&image);
        roundtrip(&Image::<u8>::default());
    }

    #[test]
    fn test_image_shape_mismatch_rejected() {
        let mut buffer = Vec::new();
        Image::<u8>::new(4, 4).encode(&mut buffer).unwrap();
        // Claim a larger shape than the pixel payload
        buffer[0] = 8;
        let result = Image::<u8>::decode(&mut Cursor::new(&buffer));
        assert!(matches!(result, Err(Error::CorruptData(_))));
    }

    #[test]
    fn test_bit_image_msb_first_packing() {
        let mut image = BitImage::new(2, 8);
        image.set(0, 0, true);
        assert_eq!(image.packed()[0], 0b1000_0000);
        image.set(0, 7, true);
        assert_eq!(image.packed()[0], 0b1000_0001);
        image.set(0, 0, false);
        assert_eq!(image.packed()[0], 0b0000_0001);
        assert!(!image.get(0, 0));
        assert!(image.get(0, 7));
        assert!(!image.get(1, 3));
    }

    #[test]
    fn test_bit_image_codec_roundtrip() {
        let mut image = BitImage::new(4, 4);
        image.set(0, 1, true);
        image.set(3, 3, true);
        roundtrip(&image);
        roundtrip(&BitImage::default());
    }

    #[test]
    fn test_action_roundtrip_all_targets() {
        roundtrip(&Action {
            unit_ids: vec![1, 2, 3],
            ability_id: 42,
            target: ActionTarget::None,
        });
        roundtrip(&Action {
            unit_ids: vec![9],
            ability_id: -1,
            target: ActionTarget::Unit(77),
        });
        roundtrip(&Action {
            unit_ids: vec![],
            ability_id: 7,
            target: ActionTarget::Position(Point2d { x: 10, y: 20 }),
        });
    }

    #[test]
    fn test_action_invalid_tag_rejected() {
        let mut buffer = Vec::new();
        Action::default().encode(&mut buffer).unwrap();
        *buffer.last_mut().unwrap() = 9;
        let result = Action::decode(&mut Cursor::new(&buffer));
        assert!(matches!(result, Err(Error::CorruptData(_))));
    }
}
