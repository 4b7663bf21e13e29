//! Unit observation records.
//!
//! Neutral units are kept as a separate, smaller record: static map
//! features never use buffs, cloak or cargo, so carrying the full unit
//! schema for them would waste a large share of the stored bytes.

use crate::codec::codec_struct;
use crate::data::common::{AddOn, Alliance, CloakState, Point2d, Point3f, UID, Visibility};
use crate::soa::soa_struct;

/// One slot of a unit's order queue.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UnitOrder {
    /// Ability the order executes
    pub ability_id: i32,
    /// Completion fraction in [0, 1]
    pub progress: f32,
    /// Target unit, zero when none
    pub target_id: UID,
    /// Target position, zeroed when none
    pub target_pos: Point2d,
}

codec_struct!(UnitOrder {
    ability_id,
    progress,
    target_id,
    target_pos,
});

/// Full observation of one player-controlled unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unit {
    pub id: UID,
    pub tgt_id: UID,
    pub observation: Visibility,
    pub alliance: Alliance,
    pub cloak_state: CloakState,
    pub add_on: AddOn,
    pub unit_type: i32,
    pub health: f32,
    pub health_max: f32,
    pub shield: f32,
    pub shield_max: f32,
    pub energy: f32,
    pub energy_max: f32,
    pub weapon_cooldown: f32,
    pub buff0: i32,
    pub buff1: i32,
    pub pos: Point3f,
    pub heading: f32,
    pub radius: f32,
    pub build_progress: f32,
    pub cargo: i8,
    pub cargo_max: i8,
    pub assigned_harvesters: i8,
    pub ideal_harvesters: i8,
    pub is_blip: bool,     // detected by sensor tower
    pub is_flying: bool,
    pub is_burrowed: bool,
    pub is_powered: bool,  // pylon
    pub in_cargo: bool,
    pub order0: UnitOrder,
    pub order1: UnitOrder,
    pub order2: UnitOrder,
    pub order3: UnitOrder,
}

codec_struct!(Unit {
    id,
    tgt_id,
    observation,
    alliance,
    cloak_state,
    add_on,
    unit_type,
    health,
    health_max,
    shield,
    shield_max,
    energy,
    energy_max,
    weapon_cooldown,
    buff0,
    buff1,
    pos,
    heading,
    radius,
    build_progress,
    cargo,
    cargo_max,
    assigned_harvesters,
    ideal_harvesters,
    is_blip,
    is_flying,
    is_burrowed,
    is_powered,
    in_cargo,
    order0,
    order1,
    order2,
    order3,
});

soa_struct! {
    /// Columnar unit collection.
    ///
    /// Columns are ordered to keep similar data adjacent on the wire
    /// (healths together, flags together), which differs from the
    /// record's field order - the conversion matches by name.
    pub struct UnitSoA of Unit {
        id: UID,
        unit_type: i32,
        observation: Visibility,
        alliance: Alliance,
        health: f32,
        health_max: f32,
        shield: f32,
        shield_max: f32,
        energy: f32,
        energy_max: f32,
        cargo: i8,
        cargo_max: i8,
        assigned_harvesters: i8,
        ideal_harvesters: i8,
        weapon_cooldown: f32,
        tgt_id: UID,
        cloak_state: CloakState,
        is_blip: bool,
        is_flying: bool,
        is_burrowed: bool,
        is_powered: bool,
        in_cargo: bool,
        pos: Point3f,
        order0: UnitOrder,
        order1: UnitOrder,
        order2: UnitOrder,
        order3: UnitOrder,
        buff0: i32,
        buff1: i32,
        heading: f32,
        radius: f32,
        build_progress: f32,
        add_on: AddOn,
    }
}

/// Observation of a static neutral unit (mineral field, geyser, debris).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeutralUnit {
    pub id: UID,
    pub unit_type: i32,
    pub health: f32,
    pub health_max: f32,
    pub pos: Point3f,
    pub heading: f32,
    pub radius: f32,
    /// Remaining minerals or vespene
    pub contents: u16,
    pub observation: Visibility,
}

codec_struct!(NeutralUnit {
    id,
    unit_type,
    health,
    health_max,
    pos,
    heading,
    radius,
    contents,
    observation,
});

soa_struct! {
    /// Columnar neutral-unit collection.
    pub struct NeutralUnitSoA of NeutralUnit {
        id: UID,
        unit_type: i32,
        observation: Visibility,
        health: f32,
        health_max: f32,
        pos: Point3f,
        heading: f32,
        radius: f32,
        contents: u16,
    }
}
