//! Observation data model: shared primitives, unit records and the
//! replay entry schema stored by the database.

pub mod common;
pub mod replay;
pub mod units;

pub use common::{
    Action, ActionTarget, AddOn, Alliance, BitImage, CloakState, GameResult, Image, Point2d,
    Point3f, Race, Score, UID, Visibility,
};
pub use replay::{ReplayData, ReplayDataSoA, ReplayInfo, StepData, StepDataSoA};
pub use units::{NeutralUnit, NeutralUnitSoA, Unit, UnitOrder, UnitSoA};
