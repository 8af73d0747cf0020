//! Authored shape of a city document, as read from JSON.

use glam::{Vec2, Vec3};
use serde::Deserialize;

use crate::sim::{
    DirectionGroup, SignalPhase, SimTuning, DEFAULT_APPROACH_INDEX, DEFAULT_INTERSECTION_INDEX,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CityDef {
    #[serde(default)]
    pub tuning: SimTuning,
    #[serde(default)]
    pub player: PlayerDef,
    pub signals: Vec<SignalDef>,
    pub roads: Vec<RoadDef>,
    #[serde(default)]
    pub vehicles: Vec<VehicleDef>,
    #[serde(default)]
    pub routines: Vec<RoutineDef>,
    #[serde(default)]
    pub npcs: Vec<NpcDef>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerDef {
    pub spawn: Vec2,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalDef {
    pub id: String,
    pub position: Vec3,
    pub group: DirectionGroup,
    #[serde(default)]
    pub phase: SignalPhase,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoadDef {
    pub id: String,
    pub waypoints: Vec<Vec2>,
    #[serde(default)]
    pub signal: Option<String>,
    #[serde(default = "default_approach_index")]
    pub approach_index: usize,
    #[serde(default = "default_intersection_index")]
    pub intersection_index: usize,
}

fn default_approach_index() -> usize {
    DEFAULT_APPROACH_INDEX
}

fn default_intersection_index() -> usize {
    DEFAULT_INTERSECTION_INDEX
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleDef {
    pub road: String,
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub speed: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutineDef {
    pub id: String,
    pub morning: Vec<Vec2>,
    pub day: Vec<Vec2>,
    pub evening: Vec<Vec2>,
    pub night: Vec<Vec2>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NpcDef {
    pub name: String,
    pub routine: String,
    /// Defaults to the first waypoint of the routine's opening path.
    #[serde(default)]
    pub spawn: Option<Vec2>,
    #[serde(default)]
    pub speed: Option<f32>,
    #[serde(default)]
    pub radius: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObstacleDef {
    pub id: String,
    pub position: Vec2,
    pub radius: f32,
}
