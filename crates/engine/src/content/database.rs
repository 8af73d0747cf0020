use std::sync::Arc;

use glam::Vec2;

use crate::sim::{CircleObstacle, Road, Routine, SignalId, SimTuning, TrafficSignal};

#[derive(Debug, Clone)]
pub struct NpcSpawn {
    pub name: String,
    pub routine: Arc<Routine>,
    pub position: Vec2,
    pub speed: f32,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct VehicleSpawn {
    pub road: Arc<Road>,
    pub start_index: usize,
    pub nominal_speed: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct StaticObstacle {
    pub id: String,
    pub shape: CircleObstacle,
}

/// Validated city content. Paths, routines and signal topology are final.
#[derive(Debug, Clone)]
pub struct CityContent {
    pub source: String,
    pub tuning: SimTuning,
    pub player_spawn: Vec2,
    pub signals: Vec<TrafficSignal>,
    pub roads: Vec<Arc<Road>>,
    pub routines: Vec<Arc<Routine>>,
    pub npcs: Vec<NpcSpawn>,
    pub vehicles: Vec<VehicleSpawn>,
    pub obstacles: Vec<StaticObstacle>,
}

impl CityContent {
    pub fn signal_id_by_name(&self, name: &str) -> Option<SignalId> {
        self.signals
            .iter()
            .find(|signal| signal.name == name)
            .map(|signal| signal.id)
    }

    pub fn road(&self, name: &str) -> Option<&Arc<Road>> {
        self.roads.iter().find(|road| road.name == name)
    }

    pub fn routine(&self, name: &str) -> Option<&Arc<Routine>> {
        self.routines.iter().find(|routine| routine.name() == name)
    }
}
