use std::collections::HashSet;
use std::fmt::Display;
use std::fs;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use glam::Vec2;
use thiserror::Error;
use tracing::{info, warn};

use crate::sim::{
    CircleObstacle, DayPhase, Path, Road, Routine, SignalId, SignalNetwork, SimTuning,
    TrafficSignal,
};

use super::database::{CityContent, NpcSpawn, StaticObstacle, VehicleSpawn};
use super::types::{CityDef, RoadDef, RoutineDef};

pub const BUILTIN_CITY_SOURCE: &str = "builtin:city.json";

const BUILTIN_CITY_JSON: &str = include_str!("../../../../assets/base/city.json");

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read content file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {origin} at {json_path}: {source}")]
    Parse {
        origin: String,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid content in {origin} at {json_path}: {message}")]
    Invalid {
        origin: String,
        json_path: String,
        message: String,
    },
}

pub fn load_city_content(path: &FsPath) -> Result<CityContent, ContentError> {
    let raw = fs::read_to_string(path).map_err(|source| ContentError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_city_content(&raw, &path.display().to_string())
}

/// The city shipped with the engine.
pub fn builtin_city_content() -> Result<CityContent, ContentError> {
    parse_city_content(BUILTIN_CITY_JSON, BUILTIN_CITY_SOURCE)
}

pub fn parse_city_content(raw: &str, origin: &str) -> Result<CityContent, ContentError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let def: CityDef = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        ContentError::Parse {
            origin: origin.to_string(),
            json_path: if path.is_empty() { ".".to_string() } else { path },
            source: error.into_inner(),
        }
    })?;
    deserializer.end().map_err(|source| ContentError::Parse {
        origin: origin.to_string(),
        json_path: ".".to_string(),
        source,
    })?;
    let content = build_city_content(def, origin)?;

    let network = SignalNetwork::new(content.signals.clone(), &content.tuning.signals);
    for (first, second) in network.simultaneous_green_conflicts() {
        warn!(
            origin,
            first = signal_name(&content, first),
            second = signal_name(&content, second),
            "crossing_signals_share_phase"
        );
    }
    info!(
        origin,
        signal_count = content.signals.len(),
        road_count = content.roads.len(),
        vehicle_count = content.vehicles.len(),
        routine_count = content.routines.len(),
        npc_count = content.npcs.len(),
        obstacle_count = content.obstacles.len(),
        signal_interval_ms = content.tuning.signals.signal_interval_ms,
        "city_content_loaded"
    );
    Ok(content)
}

fn signal_name(content: &CityContent, id: SignalId) -> &str {
    content
        .signals
        .get(id.index())
        .map(|signal| signal.name.as_str())
        .unwrap_or("?")
}

struct Validator<'a> {
    origin: &'a str,
}

impl Validator<'_> {
    fn err(&self, json_path: impl Into<String>, message: impl Into<String>) -> ContentError {
        ContentError::Invalid {
            origin: self.origin.to_string(),
            json_path: json_path.into(),
            message: message.into(),
        }
    }

    fn expected_actual(
        &self,
        json_path: impl Into<String>,
        expected: impl Display,
        actual: impl Display,
    ) -> ContentError {
        self.err(json_path, format!("expected {expected}, got {actual}"))
    }

    fn finite(&self, json_path: &str, value: f32) -> Result<f32, ContentError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.expected_actual(json_path, "finite number", value))
        }
    }

    fn non_negative(&self, json_path: &str, value: f32) -> Result<f32, ContentError> {
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(self.expected_actual(json_path, "finite number >= 0", value))
        }
    }

    fn positive(&self, json_path: &str, value: f32) -> Result<f32, ContentError> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(self.expected_actual(json_path, "finite number > 0", value))
        }
    }

    fn unit_interval(&self, json_path: &str, value: f32) -> Result<f32, ContentError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(self.expected_actual(json_path, "number in [0, 1]", value))
        }
    }

    fn below_one(&self, json_path: &str, value: f32) -> Result<f32, ContentError> {
        if value.is_finite() && (0.0..1.0).contains(&value) {
            Ok(value)
        } else {
            Err(self.expected_actual(json_path, "number in [0, 1)", value))
        }
    }

    fn point(&self, json_path: &str, value: Vec2) -> Result<Vec2, ContentError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.expected_actual(json_path, "finite point", format!("{value:?}")))
        }
    }

    fn id(&self, json_path: &str, id: &str, seen: &mut HashSet<String>) -> Result<(), ContentError> {
        if id.trim().is_empty() {
            return Err(self.err(json_path, "id cannot be empty"));
        }
        if !seen.insert(id.to_string()) {
            return Err(self.err(json_path, format!("duplicate id '{id}'")));
        }
        Ok(())
    }

    fn path(&self, json_path: &str, waypoints: &[Vec2]) -> Result<Path, ContentError> {
        Path::new(waypoints.to_vec()).map_err(|error| self.err(json_path, error.to_string()))
    }
}

fn build_city_content(def: CityDef, origin: &str) -> Result<CityContent, ContentError> {
    let v = Validator { origin };
    validate_tuning(&v, &def.tuning)?;
    let player_spawn = v.point("player.spawn", def.player.spawn)?;

    let mut seen = HashSet::new();
    let mut signals = Vec::with_capacity(def.signals.len());
    for (index, signal) in def.signals.iter().enumerate() {
        let base = format!("signals[{index}]");
        v.id(&format!("{base}.id"), &signal.id, &mut seen)?;
        if !signal.position.is_finite() {
            return Err(v.expected_actual(
                format!("{base}.position"),
                "finite point",
                format!("{:?}", signal.position),
            ));
        }
        signals.push(TrafficSignal {
            id: SignalId(index as u32),
            name: signal.id.clone(),
            position: signal.position,
            group: signal.group,
            phase: signal.phase,
        });
    }

    let mut seen = HashSet::new();
    let mut roads = Vec::with_capacity(def.roads.len());
    for (index, road) in def.roads.iter().enumerate() {
        roads.push(Arc::new(build_road(&v, index, road, &signals, &mut seen)?));
    }

    let mut seen = HashSet::new();
    let mut routines = Vec::with_capacity(def.routines.len());
    for (index, routine) in def.routines.iter().enumerate() {
        routines.push(Arc::new(build_routine(&v, index, routine, &mut seen)?));
    }

    let mut vehicles = Vec::with_capacity(def.vehicles.len());
    for (index, vehicle) in def.vehicles.iter().enumerate() {
        let base = format!("vehicles[{index}]");
        let road = roads
            .iter()
            .find(|road| road.name == vehicle.road)
            .ok_or_else(|| v.err(format!("{base}.road"), format!("unknown road '{}'", vehicle.road)))?;
        let waypoint_count = road.path.waypoint_count();
        if vehicle.start_index >= waypoint_count {
            return Err(v.expected_actual(
                format!("{base}.start_index"),
                format!("index below {waypoint_count}"),
                vehicle.start_index,
            ));
        }
        let nominal_speed = vehicle
            .speed
            .map(|speed| v.non_negative(&format!("{base}.speed"), speed))
            .transpose()?;
        vehicles.push(VehicleSpawn {
            road: Arc::clone(road),
            start_index: vehicle.start_index,
            nominal_speed,
        });
    }

    let opening_phase = DayPhase::from_hour(def.tuning.clock.start_hour);
    let mut seen = HashSet::new();
    let mut npcs = Vec::with_capacity(def.npcs.len());
    for (index, npc) in def.npcs.iter().enumerate() {
        let base = format!("npcs[{index}]");
        v.id(&format!("{base}.name"), &npc.name, &mut seen)?;
        let routine = routines
            .iter()
            .find(|routine| routine.name() == npc.routine)
            .ok_or_else(|| {
                v.err(format!("{base}.routine"), format!("unknown routine '{}'", npc.routine))
            })?;
        let position = match npc.spawn {
            Some(spawn) => v.point(&format!("{base}.spawn"), spawn)?,
            None => routine.path_for(opening_phase).waypoint(0),
        };
        let speed = match npc.speed {
            Some(speed) => v.non_negative(&format!("{base}.speed"), speed)?,
            None => def.tuning.npcs.speed,
        };
        let radius = match npc.radius {
            Some(radius) => v.non_negative(&format!("{base}.radius"), radius)?,
            None => def.tuning.npcs.radius,
        };
        npcs.push(NpcSpawn {
            name: npc.name.clone(),
            routine: Arc::clone(routine),
            position,
            speed,
            radius,
        });
    }

    let mut seen = HashSet::new();
    let mut obstacles = Vec::with_capacity(def.obstacles.len());
    for (index, obstacle) in def.obstacles.iter().enumerate() {
        let base = format!("obstacles[{index}]");
        v.id(&format!("{base}.id"), &obstacle.id, &mut seen)?;
        let center = v.point(&format!("{base}.position"), obstacle.position)?;
        let radius = v.positive(&format!("{base}.radius"), obstacle.radius)?;
        obstacles.push(StaticObstacle {
            id: obstacle.id.clone(),
            shape: CircleObstacle::new(center, radius),
        });
    }

    Ok(CityContent {
        source: origin.to_string(),
        tuning: def.tuning,
        player_spawn,
        signals,
        roads,
        routines,
        npcs,
        vehicles,
        obstacles,
    })
}

fn build_road(
    v: &Validator<'_>,
    index: usize,
    road: &RoadDef,
    signals: &[TrafficSignal],
    seen: &mut HashSet<String>,
) -> Result<Road, ContentError> {
    let base = format!("roads[{index}]");
    v.id(&format!("{base}.id"), &road.id, seen)?;
    let path = v.path(&format!("{base}.waypoints"), &road.waypoints)?;
    let signal = match &road.signal {
        Some(name) => Some(
            signals
                .iter()
                .find(|signal| &signal.name == name)
                .map(|signal| signal.id)
                .ok_or_else(|| v.err(format!("{base}.signal"), format!("unknown signal '{name}'")))?,
        ),
        None => None,
    };
    let waypoint_count = path.waypoint_count();
    for (field, value) in [
        ("approach_index", road.approach_index),
        ("intersection_index", road.intersection_index),
    ] {
        if value >= waypoint_count {
            return Err(v.expected_actual(
                format!("{base}.{field}"),
                format!("index below {waypoint_count}"),
                value,
            ));
        }
    }
    Ok(Road {
        name: road.id.clone(),
        path,
        signal,
        approach_index: road.approach_index,
        intersection_index: road.intersection_index,
    })
}

fn build_routine(
    v: &Validator<'_>,
    index: usize,
    routine: &RoutineDef,
    seen: &mut HashSet<String>,
) -> Result<Routine, ContentError> {
    let base = format!("routines[{index}]");
    v.id(&format!("{base}.id"), &routine.id, seen)?;
    let paths = [
        v.path(&format!("{base}.morning"), &routine.morning)?,
        v.path(&format!("{base}.day"), &routine.day)?,
        v.path(&format!("{base}.evening"), &routine.evening)?,
        v.path(&format!("{base}.night"), &routine.night)?,
    ];
    Ok(Routine::new(routine.id.clone(), paths))
}

fn validate_tuning(v: &Validator<'_>, tuning: &SimTuning) -> Result<(), ContentError> {
    v.finite("tuning.clock.start_hour", tuning.clock.start_hour)?;
    v.non_negative("tuning.clock.hours_per_step", tuning.clock.hours_per_step)?;
    if tuning.clock.step_interval_ms == 0 {
        return Err(v.expected_actual("tuning.clock.step_interval_ms", "value > 0", 0));
    }
    if tuning.signals.signal_interval_ms == 0 {
        return Err(v.expected_actual("tuning.signals.signal_interval_ms", "value > 0", 0));
    }

    let player = &tuning.player;
    v.non_negative("tuning.player.move_speed", player.move_speed)?;
    v.unit_interval("tuning.player.blend", player.blend)?;
    v.below_one("tuning.player.damping", player.damping)?;
    v.non_negative("tuning.player.stop_epsilon", player.stop_epsilon)?;
    v.non_negative("tuning.player.max_speed", player.max_speed)?;
    v.non_negative("tuning.player.facing_threshold", player.facing_threshold)?;
    v.non_negative("tuning.player.radius", player.radius)?;
    v.finite("tuning.player.ground_height", player.ground_height)?;

    let camera = &tuning.camera;
    if !camera.base_offset.is_finite() {
        return Err(v.expected_actual(
            "tuning.camera.base_offset",
            "finite vector",
            format!("{:?}", camera.base_offset),
        ));
    }
    for (field, value) in [
        ("position_smoothing", camera.position_smoothing),
        ("look_smoothing", camera.look_smoothing),
        ("yaw_smoothing", camera.yaw_smoothing),
        ("recenter_rate", camera.recenter_rate),
    ] {
        v.unit_interval(&format!("tuning.camera.{field}"), value)?;
    }
    v.non_negative("tuning.camera.idle_threshold_seconds", camera.idle_threshold_seconds)?;
    v.non_negative("tuning.camera.yaw_limit", camera.yaw_limit)?;
    v.finite("tuning.camera.pointer_sensitivity", camera.pointer_sensitivity)?;
    v.finite("tuning.camera.look_height", camera.look_height)?;
    v.non_negative("tuning.camera.zoom_step", camera.zoom_step)?;
    let min_zoom = v.positive("tuning.camera.min_zoom", camera.min_zoom)?;
    let max_zoom = v.positive("tuning.camera.max_zoom", camera.max_zoom)?;
    if min_zoom > max_zoom {
        return Err(v.expected_actual(
            "tuning.camera.max_zoom",
            format!("value >= min_zoom {min_zoom}"),
            max_zoom,
        ));
    }

    v.non_negative("tuning.npcs.speed", tuning.npcs.speed)?;
    v.non_negative("tuning.npcs.radius", tuning.npcs.radius)?;
    v.finite("tuning.npcs.ground_height", tuning.npcs.ground_height)?;

    let vehicles = &tuning.vehicles;
    v.non_negative("tuning.vehicles.nominal_speed", vehicles.nominal_speed)?;
    v.non_negative("tuning.vehicles.acceleration", vehicles.acceleration)?;
    v.non_negative("tuning.vehicles.deceleration", vehicles.deceleration)?;
    v.non_negative("tuning.vehicles.stop_distance", vehicles.stop_distance)?;
    v.non_negative("tuning.vehicles.stop_speed", vehicles.stop_speed)?;
    v.finite("tuning.vehicles.ground_height", vehicles.ground_height)?;
    v.non_negative("tuning.vehicles.radius", vehicles.radius)?;

    let weather = &tuning.weather;
    let min_interval = v.positive("tuning.weather.min_interval_seconds", weather.min_interval_seconds)?;
    let max_interval = v.positive("tuning.weather.max_interval_seconds", weather.max_interval_seconds)?;
    if min_interval > max_interval {
        return Err(v.expected_actual(
            "tuning.weather.max_interval_seconds",
            format!("value >= min_interval_seconds {min_interval}"),
            max_interval,
        ));
    }

    v.positive("tuning.arrival_threshold", tuning.arrival_threshold)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::sim::{DirectionGroup, SignalPhase};

    const MINIMAL: &str = r#"{
        "signals": [ { "id": "a", "position": [0.0, 0.5, 0.0], "group": "north_south" } ],
        "roads": [ { "id": "loop", "waypoints": [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]], "signal": "a" } ]
    }"#;

    fn invalid_path(result: Result<CityContent, ContentError>) -> String {
        match result {
            Err(ContentError::Invalid { json_path, .. }) => json_path,
            other => panic!("expected invalid content, got {other:?}"),
        }
    }

    #[test]
    fn minimal_document_uses_default_tuning() {
        let content = parse_city_content(MINIMAL, "minimal").expect("content");

        assert_eq!(content.tuning, SimTuning::default());
        assert_eq!(content.player_spawn, Vec2::ZERO);
        assert_eq!(content.signals[0].phase, SignalPhase::Green);
        assert_eq!(content.signals[0].group, DirectionGroup::NorthSouth);
        assert_eq!(content.roads[0].signal, Some(SignalId(0)));
        assert_eq!(content.roads[0].approach_index, 2);
        assert_eq!(content.roads[0].intersection_index, 3);
        assert_eq!(content.signal_id_by_name("a"), Some(SignalId(0)));
        assert!(content.road("loop").is_some());
    }

    #[test]
    fn builtin_city_is_valid() {
        let content = builtin_city_content().expect("builtin content");

        assert_eq!(content.source, BUILTIN_CITY_SOURCE);
        assert_eq!(content.signals.len(), 4);
        assert_eq!(content.roads.len(), 4);
        assert_eq!(content.vehicles.len(), 8);
        assert_eq!(content.routines.len(), 5);
        assert_eq!(content.npcs.len(), 5);
        assert_eq!(content.obstacles.len(), 4);
        assert!(content.routine("office_worker").is_some());
        let network = SignalNetwork::new(content.signals.clone(), &content.tuning.signals);
        assert!(network.simultaneous_green_conflicts().is_empty());
    }

    #[test]
    fn shape_errors_report_json_path() {
        let raw = r#"{
            "signals": [ { "id": "a", "position": [0.0, 0.5, 0.0], "group": "diagonal" } ],
            "roads": []
        }"#;

        match parse_city_content(raw, "bad") {
            Err(ContentError::Parse { json_path, .. }) => assert_eq!(json_path, "signals[0].group"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_tuning_field_is_rejected() {
        let raw = r#"{ "tuning": { "clock": { "start_hr": 3.0 } }, "signals": [], "roads": [] }"#;

        match parse_city_content(raw, "bad") {
            Err(ContentError::Parse { json_path, .. }) => {
                assert!(json_path.starts_with("tuning.clock"), "{json_path}")
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn empty_road_path_is_rejected() {
        let raw = r#"{ "signals": [], "roads": [ { "id": "r", "waypoints": [] } ] }"#;
        assert_eq!(invalid_path(parse_city_content(raw, "bad")), "roads[0].waypoints");
    }

    #[test]
    fn empty_routine_path_is_rejected() {
        let raw = r#"{
            "signals": [], "roads": [],
            "routines": [ { "id": "r", "morning": [[0.0, 0.0]], "day": [[0.0, 0.0]], "evening": [], "night": [[0.0, 0.0]] } ]
        }"#;
        assert_eq!(invalid_path(parse_city_content(raw, "bad")), "routines[0].evening");
    }

    #[test]
    fn unknown_references_are_rejected() {
        let unknown_signal =
            r#"{ "signals": [], "roads": [ { "id": "r", "waypoints": [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]], "signal": "nope" } ] }"#;
        assert_eq!(invalid_path(parse_city_content(unknown_signal, "bad")), "roads[0].signal");

        let unknown_road = MINIMAL.replace(
            r#""signal": "a" } ]"#,
            r#""signal": "a" } ], "vehicles": [ { "road": "missing" } ]"#,
        );
        assert_eq!(invalid_path(parse_city_content(&unknown_road, "bad")), "vehicles[0].road");

        let unknown_routine = MINIMAL.replace(
            r#""signal": "a" } ]"#,
            r#""signal": "a" } ], "npcs": [ { "name": "n", "routine": "missing" } ]"#,
        );
        assert_eq!(invalid_path(parse_city_content(&unknown_routine, "bad")), "npcs[0].routine");
    }

    #[test]
    fn zone_index_outside_road_is_rejected() {
        let raw = r#"{ "signals": [], "roads": [ { "id": "r", "waypoints": [[0.0, 0.0], [1.0, 0.0]] } ] }"#;
        assert_eq!(invalid_path(parse_city_content(raw, "bad")), "roads[0].approach_index");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let raw = r#"{
            "signals": [
                { "id": "a", "position": [0.0, 0.5, 0.0], "group": "north_south" },
                { "id": "a", "position": [1.0, 0.5, 0.0], "group": "east_west" }
            ],
            "roads": []
        }"#;
        assert_eq!(invalid_path(parse_city_content(raw, "bad")), "signals[1].id");
    }

    #[test]
    fn out_of_range_tuning_is_rejected() {
        let raw = r#"{ "tuning": { "camera": { "min_zoom": 20.0 } }, "signals": [], "roads": [] }"#;
        assert_eq!(invalid_path(parse_city_content(raw, "bad")), "tuning.camera.max_zoom");

        let raw = r#"{ "tuning": { "player": { "damping": 1.5 } }, "signals": [], "roads": [] }"#;
        assert_eq!(invalid_path(parse_city_content(raw, "bad")), "tuning.player.damping");
    }

    #[test]
    fn damping_of_one_is_rejected() {
        let raw = r#"{ "tuning": { "player": { "damping": 1.0 } }, "signals": [], "roads": [] }"#;
        assert_eq!(invalid_path(parse_city_content(raw, "bad")), "tuning.player.damping");

        let raw = r#"{ "tuning": { "player": { "damping": 0.0 } }, "signals": [], "roads": [] }"#;
        assert!(parse_city_content(raw, "ok").is_ok());
    }

    #[test]
    fn npc_spawn_defaults_to_opening_path() {
        let raw = MINIMAL.replace(
            r#""signal": "a" } ]"#,
            r#""signal": "a" } ],
            "routines": [ { "id": "r", "morning": [[4.0, 5.0]], "day": [[1.0, 1.0]], "evening": [[2.0, 2.0]], "night": [[3.0, 3.0]] } ],
            "npcs": [ { "name": "n", "routine": "r", "speed": 2.0 } ]"#,
        );

        let content = parse_city_content(&raw, "npcs").expect("content");

        assert_eq!(content.npcs[0].position, Vec2::new(4.0, 5.0));
        assert_eq!(content.npcs[0].speed, 2.0);
        assert_eq!(content.npcs[0].radius, content.tuning.npcs.radius);
    }

    #[test]
    fn load_from_file_and_report_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("city.json");
        let mut file = fs::File::create(&path).expect("create");
        file.write_all(MINIMAL.as_bytes()).expect("write");

        let content = load_city_content(&path).expect("content");
        assert_eq!(content.source, path.display().to_string());

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_city_content(&missing),
            Err(ContentError::ReadFile { .. })
        ));
    }
}
