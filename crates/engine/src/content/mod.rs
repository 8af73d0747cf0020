mod database;
mod loader;
mod types;

pub use database::{CityContent, NpcSpawn, StaticObstacle, VehicleSpawn};
pub use loader::{
    builtin_city_content, load_city_content, parse_city_content, ContentError,
    BUILTIN_CITY_SOURCE,
};
pub use types::{
    CityDef, NpcDef, ObstacleDef, PlayerDef, RoadDef, RoutineDef, SignalDef, VehicleDef,
};
