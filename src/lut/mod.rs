//! Lookup tables that turn opaque numeric ids into named objects
//!
//! The CSV tables come from an external extraction of the game's map data;
//! the `.sii` definitions come from the game itself. Both are joined here
//! against the decoded prefabs.

pub mod csv;
mod city;
mod company;
mod prefab_ids;
mod road_look;

pub use city::parse_city_table;
pub use company::{resolve_companies, Company};
pub use csv::{parse_hex_id, parse_records, read_records, Record};
pub use prefab_ids::{assign_prefab_ids, parse_prefab_defs, parse_prefab_table, PREFAB_BLOCK};
pub use road_look::{
    parse_road_looks, parse_road_table, RoadLook,
    LANE_EXPRESSWAY, LANE_LOCAL, LANE_MOTORWAY, LANE_WIDTH, ROAD_LOOK_BLOCK,
};
