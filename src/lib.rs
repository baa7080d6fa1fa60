//! ETS2 Mapper
//!
//! Loads Euro Truck Simulator 2 game data: prefab geometry (`*.ppd`), unit
//! definitions (`*.sii`) and the external lookup tables that tie numeric map
//! ids to prefabs, companies, cities and road looks.

pub mod codec;
pub mod config;
pub mod error;
pub mod lut;
pub mod mapper;
pub mod prefab;
pub use sii_parser as sii;

pub use error::{Error, ErrorKind, Result};
pub use codec::Vector3;
pub use config::{LutTable, MapperConfig};
pub use lut::{Company, RoadLook};
pub use mapper::Mapper;
pub use prefab::{
    DecodeOptions, NodeSlotLayout, Prefab, PrefabCurve, PrefabHeader, PrefabNode,
};
