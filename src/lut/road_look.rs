use ahash::AHashMap;
use indexmap::IndexMap;
use serde::Serialize;
use sii_parser::{SiiBlock, SiiValue};
use tracing::warn;

use crate::error::{Error, Result};
use super::csv::Record;

pub const ROAD_LOOK_BLOCK: &str = "road_look";

pub const LANE_LOCAL: &str = "traffic_lane.road.local";
pub const LANE_MOTORWAY: &str = "traffic_lane.road.motorway";
pub const LANE_EXPRESSWAY: &str = "traffic_lane.road.expressway";

/// Width of one lane in metres
pub const LANE_WIDTH: f32 = 4.5;

/// Cross-section of a road type, from `road_look.sii`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadLook {
    pub string_id: String,
    pub name: Option<String>,
    pub is_highway: bool,
    pub is_local: bool,
    pub is_express: bool,
    pub offset: f32,
    pub size_left: f32,
    pub size_right: f32,
    pub shoulder_left: f32,
    pub shoulder_right: f32,
    pub lane_count_left: usize,
    pub lane_count_right: usize,
}

impl RoadLook {
    pub fn from_block(block: &SiiBlock) -> Result<Self> {
        if block.block_type != ROAD_LOOK_BLOCK {
            return Err(Error::MalformedDefinition {
                name: block.block_name.clone(),
                reason: format!("expected {ROAD_LOOK_BLOCK} block, found {}", block.block_type),
            });
        }

        let lanes_left = block.array("lanes_left[]");
        let lanes_right = block.array("lanes_right[]");
        let has_lane = |kind: &str| lanes_left.iter().chain(lanes_right).any(|lane| lane == kind);

        Ok(Self {
            string_id: block.block_name.clone(),
            name: block.scalar("name").map(str::to_string),
            is_highway: has_lane(LANE_MOTORWAY),
            is_local: has_lane(LANE_LOCAL),
            is_express: has_lane(LANE_EXPRESSWAY),
            offset: float_item(block, "road_offset")?,
            size_left: float_item(block, "road_size_left")?,
            size_right: float_item(block, "road_size_right")?,
            shoulder_left: float_item(block, "shoulder_size_left")?,
            shoulder_right: float_item(block, "shoulder_size_right")?,
            lane_count_left: lanes_left.len(),
            lane_count_right: lanes_right.len(),
        })
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count_left + self.lane_count_right
    }

    /// Offset plus every lane on both sides
    pub fn total_width(&self) -> f32 {
        self.offset + LANE_WIDTH * self.lane_count() as f32
    }
}

fn float_item(block: &SiiBlock, key: &str) -> Result<f32> {
    let malformed = |reason: String| Error::MalformedDefinition {
        name: block.block_name.clone(),
        reason,
    };

    match block.get(key) {
        None => Ok(0.0),
        Some(SiiValue::Scalar(raw)) => raw
            .trim()
            .parse()
            .map_err(|_| malformed(format!("{key} is not a number: {raw:?}"))),
        Some(SiiValue::Array(_)) => Err(malformed(format!("{key} is a list"))),
    }
}

/// Road looks by definition name, in file order
pub fn parse_road_looks<I>(blocks: I) -> Result<IndexMap<String, RoadLook>>
where
    I: IntoIterator<Item = sii_parser::Result<SiiBlock>>,
{
    let mut looks = IndexMap::new();

    for block in blocks {
        let look = RoadLook::from_block(&block?)?;
        if looks.contains_key(&look.string_id) {
            return Err(Error::MalformedDefinition {
                name: look.string_id,
                reason: "defined twice".into(),
            });
        }
        looks.insert(look.string_id.clone(), look);
    }

    Ok(looks)
}

/// Columns: `hex id, road look name`. Returns id -> index into `looks`.
///
/// Every referenced look must exist.
pub fn parse_road_table(
    records: &[Record],
    looks: &IndexMap<String, RoadLook>,
) -> Result<AHashMap<u64, usize>> {
    let mut lookup = AHashMap::new();

    for record in records {
        let id = record.hex_id(0)?;
        let name = record.field(1)?;
        let index = looks.get_index_of(name).ok_or_else(|| Error::UnresolvedReference {
            kind: "road look",
            key: name.to_string(),
        })?;

        if let Some(previous) = lookup.insert(id, index) {
            if previous != index {
                warn!(
                    line = record.line,
                    id = format_args!("{id:#x}"),
                    "road id listed twice, using the later look"
                );
            }
        }
    }

    Ok(lookup)
}
