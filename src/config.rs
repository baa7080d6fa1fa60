use std::path::{Path, PathBuf};

use crate::prefab::NodeSlotLayout;

/// File name prefix of the lookup tables (`LUT1.19-prefab.csv`, ...)
pub const DEFAULT_LUT_PREFIX: &str = "LUT1.19";

/// The lookup tables shipped alongside the map extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LutTable {
    Prefab,
    Companies,
    Cities,
    Roads,
}

impl LutTable {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Prefab => "prefab",
            Self::Companies => "companies",
            Self::Cities => "cities",
            Self::Roads => "roads",
        }
    }
}

/// Where the game data lives
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Extracted `base.scs`
    pub base_dir: PathBuf,
    /// Extracted `def.scs`
    pub def_dir: PathBuf,
    /// Directory holding the CSV lookup tables
    pub lut_dir: PathBuf,
    pub lut_prefix: String,
    pub node_slots: NodeSlotLayout,
}

impl MapperConfig {
    pub fn new(base_dir: impl Into<PathBuf>, def_dir: impl Into<PathBuf>, lut_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            def_dir: def_dir.into(),
            lut_dir: lut_dir.into(),
            lut_prefix: DEFAULT_LUT_PREFIX.into(),
            node_slots: NodeSlotLayout::default(),
        }
    }

    /// `~/ets2/data/base_scs`, `~/ets2/data/def_scs` and `~/ets2/ets2-map/LUT`
    pub fn from_home() -> Option<Self> {
        dirs::home_dir().map(|home| Self::under(&home))
    }

    fn under(home: &Path) -> Self {
        Self::new(
            home.join("ets2/data/base_scs"),
            home.join("ets2/data/def_scs"),
            home.join("ets2/ets2-map/LUT"),
        )
    }

    pub fn with_lut_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.lut_prefix = prefix.into();
        self
    }

    pub fn with_node_slots(mut self, layout: NodeSlotLayout) -> Self {
        self.node_slots = layout;
        self
    }

    pub fn prefab_dir(&self) -> PathBuf {
        self.base_dir.join("prefab")
    }

    pub fn sector_dir(&self) -> PathBuf {
        self.base_dir.join("map/europe")
    }

    pub fn prefab_defs(&self) -> PathBuf {
        self.def_dir.join("def/world/prefab.sii")
    }

    pub fn road_look_defs(&self) -> PathBuf {
        self.def_dir.join("def/world/road_look.sii")
    }

    pub fn lut_table(&self, table: LutTable) -> PathBuf {
        self.lut_dir.join(format!("{}-{}.csv", self.lut_prefix, table.suffix()))
    }
}
