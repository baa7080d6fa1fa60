use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use indexmap::IndexMap;
use sii_parser::SiiReader;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::config::{LutTable, MapperConfig};
use crate::error::{Error, Result};
use crate::lut::{self, Company, RoadLook};
use crate::prefab::{DecodeOptions, Prefab};

/// Everything loaded from one game installation
///
/// Built in one go by [`Mapper::load`] and read-only afterwards.
#[derive(Debug)]
pub struct Mapper {
    config: MapperConfig,
    prefabs: Vec<Prefab>,
    /// Enumerated for completeness, not decoded
    sector_files: Vec<PathBuf>,
    prefab_lookup: AHashMap<u64, usize>,
    companies: Vec<Company>,
    cities: AHashMap<u64, String>,
    road_looks: IndexMap<String, RoadLook>,
    road_lookup: AHashMap<u64, usize>,
}

impl Mapper {
    /// Decode every prefab and join the lookup tables.
    ///
    /// Fails on the first unreadable or malformed input; nothing partial is
    /// returned.
    pub fn load(config: MapperConfig) -> Result<Self> {
        let prefab_files = find_files(&config.prefab_dir(), true, |name| name.ends_with(".ppd"))?;
        let sector_files = find_files(&config.sector_dir(), false, |name| {
            name.starts_with("sec") && name.ends_with(".base")
        })?;
        info!(
            prefabs = prefab_files.len(),
            sectors = sector_files.len(),
            base = %config.base_dir.display(),
            "enumerated game files"
        );

        let options = DecodeOptions { node_slots: config.node_slots };
        let prefabs = prefab_files
            .iter()
            .map(|path| Prefab::open(path, options))
            .collect::<Result<Vec<_>>>()?;

        let mut mapper = Self {
            config,
            prefabs,
            sector_files,
            prefab_lookup: AHashMap::new(),
            companies: Vec::new(),
            cities: AHashMap::new(),
            road_looks: IndexMap::new(),
            road_lookup: AHashMap::new(),
        };
        mapper.load_lookup_tables()?;

        info!(
            prefabs = mapper.prefabs.len(),
            resolved = mapper.prefab_lookup.len(),
            companies = mapper.companies.len(),
            cities = mapper.cities.len(),
            road_looks = mapper.road_looks.len(),
            roads = mapper.road_lookup.len(),
            "game data loaded"
        );
        Ok(mapper)
    }

    fn load_lookup_tables(&mut self) -> Result<()> {
        let ids = with_table(&self.config.lut_table(LutTable::Prefab), lut::parse_prefab_table)?;
        let defs = with_sii(&self.config.prefab_defs(), lut::parse_prefab_defs)?;
        self.prefab_lookup = lut::assign_prefab_ids(&mut self.prefabs, &ids, &defs);

        self.companies = with_table(&self.config.lut_table(LutTable::Companies), |records| {
            lut::resolve_companies(records, &mut self.prefabs)
        })?;
        self.cities = with_table(&self.config.lut_table(LutTable::Cities), lut::parse_city_table)?;

        self.road_looks = with_sii(&self.config.road_look_defs(), lut::parse_road_looks)?;
        self.road_lookup = with_table(&self.config.lut_table(LutTable::Roads), |records| {
            lut::parse_road_table(records, &self.road_looks)
        })?;

        Ok(())
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn prefabs(&self) -> &[Prefab] {
        &self.prefabs
    }

    pub fn prefab_by_id(&self, id: u64) -> Option<&Prefab> {
        self.prefab_lookup.get(&id).map(|&i| &self.prefabs[i])
    }

    pub fn sector_files(&self) -> &[PathBuf] {
        &self.sector_files
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn company_of(&self, prefab: &Prefab) -> Option<&Company> {
        prefab.company().map(|i| &self.companies[i])
    }

    pub fn prefab_of(&self, company: &Company) -> Option<&Prefab> {
        company.prefab().map(|i| &self.prefabs[i])
    }

    pub fn city_name(&self, id: u64) -> Option<&str> {
        self.cities.get(&id).map(String::as_str)
    }

    pub fn city_count(&self) -> usize {
        self.cities.len()
    }

    pub fn road_looks(&self) -> impl Iterator<Item = &RoadLook> {
        self.road_looks.values()
    }

    pub fn road_look(&self, string_id: &str) -> Option<&RoadLook> {
        self.road_looks.get(string_id)
    }

    pub fn road_look_by_id(&self, id: u64) -> Option<&RoadLook> {
        self.road_lookup
            .get(&id)
            .and_then(|&i| self.road_looks.get_index(i))
            .map(|(_, look)| look)
    }
}

/// Read a CSV lookup table and hand its rows to `parse`, tagging errors with its path
fn with_table<T>(path: &Path, parse: impl FnOnce(&[lut::Record]) -> Result<T>) -> Result<T> {
    let records = lut::read_records(path)?;
    parse(&records).map_err(|e| e.in_file(path))
}

/// Stream a `.sii` file through `parse`, tagging errors with its path
fn with_sii<T>(
    path: &Path,
    parse: impl FnOnce(SiiReader<io::Lines<BufReader<File>>>) -> Result<T>,
) -> Result<T> {
    File::open(path)
        .map_err(Error::from)
        .and_then(|file| parse(SiiReader::from_reader(BufReader::new(file))))
        .map_err(|e| e.in_file(path))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

/// Sorted files under `dir` whose name passes `accept`. Hidden entries are
/// skipped and a missing directory yields nothing.
fn find_files(dir: &Path, recursive: bool, accept: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "directory missing, nothing to enumerate");
        return Ok(Vec::new());
    }

    let walker = WalkDir::new(dir)
        .follow_links(true)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_entry(|e| !is_hidden(e)) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() && entry.file_name().to_str().is_some_and(&accept) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
