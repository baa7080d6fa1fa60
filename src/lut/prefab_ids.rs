use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;

use ahash::AHashMap;
use indexmap::IndexMap;
use sii_parser::SiiBlock;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::prefab::Prefab;
use super::csv::{parse_hex_id, Record};

pub const PREFAB_BLOCK: &str = "prefab_model";
const PREFAB_DESC: &str = "prefab_desc";

/// Numeric id -> prefab definition name, in table order.
///
/// Columns: `_, definition name, hex id`. Rows whose id column is not hex
/// (headers, comments) are skipped. A repeated id keeps its first row.
pub fn parse_prefab_table(records: &[Record]) -> Result<IndexMap<u64, String>> {
    let mut ids = IndexMap::new();

    for record in records {
        let name = record.field(1)?;
        let raw = record.field(2)?;
        let Some(id) = parse_hex_id(raw) else {
            debug!(line = record.line, value = raw, "skipping prefab row without hex id");
            continue;
        };

        if let Some(existing) = ids.get(&id) {
            warn!(
                line = record.line,
                id = format_args!("{id:#x}"),
                existing = %existing,
                duplicate = name,
                "prefab id already in table, keeping first"
            );
            continue;
        }
        ids.insert(id, name.to_string());
    }

    Ok(ids)
}

/// Definition name -> model path, from the `prefab_model` blocks of `prefab.sii`
pub fn parse_prefab_defs<I>(blocks: I) -> Result<HashMap<String, String>>
where
    I: IntoIterator<Item = sii_parser::Result<SiiBlock>>,
{
    let mut defs = HashMap::new();

    for block in blocks {
        let block = block?;
        if block.block_type != PREFAB_BLOCK {
            return Err(Error::MalformedDefinition {
                name: block.block_name,
                reason: format!("expected {PREFAB_BLOCK} block, found {}", block.block_type),
            });
        }
        if defs.contains_key(&block.block_name) {
            return Err(Error::MalformedDefinition {
                name: block.block_name,
                reason: "defined twice".into(),
            });
        }
        let desc = match block.scalar(PREFAB_DESC) {
            Some(desc) => desc.to_string(),
            None => {
                return Err(Error::MalformedDefinition {
                    name: block.block_name,
                    reason: format!("missing {PREFAB_DESC}"),
                })
            }
        };
        defs.insert(block.block_name, desc);
    }

    Ok(defs)
}

/// Give each prefab whose file matches exactly one table entry its ids.
///
/// Returns numeric id -> index into `prefabs`. Prefabs without a match stay
/// unresolved. Entries matching several files are logged and skipped.
pub fn assign_prefab_ids(
    prefabs: &mut [Prefab],
    ids: &IndexMap<u64, String>,
    defs: &HashMap<String, String>,
) -> AHashMap<u64, usize> {
    let mut by_stem: HashMap<OsString, Vec<usize>> = HashMap::new();
    for (i, prefab) in prefabs.iter().enumerate() {
        if let Some(stem) = prefab.stem() {
            by_stem.entry(stem.to_os_string()).or_default().push(i);
        }
    }

    let mut lookup = AHashMap::new();
    for (&id, name) in ids {
        let Some(desc) = defs.get(name) else {
            continue;
        };
        let candidates = Path::new(desc)
            .file_stem()
            .and_then(|stem| by_stem.get(stem))
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        match candidates {
            [] => {}
            [only] => {
                if prefabs[*only].assign_ids(id, name) {
                    lookup.insert(id, *only);
                } else {
                    warn!(
                        id = format_args!("{id:#x}"),
                        definition = %name,
                        file = %prefabs[*only].filename.display(),
                        "prefab already resolved, ignoring later id"
                    );
                }
            }
            many => {
                warn!(
                    id = format_args!("{id:#x}"),
                    definition = %name,
                    path = %desc,
                    matches = many.len(),
                    "several prefab files match, leaving unresolved"
                );
            }
        }
    }

    debug!(resolved = lookup.len(), total = prefabs.len(), "assigned prefab ids");
    lookup
}
