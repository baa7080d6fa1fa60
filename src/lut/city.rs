use ahash::AHashMap;

use crate::error::Result;
use super::csv::Record;

/// Columns: `hex id, city name`. Later rows replace earlier ones.
pub fn parse_city_table(records: &[Record]) -> Result<AHashMap<u64, String>> {
    records
        .iter()
        .map(|record| Ok((record.hex_id(0)?, record.field(1)?.to_string())))
        .collect()
}
