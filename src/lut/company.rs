use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::prefab::Prefab;
use super::csv::Record;

/// Company depot footprint from the companies table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Company {
    /// Prefab definition name the company is placed on
    pub string_id: String,
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
    /// Index into the owning mapper's prefab list
    prefab: Option<usize>,
}

impl Company {
    /// Columns: `definition name, min_x, min_y, max_x, max_y`
    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            string_id: record.field(0)?.to_string(),
            min_x: record.int(1)?,
            min_y: record.int(2)?,
            max_x: record.int(3)?,
            max_y: record.int(4)?,
            prefab: None,
        })
    }

    pub fn prefab(&self) -> Option<usize> {
        self.prefab
    }

    pub fn width(&self) -> i64 {
        i64::from(self.max_x) - i64::from(self.min_x)
    }

    pub fn height(&self) -> i64 {
        i64::from(self.max_y) - i64::from(self.min_y)
    }
}

/// Build every company and link it to the prefab with the same string id.
/// Unresolved prefabs carry an empty id and take part in the match too.
///
/// All rows are matched before anything is linked, so an ambiguous row leaves
/// `prefabs` untouched and returns no companies.
pub fn resolve_companies(records: &[Record], prefabs: &mut [Prefab]) -> Result<Vec<Company>> {
    let mut companies = records
        .iter()
        .map(Company::from_record)
        .collect::<Result<Vec<_>>>()?;

    let matches = {
        let mut by_id: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, prefab) in prefabs.iter().enumerate() {
            by_id.entry(prefab.string_id()).or_default().push(i);
        }

        companies
            .iter()
            .map(|company| match by_id.get(company.string_id.as_str()).map(Vec::as_slice) {
                None | Some([]) => Ok(None),
                Some([only]) => Ok(Some(*only)),
                Some(many) => Err(Error::Ambiguous {
                    kind: "company",
                    key: company.string_id.clone(),
                    count: many.len(),
                }),
            })
            .collect::<Result<Vec<_>>>()?
    };

    for (index, (company, matched)) in companies.iter_mut().zip(matches).enumerate() {
        let Some(prefab_index) = matched else {
            continue;
        };
        company.prefab = Some(prefab_index);

        let prefab = &mut prefabs[prefab_index];
        if !prefab.link_company(index) {
            warn!(
                company = %company.string_id,
                file = %prefab.filename.display(),
                "prefab already has a company, keeping the first"
            );
        }
    }

    Ok(companies)
}
