use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::domain::BranchDraft;

/// Failure while reading a branch roster export.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to open roster file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse roster csv: {0}")]
    Csv(#[from] csv::Error),
}

/// Reads a roster export with `Name, Manager, Contact, Address` columns.
/// Rows without a name are skipped.
pub fn parse_branch_roster<R: Read>(reader: R) -> Result<Vec<BranchDraft>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut drafts = Vec::new();

    for record in csv_reader.deserialize::<RosterRow>() {
        let row = record?;
        if row.name.is_empty() {
            continue;
        }

        drafts.push(BranchDraft {
            name: row.name,
            manager: row.manager.unwrap_or_default(),
            contact: row.contact.unwrap_or_default(),
            address: row.address.unwrap_or_default(),
        });
    }

    Ok(drafts)
}

pub fn read_branch_roster(path: impl AsRef<Path>) -> Result<Vec<BranchDraft>, ImportError> {
    let file = File::open(path)?;
    parse_branch_roster(file)
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Manager", default, deserialize_with = "empty_string_as_none")]
    manager: Option<String>,
    #[serde(rename = "Contact", default, deserialize_with = "empty_string_as_none")]
    contact: Option<String>,
    #[serde(rename = "Address", default, deserialize_with = "empty_string_as_none")]
    address: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
