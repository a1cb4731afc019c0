//! Theme and plugin download tables.

use dlgraph_common::{DlGraphError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Downloads of one theme or plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRow {
    /// Unique name
    pub name: String,
    /// Total downloads
    pub downloads: u64,
    /// Position in the source document; the document lists entities oldest
    /// first
    pub age: usize,
}

/// Parses a statistics document keyed by entity name.
///
/// Each value must carry a `download` (or `downloads`) count; other fields
/// such as `id` are ignored.
#[instrument(skip_all)]
pub fn parse_entity_stats(document: &Value) -> Result<Vec<EntityRow>> {
    let entries = document
        .as_object()
        .ok_or_else(|| DlGraphError::format("statistics document is not an object"))?;

    let rows = entries
        .iter()
        .enumerate()
        .map(|(age, (name, stats))| {
            let downloads = stats
                .get("download")
                .or_else(|| stats.get("downloads"))
                .and_then(Value::as_u64)
                .ok_or_else(|| {
                    DlGraphError::format(format!("'{name}' has no download count"))
                })?;

            Ok(EntityRow {
                name: name.clone(),
                downloads,
                age,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(entities = rows.len(), "Parsed statistics document");
    Ok(rows)
}

/// Theme or plugin downloads, one row per name, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityTable {
    rows: Vec<EntityRow>,
}

impl EntityTable {
    /// Builds a table, summing the downloads of rows sharing a name.
    ///
    /// Merged rows keep the smallest age.
    pub fn from_rows(rows: Vec<EntityRow>) -> Self {
        let mut by_name: BTreeMap<String, EntityRow> = BTreeMap::new();

        for row in rows {
            match by_name.get_mut(&row.name) {
                Some(existing) => {
                    existing.downloads += row.downloads;
                    existing.age = existing.age.min(row.age);
                }
                None => {
                    by_name.insert(row.name.clone(), row);
                }
            }
        }

        Self {
            rows: by_name.into_values().collect(),
        }
    }

    /// Rows ordered by name.
    pub fn rows(&self) -> &[EntityRow] {
        &self.rows
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no entities.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Downloads of `name`, if present.
    pub fn downloads(&self, name: &str) -> Option<u64> {
        self.rows
            .binary_search_by(|row| row.name.as_str().cmp(name))
            .ok()
            .map(|index| self.rows[index].downloads)
    }

    /// Rows oldest first.
    pub fn chronological(&self) -> Vec<EntityRow> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| a.age.cmp(&b.age).then_with(|| a.name.cmp(&b.name)));
        rows
    }

    /// Rows most downloaded first, equal counts by name.
    pub fn sorted(&self) -> Vec<EntityRow> {
        let mut rows = self.rows.clone();
        rows.sort_by_key(|row| Reverse(row.downloads));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlgraph_common::test_utils::fixtures;
    use serde_json::json;

    fn names(rows: &[EntityRow]) -> Vec<&str> {
        rows.iter().map(|row| row.name.as_str()).collect()
    }

    #[test]
    fn test_parse_keeps_document_order_as_age() {
        let rows = parse_entity_stats(&fixtures::entity_stats(&[
            ("Things", 300),
            ("Atom", 100),
            ("Minimal", 900),
        ]))
        .unwrap();

        assert_eq!(names(&rows), ["Things", "Atom", "Minimal"]);
        assert_eq!(rows[2].age, 2);
        assert_eq!(rows[2].downloads, 900);
    }

    #[test]
    fn test_parse_accepts_downloads_alias() {
        let rows = parse_entity_stats(&json!({"dataview": {"downloads": 12, "updated": 0}})).unwrap();
        assert_eq!(rows[0].downloads, 12);
    }

    #[test]
    fn test_parse_rejects_malformed_documents() {
        assert!(parse_entity_stats(&json!([1, 2])).is_err());
        assert!(parse_entity_stats(&json!({"x": {"id": "x"}})).is_err());
        assert!(parse_entity_stats(&json!({"x": {"download": -3}})).is_err());
    }

    #[test]
    fn test_table_views() {
        let rows = parse_entity_stats(&fixtures::entity_stats(&[
            ("Things", 300),
            ("Atom", 100),
            ("Minimal", 900),
            ("Blue Topaz", 300),
        ]))
        .unwrap();
        let table = EntityTable::from_rows(rows);

        assert_eq!(names(table.rows()), ["Atom", "Blue Topaz", "Minimal", "Things"]);
        assert_eq!(names(&table.chronological()), ["Things", "Atom", "Minimal", "Blue Topaz"]);
        assert_eq!(names(&table.sorted()), ["Minimal", "Blue Topaz", "Things", "Atom"]);
        assert_eq!(table.downloads("Minimal"), Some(900));
        assert_eq!(table.downloads("Nope"), None);
    }

    #[test]
    fn test_duplicate_names_are_summed() {
        let table = EntityTable::from_rows(vec![
            EntityRow { name: "a".into(), downloads: 5, age: 3 },
            EntityRow { name: "a".into(), downloads: 7, age: 1 },
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0], EntityRow { name: "a".into(), downloads: 12, age: 1 });
    }
}
