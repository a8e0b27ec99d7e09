//! Bulk loading of flat instance records

use crate::error::Result;
use crate::label::{InstanceId, Label, ScalarValue};
use crate::store::GraphStore;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One or many type labels; a bare string is accepted for a single label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelList {
    One(Label),
    Many(Vec<Label>),
}

impl Default for LabelList {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl LabelList {
    pub fn into_vec(self) -> Vec<Label> {
        match self {
            Self::One(label) => vec![label],
            Self::Many(labels) => labels,
        }
    }
}

/// Flat record: `{id, typeLabels, value?, links?: {edgeType: [targetId, ...]}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadRecord {
    pub id: InstanceId,

    #[serde(rename = "typeLabels", alias = "nodeTypes", default)]
    pub type_labels: LabelList,

    #[serde(alias = "primitiveValue", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ScalarValue>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<Label, Vec<InstanceId>>,
}

impl LoadRecord {
    pub fn new<L: Into<Label>>(
        id: impl Into<InstanceId>,
        labels: impl IntoIterator<Item = L>,
    ) -> Self {
        Self {
            id: id.into(),
            type_labels: LabelList::Many(labels.into_iter().map(Into::into).collect()),
            value: None,
            links: IndexMap::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<ScalarValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_link(mut self, edge_type: impl Into<Label>, target: impl Into<InstanceId>) -> Self {
        self.links
            .entry(edge_type.into())
            .or_default()
            .push(target.into());
        self
    }
}

/// A link whose target id was not present in the load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLink {
    pub from: InstanceId,
    pub edge_type: Label,
    pub to: InstanceId,
}

/// Summary of a bulk load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadReport {
    pub instances: usize,
    pub links: usize,
    pub broken_links: Vec<BrokenLink>,
}

/// Build a store from records
///
/// Instances are created first and links resolved in a second pass, so
/// records may reference ids that appear later. A link to an unknown id is
/// reported and skipped; a repeated record id aborts the load.
pub fn bulk_load(records: impl IntoIterator<Item = LoadRecord>) -> Result<(GraphStore, LoadReport)> {
    let mut store = GraphStore::new();
    let mut report = LoadReport::default();
    let mut pending = Vec::new();

    for record in records {
        store.add_instance(
            record.id.clone(),
            record.type_labels.into_vec(),
            record.value,
        )?;
        report.instances += 1;
        if !record.links.is_empty() {
            pending.push((record.id, record.links));
        }
    }

    for (from, links) in pending {
        for (edge_type, targets) in links {
            for to in targets {
                if store.find_by_id(to.as_str()).is_none() {
                    tracing::warn!("Broken link: {} -[{}]-> {}", from, edge_type, to);
                    report.broken_links.push(BrokenLink {
                        from: from.clone(),
                        edge_type: edge_type.clone(),
                        to,
                    });
                    continue;
                }
                store.add_link(from.as_str(), edge_type.clone(), to.as_str())?;
                report.links += 1;
            }
        }
    }

    tracing::info!(
        "Loaded {} instances and {} links ({} broken)",
        report.instances,
        report.links,
        report.broken_links.len()
    );
    Ok((store, report))
}

/// Parse a JSON array of records and load it
pub fn load_json(json: &str) -> Result<(GraphStore, LoadReport)> {
    let records: Vec<LoadRecord> = serde_json::from_str(json)?;
    bulk_load(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_forward_references_resolve() {
        let records = vec![
            LoadRecord::new("C1", ["Contact"]).with_link("Academy", "A1"),
            LoadRecord::new("A1", ["Academy"]),
        ];
        let (store, report) = bulk_load(records).unwrap();

        assert_eq!(report.instances, 2);
        assert_eq!(report.links, 1);
        assert!(store.has_link("C1", "Academy", "A1"));
        assert!(store.has_link("A1", "Academy", "C1"));
    }

    #[test]
    fn test_broken_link_is_reported_not_fatal() {
        let records = vec![
            LoadRecord::new("C1", ["Contact"])
                .with_link("Academy", "A404")
                .with_link("PersonName", "N1"),
            LoadRecord::new("N1", ["PersonName"]).with_value("Federico"),
        ];
        let (store, report) = bulk_load(records).unwrap();

        let c1 = store.find_by_id("C1").unwrap();
        assert!(c1.get_links("Academy").is_empty());
        assert_eq!(c1.get_links("PersonName").len(), 1);
        assert_eq!(
            report.broken_links,
            vec![BrokenLink {
                from: InstanceId::from("C1"),
                edge_type: Label::from("Academy"),
                to: InstanceId::from("A404"),
            }]
        );
    }

    #[test]
    fn test_duplicate_record_aborts() {
        let records = vec![
            LoadRecord::new("C1", ["Contact"]),
            LoadRecord::new("C1", ["Contact"]),
        ];
        assert!(matches!(bulk_load(records), Err(Error::DuplicateId(_))));
    }

    #[test]
    fn test_load_json_accepts_both_field_spellings() {
        let json = r#"[
            {"id": "C1", "nodeTypes": ["Contact"], "links": {"PersonName": ["N1"]}},
            {"id": "N1", "typeLabels": "PersonName", "primitiveValue": "Jorge"},
            {"id": "F1", "typeLabels": ["Flag"], "value": true}
        ]"#;
        let (store, report) = load_json(json).unwrap();

        assert_eq!(report.instances, 3);
        let n1 = store.find_by_id("N1").unwrap();
        assert!(n1.has_label("PersonName"));
        assert_eq!(n1.value(), Some(&ScalarValue::from("Jorge")));
        assert_eq!(store.find_by_id("F1").unwrap().value(), Some(&ScalarValue::Boolean(true)));
        assert!(store.has_link("N1", "PersonName", "C1"));
    }

    #[test]
    fn test_load_json_rejects_malformed_input() {
        assert!(matches!(load_json("{not json"), Err(Error::Serialization(_))));
    }
}
