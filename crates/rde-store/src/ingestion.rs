//! Module ingestion: create and update of a set's element graph.
//!
//! Both operations parse and flatten before touching the database, then run
//! every write inside one transaction. The transaction commits at the end or
//! rolls back when it is dropped on any error path, so no partial element,
//! set, or ref rows can remain visible. Update is a full replace of the
//! set's element graph, not an incremental diff.

use chrono::{Local, NaiveDate};
use rusqlite::{Transaction, params};
use tracing::{debug, info};

use rde_ingest::{DocumentModel, parse_document};
use rde_model::{ElementId, SetId, ValueType};
use rde_transform::{ElementRecord, RecordKind, flatten_module};

use crate::error::{Result, StoreError};
use crate::schema::Store;

/// Provenance defaults stamped on every element at creation time.
pub const DEFAULT_SOURCE: &str = "DSI";
pub const DEFAULT_STATUS: &str = "Proposed";
pub const DEFAULT_VERSION: &str = "1";

/// Stored option values longer than this are truncated.
pub const MAX_VALUE_LEN: usize = 255;

impl Store {
    /// Ingest a new reporting module: persist its elements, the set row,
    /// and the membership links, all or nothing.
    pub fn create_module(&mut self, xml: &str) -> Result<SetId> {
        let doc = parse_document(xml)?;
        let flat = flatten_module(&doc);
        let today = Local::now().date_naive();

        let tx = self.conn.transaction()?;
        let element_ids = insert_elements(&tx, &flat.elements, today)?;
        let set_id = insert_set_row(&tx, &doc, today)?;
        link_elements(&tx, set_id, &element_ids)?;
        tx.commit()?;

        info!(
            set = %set_id,
            elements = element_ids.len(),
            globals = flat.globals.len(),
            "created element set"
        );
        Ok(set_id)
    }

    /// Re-ingest a module against an existing set id.
    ///
    /// The set's name/description/contact are overwritten in place and its
    /// entire element graph is deleted and rebuilt from the new document.
    /// On any failure the transaction rolls back and the prior graph stays
    /// intact.
    pub fn update_module(&mut self, xml: &str, set_id: SetId) -> Result<()> {
        let doc = parse_document(xml)?;
        let flat = flatten_module(&doc);
        let today = Local::now().date_naive();

        let tx = self.conn.transaction()?;
        if !set_exists(&tx, set_id)? {
            return Err(StoreError::NotFound(format!("element set {set_id}")));
        }
        tx.execute(
            "UPDATE element_set SET name = ?2, description = ?3, contact_name = ?4 WHERE id = ?1",
            params![
                set_id.as_u32(),
                set_name(&doc),
                doc.metadata.description.clone().unwrap_or_default(),
                doc.metadata.contact_name.clone().unwrap_or_default(),
            ],
        )?;
        let removed = delete_element_graph(&tx, set_id)?;
        let element_ids = insert_elements(&tx, &flat.elements, today)?;
        link_elements(&tx, set_id, &element_ids)?;
        tx.commit()?;

        info!(
            set = %set_id,
            removed,
            elements = element_ids.len(),
            "replaced element set contents"
        );
        Ok(())
    }

    /// Delete a set together with its element graph and cross-references.
    pub fn delete_set(&mut self, set_id: SetId) -> Result<()> {
        let tx = self.conn.transaction()?;
        if !set_exists(&tx, set_id)? {
            return Err(StoreError::NotFound(format!("element set {set_id}")));
        }
        delete_element_graph(&tx, set_id)?;
        for table in [
            "index_code_set_ref",
            "person_role_set_ref",
            "organization_role_set_ref",
        ] {
            tx.execute(
                &format!("DELETE FROM {table} WHERE set_id = ?1"),
                params![set_id.as_u32()],
            )?;
        }
        tx.execute(
            "DELETE FROM element_set WHERE id = ?1",
            params![set_id.as_u32()],
        )?;
        tx.commit()?;
        info!(set = %set_id, "deleted element set");
        Ok(())
    }
}

fn set_exists(tx: &Transaction, set_id: SetId) -> Result<bool> {
    let count: u32 = tx.query_row(
        "SELECT COUNT(*) FROM element_set WHERE id = ?1",
        params![set_id.as_u32()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn set_name(doc: &DocumentModel) -> String {
    doc.module_id.replace('_', " ")
}

fn insert_set_row(tx: &Transaction, doc: &DocumentModel, today: NaiveDate) -> Result<SetId> {
    tx.execute(
        "INSERT INTO element_set (name, description, contact_name, parent_id, status, status_date, version)
         VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6)",
        params![
            set_name(doc),
            doc.metadata.description.clone().unwrap_or_default(),
            doc.metadata.contact_name.clone().unwrap_or_default(),
            DEFAULT_STATUS,
            today,
            DEFAULT_VERSION,
        ],
    )?;
    Ok(SetId(tx.last_insert_rowid() as u32))
}

/// Persist every flattened element (already in sequence order) and, for
/// choice kinds, its option rows. Returns the new element ids in order.
fn insert_elements(
    tx: &Transaction,
    records: &[ElementRecord],
    today: NaiveDate,
) -> Result<Vec<ElementId>> {
    let mut ids = Vec::with_capacity(records.len());
    for record in records {
        ids.push(insert_element(tx, record, today)?);
    }
    Ok(ids)
}

fn insert_element(tx: &Transaction, record: &ElementRecord, today: NaiveDate) -> Result<ElementId> {
    let value_type = match record.kind {
        RecordKind::Numeric => ValueType::Float,
        RecordKind::Integer => ValueType::Integer,
        RecordKind::Choice | RecordKind::MultiChoice => ValueType::ValueSet,
    };
    let max_cardinality = match record.kind {
        RecordKind::MultiChoice => record.options.len() as u32,
        _ => 1,
    };
    tx.execute(
        "INSERT INTO element (name, short_name, definition, question, instructions, value_type,
                              value_min, value_max, step_value, min_cardinality, max_cardinality,
                              unit, source, status, status_date, version, version_date, editor)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            record.label,
            "",
            record.hint.clone().unwrap_or_default(),
            record.label,
            "",
            value_type.as_str(),
            record.minimum,
            record.maximum,
            1u32,
            max_cardinality,
            record.unit.clone().unwrap_or_default(),
            DEFAULT_SOURCE,
            DEFAULT_STATUS,
            today,
            DEFAULT_VERSION,
            today,
            "",
        ],
    )?;
    let element_id = ElementId(tx.last_insert_rowid() as u32);
    debug!(element = %element_id, source_id = %record.id, "persisted element");

    if value_type.has_values() {
        for option in &record.options {
            tx.execute(
                "INSERT INTO element_value (element_id, value, name, definition)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    element_id.as_u32(),
                    truncate_value(&option.value),
                    option.label,
                    option.report_text.clone().unwrap_or_default(),
                ],
            )?;
        }
    }
    Ok(element_id)
}

fn link_elements(tx: &Transaction, set_id: SetId, element_ids: &[ElementId]) -> Result<()> {
    for element_id in element_ids {
        tx.execute(
            "INSERT INTO element_set_ref (element_id, set_id) VALUES (?1, ?2)",
            params![element_id.as_u32(), set_id.as_u32()],
        )?;
    }
    Ok(())
}

/// Remove every element reachable through the set's membership links,
/// values first, then the element, then the link itself. Returns how many
/// elements were removed.
fn delete_element_graph(tx: &Transaction, set_id: SetId) -> Result<usize> {
    let element_ids: Vec<u32> = {
        let mut stmt = tx.prepare("SELECT element_id FROM element_set_ref WHERE set_id = ?1")?;
        let rows = stmt.query_map(params![set_id.as_u32()], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<_>>()?
    };
    for element_id in &element_ids {
        tx.execute(
            "DELETE FROM element_value WHERE element_id = ?1",
            params![element_id],
        )?;
        tx.execute("DELETE FROM element WHERE id = ?1", params![element_id])?;
    }
    tx.execute(
        "DELETE FROM element_set_ref WHERE set_id = ?1",
        params![set_id.as_u32()],
    )?;
    Ok(element_ids.len())
}

pub(crate) fn truncate_value(value: &str) -> String {
    value.chars().take(MAX_VALUE_LEN).collect()
}
