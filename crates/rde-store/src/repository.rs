//! Per-entity row access.
//!
//! Single-table lookup/insert/update/delete for the standalone entities
//! (Person, Organization, Reference, IndexCode) plus row access for the
//! element graph tables used by ingestion, aggregation, and tests.
//! Filters are simple equality/substring matches applied in process after
//! materializing the table, matching how the read side joins.

use rusqlite::{OptionalExtension, Row, Transaction, params};

use rde_model::{
    Element, ElementId, ElementSet, ElementSetRef, ElementValue, IndexCode, IndexCodeSetRef,
    Organization, OrganizationRoleSetRef, Person, PersonRoleSetRef, Reference, SetId,
};

use crate::error::{Result, StoreError};
use crate::schema::Store;

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub(crate) fn element_from_row(row: &Row) -> rusqlite::Result<Element> {
    Ok(Element {
        id: ElementId(row.get("id")?),
        name: row.get("name")?,
        short_name: row.get("short_name")?,
        definition: row.get("definition")?,
        question: row.get("question")?,
        instructions: row.get("instructions")?,
        value_type: row.get::<_, String>("value_type")?.parse().map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(err),
            )
        })?,
        value_min: row.get("value_min")?,
        value_max: row.get("value_max")?,
        step_value: row.get("step_value")?,
        min_cardinality: row.get("min_cardinality")?,
        max_cardinality: row.get("max_cardinality")?,
        unit: row.get("unit")?,
        source: row.get("source")?,
        status: row.get("status")?,
        status_date: row.get("status_date")?,
        version: row.get("version")?,
        version_date: row.get("version_date")?,
        editor: row.get("editor")?,
    })
}

pub(crate) fn set_from_row(row: &Row) -> rusqlite::Result<ElementSet> {
    Ok(ElementSet {
        id: SetId(row.get("id")?),
        name: row.get("name")?,
        description: row.get("description")?,
        contact_name: row.get("contact_name")?,
        parent_id: row.get::<_, Option<u32>>("parent_id")?.map(SetId),
        status: row.get("status")?,
        status_date: row.get("status_date")?,
        version: row.get("version")?,
    })
}

fn person_from_row(row: &Row) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get("id")?,
        name: row.get("name")?,
        orcid: row.get("orcid")?,
        url: row.get("url")?,
    })
}

fn organization_from_row(row: &Row) -> rusqlite::Result<Organization> {
    Ok(Organization {
        id: row.get("id")?,
        name: row.get("name")?,
        abbreviation: row.get("abbreviation")?,
        url: row.get("url")?,
    })
}

fn reference_from_row(row: &Row) -> rusqlite::Result<Reference> {
    Ok(Reference {
        id: row.get("id")?,
        citation: row.get("citation")?,
        doi_uri: row.get("doi_uri")?,
        pubmed_id: row.get("pubmed_id")?,
        url: row.get("url")?,
    })
}

fn index_code_from_row(row: &Row) -> rusqlite::Result<IndexCode> {
    Ok(IndexCode {
        id: row.get("id")?,
        code: row.get("code")?,
        system: row.get("system")?,
        display: row.get("display")?,
        url: row.get("url")?,
    })
}

impl Store {
    // ── Elements ──

    pub fn get_element(&self, id: ElementId) -> Result<Element> {
        self.conn
            .query_row(
                "SELECT * FROM element WHERE id = ?1",
                params![id.as_u32()],
                element_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("element {id}")))
    }

    pub fn list_elements(&self) -> Result<Vec<Element>> {
        let mut stmt = self.conn.prepare("SELECT * FROM element ORDER BY id")?;
        let rows = stmt.query_map([], element_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Option rows owned by one element, in insertion order.
    pub fn element_values(&self, element_id: ElementId) -> Result<Vec<ElementValue>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM element_value WHERE element_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![element_id.as_u32()], |row| {
            Ok(ElementValue {
                id: row.get("id")?,
                element_id: ElementId(row.get("element_id")?),
                value: row.get("value")?,
                name: row.get("name")?,
                definition: row.get("definition")?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    // ── Sets ──

    pub fn get_set(&self, id: SetId) -> Result<ElementSet> {
        self.conn
            .query_row(
                "SELECT * FROM element_set WHERE id = ?1",
                params![id.as_u32()],
                set_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("element set {id}")))
    }

    pub fn list_sets(&self) -> Result<Vec<ElementSet>> {
        let mut stmt = self.conn.prepare("SELECT * FROM element_set ORDER BY id")?;
        let rows = stmt.query_map([], set_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Membership links for one set.
    pub fn set_element_refs(&self, set_id: SetId) -> Result<Vec<ElementSetRef>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM element_set_ref WHERE set_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![set_id.as_u32()], |row| {
            Ok(ElementSetRef {
                id: row.get("id")?,
                element_id: ElementId(row.get("element_id")?),
                set_id: SetId(row.get("set_id")?),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    // ── Persons ──

    pub fn add_person(&mut self, name: &str, orcid: &str, url: &str) -> Result<Person> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO person (name, orcid, url) VALUES (?1, ?2, ?3)",
            params![name, orcid, url],
        )?;
        let id = tx.last_insert_rowid() as u32;
        tx.commit()?;
        Ok(Person {
            id,
            name: name.to_string(),
            orcid: orcid.to_string(),
            url: url.to_string(),
        })
    }

    pub fn get_person(&self, id: u32) -> Result<Person> {
        self.conn
            .query_row("SELECT * FROM person WHERE id = ?1", params![id], person_from_row)
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("person {id}")))
    }

    pub fn list_persons(&self) -> Result<Vec<Person>> {
        let mut stmt = self.conn.prepare("SELECT * FROM person ORDER BY id")?;
        let rows = stmt.query_map([], person_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Case-insensitive substring match on the person name.
    pub fn search_persons(&self, name: &str) -> Result<Vec<Person>> {
        Ok(self
            .list_persons()?
            .into_iter()
            .filter(|person| contains_ci(&person.name, name))
            .collect())
    }

    pub fn update_person(&mut self, person: &Person) -> Result<()> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE person SET name = ?2, orcid = ?3, url = ?4 WHERE id = ?1",
            params![person.id, person.name, person.orcid, person.url],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("person {}", person.id)));
        }
        tx.commit()?;
        Ok(())
    }

    /// Deletes the person and every role link that points at them.
    pub fn delete_person(&mut self, id: u32) -> Result<()> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute("DELETE FROM person WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("person {id}")));
        }
        tx.execute(
            "DELETE FROM person_role_set_ref WHERE person_id = ?1",
            params![id],
        )?;
        tx.commit()?;
        Ok(())
    }

    // ── Organizations ──

    pub fn add_organization(&mut self, name: &str, abbreviation: &str, url: &str) -> Result<Organization> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO organization (name, abbreviation, url) VALUES (?1, ?2, ?3)",
            params![name, abbreviation, url],
        )?;
        let id = tx.last_insert_rowid() as u32;
        tx.commit()?;
        Ok(Organization {
            id,
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
            url: url.to_string(),
        })
    }

    pub fn get_organization(&self, id: u32) -> Result<Organization> {
        self.conn
            .query_row(
                "SELECT * FROM organization WHERE id = ?1",
                params![id],
                organization_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("organization {id}")))
    }

    pub fn list_organizations(&self) -> Result<Vec<Organization>> {
        let mut stmt = self.conn.prepare("SELECT * FROM organization ORDER BY id")?;
        let rows = stmt.query_map([], organization_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn search_organizations(&self, name: &str) -> Result<Vec<Organization>> {
        Ok(self
            .list_organizations()?
            .into_iter()
            .filter(|org| contains_ci(&org.name, name))
            .collect())
    }

    pub fn update_organization(&mut self, organization: &Organization) -> Result<()> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE organization SET name = ?2, abbreviation = ?3, url = ?4 WHERE id = ?1",
            params![
                organization.id,
                organization.name,
                organization.abbreviation,
                organization.url
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!(
                "organization {}",
                organization.id
            )));
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete_organization(&mut self, id: u32) -> Result<()> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute("DELETE FROM organization WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("organization {id}")));
        }
        tx.execute(
            "DELETE FROM organization_role_set_ref WHERE organization_id = ?1",
            params![id],
        )?;
        tx.commit()?;
        Ok(())
    }

    // ── References ──

    pub fn add_reference(
        &mut self,
        citation: &str,
        doi_uri: &str,
        pubmed_id: &str,
        url: &str,
    ) -> Result<Reference> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO reference (citation, doi_uri, pubmed_id, url) VALUES (?1, ?2, ?3, ?4)",
            params![citation, doi_uri, pubmed_id, url],
        )?;
        let id = tx.last_insert_rowid() as u32;
        tx.commit()?;
        Ok(Reference {
            id,
            citation: citation.to_string(),
            doi_uri: doi_uri.to_string(),
            pubmed_id: pubmed_id.to_string(),
            url: url.to_string(),
        })
    }

    pub fn get_reference(&self, id: u32) -> Result<Reference> {
        self.conn
            .query_row(
                "SELECT * FROM reference WHERE id = ?1",
                params![id],
                reference_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("reference {id}")))
    }

    pub fn list_references(&self) -> Result<Vec<Reference>> {
        let mut stmt = self.conn.prepare("SELECT * FROM reference ORDER BY id")?;
        let rows = stmt.query_map([], reference_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn update_reference(&mut self, reference: &Reference) -> Result<()> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE reference SET citation = ?2, doi_uri = ?3, pubmed_id = ?4, url = ?5 WHERE id = ?1",
            params![
                reference.id,
                reference.citation,
                reference.doi_uri,
                reference.pubmed_id,
                reference.url
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("reference {}", reference.id)));
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete_reference(&mut self, id: u32) -> Result<()> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute("DELETE FROM reference WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("reference {id}")));
        }
        tx.commit()?;
        Ok(())
    }

    // ── Index codes ──

    pub fn add_index_code(
        &mut self,
        code: &str,
        system: &str,
        display: &str,
        url: &str,
    ) -> Result<IndexCode> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO index_code (code, system, display, url) VALUES (?1, ?2, ?3, ?4)",
            params![code, system, display, url],
        )?;
        let id = tx.last_insert_rowid() as u32;
        tx.commit()?;
        Ok(IndexCode {
            id,
            code: code.to_string(),
            system: system.to_string(),
            display: display.to_string(),
            url: url.to_string(),
        })
    }

    pub fn get_index_code(&self, id: u32) -> Result<IndexCode> {
        self.conn
            .query_row(
                "SELECT * FROM index_code WHERE id = ?1",
                params![id],
                index_code_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("index code {id}")))
    }

    pub fn list_index_codes(&self) -> Result<Vec<IndexCode>> {
        let mut stmt = self.conn.prepare("SELECT * FROM index_code ORDER BY id")?;
        let rows = stmt.query_map([], index_code_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn search_index_codes(&self, code: &str) -> Result<Vec<IndexCode>> {
        Ok(self
            .list_index_codes()?
            .into_iter()
            .filter(|ic| contains_ci(&ic.code, code))
            .collect())
    }

    pub fn update_index_code(&mut self, index_code: &IndexCode) -> Result<()> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE index_code SET code = ?2, system = ?3, display = ?4, url = ?5 WHERE id = ?1",
            params![
                index_code.id,
                index_code.code,
                index_code.system,
                index_code.display,
                index_code.url
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("index code {}", index_code.id)));
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete_index_code(&mut self, id: u32) -> Result<()> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute("DELETE FROM index_code WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("index code {id}")));
        }
        tx.execute(
            "DELETE FROM index_code_set_ref WHERE code_id = ?1",
            params![id],
        )?;
        tx.commit()?;
        Ok(())
    }

    // ── Cross-reference links ──

    /// Attach a terminology code to a set. One row per link.
    pub fn link_index_code(&mut self, set_id: SetId, code_id: u32) -> Result<IndexCodeSetRef> {
        let tx = self.conn.transaction()?;
        require_set(&tx, set_id)?;
        require_row(&tx, "index_code", code_id, "index code")?;
        tx.execute(
            "INSERT INTO index_code_set_ref (code_id, set_id) VALUES (?1, ?2)",
            params![code_id, set_id.as_u32()],
        )?;
        let id = tx.last_insert_rowid() as u32;
        tx.commit()?;
        Ok(IndexCodeSetRef {
            id,
            code_id,
            set_id,
        })
    }

    /// Attach a person to a set; each row contributes at most one role.
    pub fn link_person(
        &mut self,
        set_id: SetId,
        person_id: u32,
        role: Option<&str>,
    ) -> Result<PersonRoleSetRef> {
        let tx = self.conn.transaction()?;
        require_set(&tx, set_id)?;
        require_row(&tx, "person", person_id, "person")?;
        tx.execute(
            "INSERT INTO person_role_set_ref (person_id, set_id, role) VALUES (?1, ?2, ?3)",
            params![person_id, set_id.as_u32(), role],
        )?;
        let id = tx.last_insert_rowid() as u32;
        tx.commit()?;
        Ok(PersonRoleSetRef {
            id,
            person_id,
            set_id,
            role: role.map(str::to_string),
        })
    }

    /// Attach an organization to a set; each row contributes at most one role.
    pub fn link_organization(
        &mut self,
        set_id: SetId,
        organization_id: u32,
        role: Option<&str>,
    ) -> Result<OrganizationRoleSetRef> {
        let tx = self.conn.transaction()?;
        require_set(&tx, set_id)?;
        require_row(&tx, "organization", organization_id, "organization")?;
        tx.execute(
            "INSERT INTO organization_role_set_ref (organization_id, set_id, role) VALUES (?1, ?2, ?3)",
            params![organization_id, set_id.as_u32(), role],
        )?;
        let id = tx.last_insert_rowid() as u32;
        tx.commit()?;
        Ok(OrganizationRoleSetRef {
            id,
            organization_id,
            set_id,
            role: role.map(str::to_string),
        })
    }
}

fn require_set(tx: &Transaction, set_id: SetId) -> Result<()> {
    require_row(tx, "element_set", set_id.as_u32(), "element set")
}

fn require_row(tx: &Transaction, table: &str, id: u32, what: &str) -> Result<()> {
    let exists: Option<u32> = tx
        .query_row(
            &format!("SELECT id FROM {table} WHERE id = ?1"),
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(StoreError::NotFound(format!("{what} {id}")));
    }
    Ok(())
}
