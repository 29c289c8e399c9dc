//! Read-side aggregation: denormalizing join plus the deduplicating fold.
//!
//! The store materializes each involved table into memory and performs the
//! left-outer join chain in process, producing one flat row per
//! (code, person-role, organization-role) combination for every matching
//! set. [`fold_rows`] then groups those rows back into one hierarchical
//! result per set. The fold is keyed by ids throughout, so the resulting
//! code/person/organization sets are identical under any row ordering; only
//! the first-seen order of roles within one entity may vary.
//!
//! Reads run on the plain connection with no transaction. A concurrent
//! writer can make a read observe a partially updated set; that matches the
//! store's documented read-consistency level and is deliberately not
//! tightened here.

use std::collections::BTreeMap;

use rusqlite::Row;
use tracing::debug;

use rde_model::{
    ElementSet, ElementSetDetails, IndexCode, IndexCodeSummary, Organization,
    OrganizationAttributes, Person, PersonAttributes, SetId,
};

use crate::error::{Result, StoreError};
use crate::schema::Store;

/// One denormalized join row: a set paired with at most one related entity
/// from each cross-reference chain.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRow {
    pub set: ElementSet,
    pub code: Option<IndexCode>,
    pub person: Option<PersonRole>,
    pub organization: Option<OrganizationRole>,
}

/// A person joined through one role row.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonRole {
    pub person: Person,
    pub role: Option<String>,
}

/// An organization joined through one role row.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationRole {
    pub organization: Organization,
    pub role: Option<String>,
}

impl Store {
    /// Aggregate one set; NotFound when the id does not exist.
    pub fn set_details(&self, set_id: SetId) -> Result<ElementSetDetails> {
        let rows = self.join_rows(|set| set.id == set_id)?;
        let mut details = fold_rows(&rows);
        details
            .pop()
            .ok_or_else(|| StoreError::NotFound(format!("element set {set_id}")))
    }

    /// Aggregate every set in the catalog; NotFound when there are none.
    pub fn all_set_details(&self) -> Result<Vec<ElementSetDetails>> {
        let rows = self.join_rows(|_| true)?;
        let details = fold_rows(&rows);
        if details.is_empty() {
            return Err(StoreError::NotFound("no element sets in catalog".to_string()));
        }
        Ok(details)
    }

    /// Aggregate the sets whose name or formatted `RDES<id>` identifier
    /// contains the keyword, case-insensitively.
    pub fn search_set_details(&self, keyword: &str) -> Result<Vec<ElementSetDetails>> {
        let trimmed = keyword.trim();
        if trimmed.is_empty() {
            return Err(StoreError::Validation(
                "search keyword must not be empty".to_string(),
            ));
        }
        let needle = trimmed.to_lowercase();
        let rows = self.join_rows(|set| {
            set.name.to_lowercase().contains(&needle)
                || set.id.to_string().to_lowercase().contains(&needle)
        })?;
        let details = fold_rows(&rows);
        if details.is_empty() {
            return Err(StoreError::NotFound(format!(
                "no element set matching \"{trimmed}\""
            )));
        }
        Ok(details)
    }

    /// Materialize the join: Set ⟕ (code ref ⟕ code) ⟕ (person ref ⟕ person)
    /// ⟕ (organization ref ⟕ organization), producing the full cross product
    /// of related rows per set. A set with no rows in a relation contributes
    /// a single null on that side, so it still appears in the output.
    fn join_rows<F>(&self, keep: F) -> Result<Vec<JoinRow>>
    where
        F: Fn(&ElementSet) -> bool,
    {
        let sets: Vec<ElementSet> = self.list_sets()?.into_iter().filter(keep).collect();
        let codes = by_id(self.list_index_codes()?, |c| c.id);
        let persons = by_id(self.list_persons()?, |p| p.id);
        let organizations = by_id(self.list_organizations()?, |o| o.id);
        let code_refs = self.all_refs("index_code_set_ref", "code_id")?;
        let person_refs = self.all_role_refs("person_role_set_ref", "person_id")?;
        let organization_refs = self.all_role_refs("organization_role_set_ref", "organization_id")?;

        let mut rows = Vec::new();
        for set in sets {
            let set_codes: Vec<IndexCode> = code_refs
                .iter()
                .filter(|(_, set_id)| *set_id == set.id.as_u32())
                .filter_map(|(code_id, _)| codes.get(code_id).cloned())
                .collect();
            let set_persons: Vec<PersonRole> = person_refs
                .iter()
                .filter(|(_, set_id, _)| *set_id == set.id.as_u32())
                .filter_map(|(person_id, _, role)| {
                    persons.get(person_id).map(|person| PersonRole {
                        person: person.clone(),
                        role: role.clone(),
                    })
                })
                .collect();
            let set_organizations: Vec<OrganizationRole> = organization_refs
                .iter()
                .filter(|(_, set_id, _)| *set_id == set.id.as_u32())
                .filter_map(|(org_id, _, role)| {
                    organizations.get(org_id).map(|organization| OrganizationRole {
                        organization: organization.clone(),
                        role: role.clone(),
                    })
                })
                .collect();

            for code in outer(&set_codes) {
                for person in outer(&set_persons) {
                    for organization in outer(&set_organizations) {
                        rows.push(JoinRow {
                            set: set.clone(),
                            code: code.clone(),
                            person: person.clone(),
                            organization: organization.clone(),
                        });
                    }
                }
            }
        }
        debug!(rows = rows.len(), "materialized join rows");
        Ok(rows)
    }

    fn all_refs(&self, table: &str, entity_column: &str) -> Result<Vec<(u32, u32)>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {entity_column}, set_id FROM {table} ORDER BY id"))?;
        let rows = stmt.query_map([], |row: &Row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn all_role_refs(
        &self,
        table: &str,
        entity_column: &str,
    ) -> Result<Vec<(u32, u32, Option<String>)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {entity_column}, set_id, role FROM {table} ORDER BY id"
        ))?;
        let rows = stmt.query_map([], |row: &Row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }
}

fn by_id<T, F: Fn(&T) -> u32>(items: Vec<T>, id: F) -> BTreeMap<u32, T> {
    items.into_iter().map(|item| (id(&item), item)).collect()
}

/// Left-outer side of the cross product: an empty relation still yields one
/// (null) row so the set itself survives the join.
fn outer<T: Clone>(items: &[T]) -> Vec<Option<T>> {
    if items.is_empty() {
        vec![None]
    } else {
        items.iter().cloned().map(Some).collect()
    }
}

/// Order-independent fold of join rows into one hierarchical result per set.
pub fn fold_rows(rows: &[JoinRow]) -> Vec<ElementSetDetails> {
    let mut builder = AggregationBuilder::default();
    for row in rows {
        builder.push(row);
    }
    builder.finish()
}

/// Accumulates join rows grouped by set id, deduplicating related entities
/// by their ids and collecting the distinct role strings per entity.
#[derive(Debug, Default)]
pub struct AggregationBuilder {
    order: Vec<u32>,
    sets: BTreeMap<u32, ElementSetDetails>,
}

impl AggregationBuilder {
    pub fn push(&mut self, row: &JoinRow) {
        let key = row.set.id.as_u32();
        let entry = self.sets.entry(key).or_insert_with(|| {
            self.order.push(key);
            details_seed(&row.set)
        });

        if let Some(code) = &row.code {
            if !entry.index_codes.iter().any(|c| c.id == code.id) {
                entry.index_codes.push(IndexCodeSummary {
                    id: code.id,
                    code: code.code.clone(),
                    system: code.system.clone(),
                    display: code.display.clone(),
                    url: code.url.clone(),
                });
            }
        }

        if let Some(joined) = &row.person {
            match entry.persons.iter_mut().find(|p| p.id == joined.person.id) {
                Some(existing) => add_role(&mut existing.roles, joined.role.as_deref()),
                None => {
                    let mut roles = Vec::new();
                    add_role(&mut roles, joined.role.as_deref());
                    entry.persons.push(PersonAttributes {
                        id: joined.person.id,
                        name: joined.person.name.clone(),
                        orcid: joined.person.orcid.clone(),
                        url: joined.person.url.clone(),
                        roles,
                    });
                }
            }
        }

        if let Some(joined) = &row.organization {
            match entry
                .organizations
                .iter_mut()
                .find(|o| o.id == joined.organization.id)
            {
                Some(existing) => add_role(&mut existing.roles, joined.role.as_deref()),
                None => {
                    let mut roles = Vec::new();
                    add_role(&mut roles, joined.role.as_deref());
                    entry.organizations.push(OrganizationAttributes {
                        id: joined.organization.id,
                        name: joined.organization.name.clone(),
                        abbreviation: joined.organization.abbreviation.clone(),
                        url: joined.organization.url.clone(),
                        roles,
                    });
                }
            }
        }
    }

    /// First-seen set order, one entry per set id.
    pub fn finish(mut self) -> Vec<ElementSetDetails> {
        self.order
            .iter()
            .filter_map(|id| self.sets.remove(id))
            .collect()
    }
}

fn details_seed(set: &ElementSet) -> ElementSetDetails {
    ElementSetDetails {
        id: set.id,
        name: set.name.clone(),
        description: set.description.clone(),
        contact_name: set.contact_name.clone(),
        parent_id: set.parent_id,
        status: set.status.clone(),
        status_date: set.status_date,
        version: set.version.clone(),
        index_codes: Vec::new(),
        persons: Vec::new(),
        organizations: Vec::new(),
    }
}

fn add_role(roles: &mut Vec<String>, role: Option<&str>) {
    if let Some(role) = role {
        if !roles.iter().any(|existing| existing == role) {
            roles.push(role.to_string());
        }
    }
}
