//! Command implementations.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::debug;

use rde_model::{ElementSetDetails, SetId};
use rde_store::Store;

use crate::cli::{
    AddCodeArgs, AddOrganizationArgs, AddPersonArgs, DeleteArgs, GetArgs, IngestArgs,
    LinkCodeArgs, LinkOrganizationArgs, LinkPersonArgs, ListArgs, SearchArgs, UpdateArgs,
};

fn open_store(db: &Path) -> Result<Store> {
    debug!(db = %db.display(), "opening catalog database");
    Store::open(db).with_context(|| format!("open catalog database {}", db.display()))
}

fn parse_set_id(raw: &str) -> Result<SetId> {
    Ok(raw.parse()?)
}

pub fn run_ingest(db: &Path, args: &IngestArgs) -> Result<()> {
    let xml = fs::read_to_string(&args.module)
        .with_context(|| format!("read module document {}", args.module.display()))?;
    let mut store = open_store(db)?;
    let set_id = store.create_module(&xml)?;
    println!("created {set_id}");
    Ok(())
}

pub fn run_update(db: &Path, args: &UpdateArgs) -> Result<()> {
    let set_id = parse_set_id(&args.set_id)?;
    let xml = fs::read_to_string(&args.module)
        .with_context(|| format!("read module document {}", args.module.display()))?;
    let mut store = open_store(db)?;
    store.update_module(&xml, set_id)?;
    println!("updated {set_id}");
    Ok(())
}

pub fn run_get(db: &Path, args: &GetArgs) -> Result<()> {
    let set_id = parse_set_id(&args.set_id)?;
    let store = open_store(db)?;
    let details = store.set_details(set_id)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&details)?);
    } else {
        print_details(&details);
    }
    Ok(())
}

pub fn run_list(db: &Path, args: &ListArgs) -> Result<()> {
    let store = open_store(db)?;
    let details = store.all_set_details()?;
    print_many(&details, args.json)
}

pub fn run_search(db: &Path, args: &SearchArgs) -> Result<()> {
    let store = open_store(db)?;
    let details = store.search_set_details(&args.keyword)?;
    print_many(&details, args.json)
}

pub fn run_delete(db: &Path, args: &DeleteArgs) -> Result<()> {
    let set_id = parse_set_id(&args.set_id)?;
    let mut store = open_store(db)?;
    store.delete_set(set_id)?;
    println!("deleted {set_id}");
    Ok(())
}

pub fn run_add_person(db: &Path, args: &AddPersonArgs) -> Result<()> {
    let mut store = open_store(db)?;
    let person = store.add_person(&args.name, &args.orcid, &args.url)?;
    println!("added person {} ({})", person.id, person.name);
    Ok(())
}

pub fn run_add_organization(db: &Path, args: &AddOrganizationArgs) -> Result<()> {
    let mut store = open_store(db)?;
    let organization = store.add_organization(&args.name, &args.abbreviation, &args.url)?;
    println!("added organization {} ({})", organization.id, organization.name);
    Ok(())
}

pub fn run_add_code(db: &Path, args: &AddCodeArgs) -> Result<()> {
    let mut store = open_store(db)?;
    let code = store.add_index_code(&args.code, &args.system, &args.display, &args.url)?;
    println!("added index code {} ({} {})", code.id, code.system, code.code);
    Ok(())
}

pub fn run_link_person(db: &Path, args: &LinkPersonArgs) -> Result<()> {
    let set_id = parse_set_id(&args.set_id)?;
    let mut store = open_store(db)?;
    store.link_person(set_id, args.person_id, args.role.as_deref())?;
    println!("linked person {} to {set_id}", args.person_id);
    Ok(())
}

pub fn run_link_organization(db: &Path, args: &LinkOrganizationArgs) -> Result<()> {
    let set_id = parse_set_id(&args.set_id)?;
    let mut store = open_store(db)?;
    store.link_organization(set_id, args.organization_id, args.role.as_deref())?;
    println!("linked organization {} to {set_id}", args.organization_id);
    Ok(())
}

pub fn run_link_code(db: &Path, args: &LinkCodeArgs) -> Result<()> {
    let set_id = parse_set_id(&args.set_id)?;
    let mut store = open_store(db)?;
    store.link_index_code(set_id, args.code_id)?;
    println!("linked index code {} to {set_id}", args.code_id);
    Ok(())
}

fn print_many(details: &[ElementSetDetails], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(details)?);
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec![
        "Set", "Name", "Status", "Version", "Codes", "Persons", "Organizations",
    ]);
    for entry in details {
        table.add_row(vec![
            entry.id.to_string(),
            entry.name.clone(),
            entry.status.clone(),
            entry.version.clone(),
            entry.index_codes.len().to_string(),
            entry.persons.len().to_string(),
            entry.organizations.len().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn print_details(details: &ElementSetDetails) {
    println!("{} {}", details.id, details.name);
    if !details.description.is_empty() {
        println!("{}", details.description);
    }
    if !details.contact_name.is_empty() {
        println!("contact: {}", details.contact_name);
    }
    println!(
        "status: {} ({})  version: {}",
        details.status, details.status_date, details.version
    );

    if !details.index_codes.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Code", "System", "Display"]);
        for code in &details.index_codes {
            table.add_row(vec![code.code.clone(), code.system.clone(), code.display.clone()]);
        }
        println!("{table}");
    }
    if !details.persons.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Person", "Roles"]);
        for person in &details.persons {
            table.add_row(vec![person.name.clone(), person.roles.join(", ")]);
        }
        println!("{table}");
    }
    if !details.organizations.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Organization", "Roles"]);
        for organization in &details.organizations {
            table.add_row(vec![organization.name.clone(), organization.roles.join(", ")]);
        }
        println!("{table}");
    }
}
