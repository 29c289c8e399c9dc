//! Connection handling and table definitions.

use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS element (
    id               INTEGER PRIMARY KEY,
    name             TEXT NOT NULL,
    short_name       TEXT NOT NULL,
    definition       TEXT NOT NULL,
    question         TEXT NOT NULL,
    instructions     TEXT NOT NULL,
    value_type       TEXT NOT NULL,
    value_min        REAL,
    value_max        REAL,
    step_value       REAL,
    min_cardinality  INTEGER NOT NULL,
    max_cardinality  INTEGER NOT NULL,
    unit             TEXT NOT NULL,
    source           TEXT NOT NULL,
    status           TEXT NOT NULL,
    status_date      TEXT NOT NULL,
    version          TEXT NOT NULL,
    version_date     TEXT NOT NULL,
    editor           TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS element_value (
    id          INTEGER PRIMARY KEY,
    element_id  INTEGER NOT NULL,
    value       TEXT NOT NULL,
    name        TEXT NOT NULL,
    definition  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS element_set (
    id            INTEGER PRIMARY KEY,
    name          TEXT NOT NULL,
    description   TEXT NOT NULL,
    contact_name  TEXT NOT NULL,
    parent_id     INTEGER,
    status        TEXT NOT NULL,
    status_date   TEXT NOT NULL,
    version       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS element_set_ref (
    id          INTEGER PRIMARY KEY,
    element_id  INTEGER NOT NULL,
    set_id      INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS person (
    id     INTEGER PRIMARY KEY,
    name   TEXT NOT NULL,
    orcid  TEXT NOT NULL,
    url    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS organization (
    id            INTEGER PRIMARY KEY,
    name          TEXT NOT NULL,
    abbreviation  TEXT NOT NULL,
    url           TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reference (
    id         INTEGER PRIMARY KEY,
    citation   TEXT NOT NULL,
    doi_uri    TEXT NOT NULL,
    pubmed_id  TEXT NOT NULL,
    url        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS index_code (
    id       INTEGER PRIMARY KEY,
    code     TEXT NOT NULL,
    system   TEXT NOT NULL,
    display  TEXT NOT NULL,
    url      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS index_code_set_ref (
    id       INTEGER PRIMARY KEY,
    code_id  INTEGER NOT NULL,
    set_id   INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS person_role_set_ref (
    id         INTEGER PRIMARY KEY,
    person_id  INTEGER NOT NULL,
    set_id     INTEGER NOT NULL,
    role       TEXT
);

CREATE TABLE IF NOT EXISTS organization_role_set_ref (
    id               INTEGER PRIMARY KEY,
    organization_id  INTEGER NOT NULL,
    set_id           INTEGER NOT NULL,
    role             TEXT
);
";

/// The catalog store: one sqlite connection plus the operations defined in
/// the repository, ingestion, and aggregation modules.
///
/// Mutating operations take `&mut self` and run inside one explicit
/// transaction each; read-side aggregation takes `&self` and runs without
/// a transaction.
#[derive(Debug)]
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Open (creating if needed) a catalog database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open a private in-memory catalog, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}
