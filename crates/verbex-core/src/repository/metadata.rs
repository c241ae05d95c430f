//! Access to the singleton `index_metadata` row.

use rusqlite::Connection;

use crate::error::{Error, Result};

use super::IndexMetadataRow;

pub fn get(conn: &Connection) -> Result<IndexMetadataRow> {
    conn.query_row(
        "SELECT id, name, created_utc, last_modified_utc FROM index_metadata",
        [],
        |row| {
            Ok(IndexMetadataRow {
                id: row.get(0)?,
                name: row.get(1)?,
                created_utc: row.get(2)?,
                last_modified_utc: row.get(3)?,
            })
        },
    )
    .map_err(|err| match err {
        rusqlite::Error::QueryReturnedNoRows => Error::Corruption {
            detail: "index_metadata singleton row is missing".to_string(),
        },
        other => Error::from(other),
    })
}
