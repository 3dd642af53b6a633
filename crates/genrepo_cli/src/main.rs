//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire one unit of work end to end against an in-memory store.
//! - Keep output deterministic for quick local sanity checks.

use genrepo_core::{
    init_logging, open_db_in_memory, CrudService, DbOptions, Entry, EntryRecord, LogConfig,
    UnitOfWork,
};
use log::info;
use std::error::Error;
use time::macros::date;

fn main() -> Result<(), Box<dyn Error>> {
    init_logging(&LogConfig::default())?;

    let options = DbOptions::default();
    let conn = open_db_in_memory(&options)?;
    conn.execute_batch(EntryRecord::CREATE_TABLE_SQL)?;

    let mut service = CrudService::<Entry>::new(UnitOfWork::begin(conn, &options)?);
    let entry = Entry {
        id: 1,
        description: Some("first entry".to_string()),
        date: date!(2024 - 01 - 01),
    };

    let created = service.create(&entry)?;
    let loaded = service.get(Some(&EntryRecord::ID.eq(entry.id)))?;
    service.commit()?;
    info!(
        "event=cli_smoke module=cli status=ok uow_id={}",
        service.unit_of_work().id()
    );
    service.dispose();

    println!("genrepo_core version={}", genrepo_core::core_version());
    println!("created rows={created}");
    println!("roundtrip ok={}", loaded.as_ref() == Some(&entry));
    Ok(())
}
