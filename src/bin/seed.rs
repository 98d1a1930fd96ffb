//! Loads the built-in sample reports into the configured database.
//!
//! Usage: `SQLITE_PATH=./coastwatch.sqlite seed`

use anyhow::Result;
use serde_json::json;

use coastwatch::config::Config;
use coastwatch::logging::{log, obj, v_str, Domain, Level};
use coastwatch::sample;
use coastwatch::storage::StateStore;

fn main() -> Result<()> {
    let config = Config::from_env();
    let mut store = StateStore::new(&config.sqlite_path)?;
    store.init()?;
    let inserted = sample::seed_store(&mut store)?;
    log(
        Level::Info,
        Domain::System,
        "seed_done",
        obj(&[
            ("db", v_str(&config.sqlite_path)),
            ("inserted", json!(inserted)),
            ("total", json!(store.report_count()?)),
        ]),
    );
    Ok(())
}
