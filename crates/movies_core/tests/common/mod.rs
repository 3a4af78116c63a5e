#![allow(dead_code)]

use movies_core::{
    latest_version, run_with_timeout, Database, FixtureStore, TimeoutError, DEFAULT_TEST_TIMEOUT,
};

/// Prepares `previous` at the latest fixture version, copies it to `stage`
/// and runs `check` against the copy within the default test budget.
pub fn with_stage<F>(previous: &'static str, stage: &'static str, check: F)
where
    F: FnOnce(&mut Database, &FixtureStore) + Send + 'static,
{
    with_stage_at(previous, latest_version(), stage, check);
}

/// Same as [`with_stage`], with `previous` built only up to `version`.
pub fn with_stage_at<F>(previous: &'static str, version: u32, stage: &'static str, check: F)
where
    F: FnOnce(&mut Database, &FixtureStore) + Send + 'static,
{
    let outcome = run_with_timeout(DEFAULT_TEST_TIMEOUT, move || {
        let dir = tempfile::tempdir().unwrap();
        let store = FixtureStore::new(dir.path());
        store.prepare_to(previous, version).unwrap();

        let mut db = Database::from_existing(&store, previous, stage).unwrap();
        db.set_query_timeout(Some(DEFAULT_TEST_TIMEOUT));
        check(&mut db, &store);
    });

    match outcome {
        Ok(()) => {}
        Err(TimeoutError::Panicked) => panic!("stage {stage} failed; see panic output above"),
        Err(err) => panic!("stage {stage}: {err}"),
    }
}

/// Reads one integer column from a single-row query.
pub fn scalar_i64(db: &Database, sql: &str, alias: &str) -> i64 {
    let row = db.select_single_row(sql).unwrap().expect("query returned no rows");
    row[alias].as_i64().expect("column is not an integer")
}
