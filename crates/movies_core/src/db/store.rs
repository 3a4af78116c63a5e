//! On-disk stage files for the movies fixture.
//!
//! # Responsibility
//! - Map stage names to `<root>/<stage>.db` files.
//! - Build stage files from fixture scripts and copy one stage into the next.
//!
//! # Invariants
//! - Stage names never contain path separators or `..`.
//! - `prepare` is idempotent for a stage already at the requested version.

use super::fixture::{apply_fixture_scripts, latest_version};
use super::{open_db, DbError, DbResult};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Instant;

static STAGE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid stage name regex"));

const STAGE_FILE_EXTENSION: &str = "db";

/// Directory holding one fixture database file per stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureStore {
    root: PathBuf,
}

impl FixtureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the database file path for `stage`.
    ///
    /// # Errors
    /// - `InvalidStageName` when the name is empty, too long or has
    ///   characters outside `[A-Za-z0-9_-]`.
    pub fn stage_path(&self, stage: &str) -> DbResult<PathBuf> {
        if !STAGE_NAME_RE.is_match(stage) {
            return Err(DbError::InvalidStageName(stage.to_string()));
        }
        Ok(self
            .root
            .join(format!("{stage}.{STAGE_FILE_EXTENSION}")))
    }

    /// Builds (or upgrades) the stage file to the latest fixture version.
    pub fn prepare(&self, stage: &str) -> DbResult<PathBuf> {
        self.prepare_to(stage, latest_version())
    }

    /// Builds (or upgrades) the stage file to `version`.
    ///
    /// # Side effects
    /// - Creates the store root directory when missing.
    /// - Emits `fixture_prepare` logging events.
    pub fn prepare_to(&self, stage: &str, version: u32) -> DbResult<PathBuf> {
        let path = self.stage_path(stage)?;
        let started_at = Instant::now();
        info!(
            "event=fixture_prepare module=db status=start stage={} version={}",
            stage, version
        );

        let result = self.ensure_root().and_then(|()| {
            let mut conn = open_db(&path)?;
            apply_fixture_scripts(&mut conn, version)
        });

        match result {
            Ok(()) => {
                info!(
                    "event=fixture_prepare module=db status=ok stage={} version={} duration_ms={}",
                    stage,
                    version,
                    started_at.elapsed().as_millis()
                );
                Ok(path)
            }
            Err(err) => {
                error!(
                    "event=fixture_prepare module=db status=error stage={} version={} duration_ms={} error_code={}",
                    stage,
                    version,
                    started_at.elapsed().as_millis(),
                    err.code()
                );
                Err(err)
            }
        }
    }

    /// Returns the path of a stage that has already been prepared.
    ///
    /// # Errors
    /// - `FixtureMissing` when no file exists for `stage`.
    pub fn existing_stage_path(&self, stage: &str) -> DbResult<PathBuf> {
        let path = self.stage_path(stage)?;
        if !path.is_file() {
            return Err(DbError::FixtureMissing {
                stage: stage.to_string(),
                path,
            });
        }
        Ok(path)
    }

    /// Copies stage `from` into stage `to`, replacing any previous `to` file.
    ///
    /// # Errors
    /// - `StageCopyOntoItself` when `from` and `to` name the same stage.
    /// - `FixtureMissing` when `from` has not been prepared.
    pub fn copy_stage(&self, from: &str, to: &str) -> DbResult<PathBuf> {
        let source = self.existing_stage_path(from)?;
        let target = self.stage_path(to)?;
        if source == target {
            return Err(DbError::StageCopyOntoItself(from.to_string()));
        }

        self.ensure_root()?;
        std::fs::copy(&source, &target).map_err(|source_err| DbError::Io {
            path: target.clone(),
            source: source_err,
        })?;

        info!(
            "event=fixture_copy module=db status=ok from={} to={}",
            from, to
        );
        Ok(target)
    }

    /// Deletes the stage file. Missing files are not an error.
    pub fn remove_stage(&self, stage: &str) -> DbResult<()> {
        let path = self.stage_path(stage)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(DbError::Io { path, source: err }),
        }
    }

    fn ensure_root(&self) -> DbResult<()> {
        std::fs::create_dir_all(&self.root).map_err(|source| DbError::Io {
            path: self.root.clone(),
            source,
        })
    }
}
