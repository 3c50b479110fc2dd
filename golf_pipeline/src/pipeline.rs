use std::{
    fmt,
    path::{Path, PathBuf},
};

use chrono::Utc;
use golf_schema::Timestamp;
use thiserror::Error;

use crate::{
    aggregate::compute_all_statistics,
    materialize::{materialize, ApiLayout},
    reader::{load_record_store, RecordStore},
    snapshot::{ensure_disjoint, Snapshot},
    PipelineError,
};

pub const DEFAULT_INPUT_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "public/api";

/// Where the pipeline reads records from and publishes the API tree to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
}

impl PipelineConfig {
    pub fn from_project_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            input_root: root.join(DEFAULT_INPUT_DIR),
            output_root: root.join(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from(DEFAULT_INPUT_DIR),
            output_root: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PrepareOutput,
    Load,
    Materialize,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::PrepareOutput => "prepare-output",
            Stage::Load => "load",
            Stage::Materialize => "materialize",
            Stage::Publish => "publish",
        })
    }
}

#[derive(Debug, Error)]
#[error("{stage} failed")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

impl StageError {
    fn at(stage: Stage) -> impl FnOnce(PipelineError) -> Self {
        move |source| Self { stage, source }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub users: usize,
    pub courses: usize,
    pub rounds: usize,
    pub statistics: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub loaded: LoadSummary,
    pub resources_written: usize,
    pub output_root: PathBuf,
    pub generated_at: Timestamp,
}

/// Full rebuild: load, aggregate, materialize into staging, publish.
pub fn run(config: &PipelineConfig) -> Result<RunSummary, StageError> {
    run_at(config, Utc::now())
}

/// `run` with a fixed generation timestamp.
pub fn run_at(config: &PipelineConfig, generated_at: Timestamp) -> Result<RunSummary, StageError> {
    log::info!("preparing output {}", config.output_root.display());
    ensure_disjoint(&config.output_root, &config.input_root)
        .map_err(StageError::at(Stage::PrepareOutput))?;
    let snapshot = Snapshot::begin(&config.output_root).map_err(StageError::at(Stage::PrepareOutput))?;
    let layout = ApiLayout::new(snapshot.staging_dir());

    let built = layout
        .ensure_dirs()
        .map_err(StageError::at(Stage::PrepareOutput))
        .and_then(|()| build(config, &layout, generated_at));

    let (loaded, resources_written) = match built {
        Ok(done) => done,
        Err(e) => {
            snapshot.discard();
            return Err(e);
        }
    };

    let output_root = snapshot.publish().map_err(StageError::at(Stage::Publish))?;
    log::info!("published {}", output_root.display());

    Ok(RunSummary {
        loaded,
        resources_written,
        output_root,
        generated_at,
    })
}

/// Loads and aggregates without writing anything.
pub fn check(config: &PipelineConfig) -> Result<LoadSummary, StageError> {
    let store = load(config)?;
    let statistics = compute_all_statistics(&store, Utc::now());
    Ok(summarize(&store, statistics.len()))
}

fn build(
    config: &PipelineConfig,
    layout: &ApiLayout,
    generated_at: Timestamp,
) -> Result<(LoadSummary, usize), StageError> {
    let store = load(config)?;

    let statistics = compute_all_statistics(&store, generated_at);
    log::info!(
        "computed statistics for {} of {} users",
        statistics.len(),
        store.users.len()
    );

    let report = materialize(layout, &store, &statistics, generated_at)
        .map_err(StageError::at(Stage::Materialize))?;

    Ok((summarize(&store, statistics.len()), report.resources_written))
}

fn load(config: &PipelineConfig) -> Result<RecordStore, StageError> {
    log::info!("loading records from {}", config.input_root.display());
    let store = load_record_store(&config.input_root).map_err(StageError::at(Stage::Load))?;
    log::info!(
        "loaded {} users, {} courses, {} rounds",
        store.users.len(),
        store.courses.len(),
        store.round_count()
    );
    Ok(store)
}

fn summarize(store: &RecordStore, statistics: usize) -> LoadSummary {
    LoadSummary {
        users: store.users.len(),
        courses: store.courses.len(),
        rounds: store.round_count(),
        statistics,
    }
}
