use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use golf_schema::{
    paths::{self, ResourceGroup},
    CourseSummary, Detail, ListResource, ResourceEntry, RootIndex, Round, RoundSummary,
    Statistics, StatisticsSummary, Timestamp, User, UserDetail, UserSummary,
};
use serde::Serialize;

use crate::{reader::RecordStore, PipelineError};

pub const API_NAME: &str = "golf-stats";

/// Fragments that mark a normalized user key as credential-like.
const CREDENTIAL_FRAGMENTS: &[&str] = &[
    "password",
    "passwd",
    "passphrase",
    "secret",
    "token",
    "credential",
    "salt",
];

/// Keys the user detail resource defines itself.
const RESERVED_USER_KEYS: &[&str] = &["statistics", "rounds", "timestamp"];

/// Directory that receives one complete API tree.
#[derive(Debug, Clone)]
pub struct ApiLayout {
    root: PathBuf,
}

impl ApiLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root and one directory per group; existing ones are fine.
    pub fn ensure_dirs(&self) -> Result<(), PipelineError> {
        for group in ResourceGroup::ALL {
            let dir = paths::group_dir(&self.root, group);
            fs::create_dir_all(&dir).map_err(|e| {
                PipelineError::new(
                    "E2101",
                    format!("failed to create directory {}: {e}", dir.display()),
                )
                .with_path(dir.display().to_string())
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    pub resources_written: usize,
}

/// Writes the whole resource tree under `layout`, overwriting whatever is
/// there. Stops at the first failed write.
pub fn materialize(
    layout: &ApiLayout,
    store: &RecordStore,
    statistics: &BTreeMap<String, Statistics>,
    generated_at: Timestamp,
) -> Result<MaterializeReport, PipelineError> {
    layout.ensure_dirs()?;
    let mut writer = ResourceWriter::default();
    let root = layout.root();

    writer.write(&paths::root_index_path(root), &root_index(generated_at))?;

    // users
    let mut users: Vec<&User> = store.users.iter().collect();
    users.sort_by(|a, b| a.id.cmp(&b.id));
    let summaries: Vec<UserSummary> = users
        .iter()
        .map(|u| UserSummary {
            id: u.id.clone(),
            name: u.name.clone(),
            handicap: u.handicap,
            rounds_played: store.rounds_for(&u.id).len() as u32,
        })
        .collect();
    writer.write(
        &paths::list_path(root, ResourceGroup::Users),
        &ListResource::new(summaries, generated_at),
    )?;
    for user in &users {
        let mut rounds: Vec<&Round> = store.rounds_for(&user.id).iter().collect();
        sort_newest_first(&mut rounds);
        let detail = UserDetail {
            user: redact_user(user),
            statistics: statistics.get(&user.id).cloned(),
            rounds: rounds.into_iter().map(RoundSummary::from).collect(),
            timestamp: generated_at,
        };
        writer.write(&paths::detail_path(root, ResourceGroup::Users, &user.id), &detail)?;
    }

    // rounds
    let mut rounds: Vec<&Round> = store.rounds_by_user.values().flatten().collect();
    sort_newest_first(&mut rounds);
    writer.write(
        &paths::list_path(root, ResourceGroup::Rounds),
        &ListResource::new(
            rounds.iter().map(|r| RoundSummary::from(*r)).collect(),
            generated_at,
        ),
    )?;
    for round in &rounds {
        writer.write(
            &paths::detail_path(root, ResourceGroup::Rounds, &round.id),
            &Detail {
                record: *round,
                timestamp: generated_at,
            },
        )?;
    }

    // courses
    let mut courses: Vec<_> = store.courses.iter().collect();
    courses.sort_by(|a, b| a.id.cmp(&b.id));
    writer.write(
        &paths::list_path(root, ResourceGroup::Courses),
        &ListResource::new(
            courses
                .iter()
                .map(|c| CourseSummary {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    location: c.location.clone(),
                    hole_count: c.holes.len(),
                    par: c.par_total(),
                })
                .collect(),
            generated_at,
        ),
    )?;
    for course in &courses {
        writer.write(
            &paths::detail_path(root, ResourceGroup::Courses, &course.id),
            &Detail {
                record: *course,
                timestamp: generated_at,
            },
        )?;
    }

    // statistics (already keyed by user id in order)
    writer.write(
        &paths::list_path(root, ResourceGroup::Statistics),
        &ListResource::new(
            statistics
                .values()
                .map(|s| StatisticsSummary {
                    user_id: s.user_id.clone(),
                    rounds_played: s.rounds_played,
                    avg_score: s.avg_score,
                    best_score: s.best_score,
                })
                .collect(),
            generated_at,
        ),
    )?;
    for (user_id, stats) in statistics {
        writer.write(
            &paths::detail_path(root, ResourceGroup::Statistics, user_id),
            &Detail {
                record: stats,
                timestamp: generated_at,
            },
        )?;
    }

    log::info!(
        "wrote {} resources under {}",
        writer.written,
        root.display()
    );
    Ok(MaterializeReport {
        resources_written: writer.written,
    })
}

pub fn root_index(generated_at: Timestamp) -> RootIndex {
    RootIndex {
        name: API_NAME.to_string(),
        resources: ResourceGroup::ALL
            .iter()
            .map(|&group| ResourceEntry {
                name: group.as_str().to_string(),
                path: paths::relative_list_path(group),
                description: group.description().to_string(),
            })
            .collect(),
        timestamp: generated_at,
    }
}

/// Copy of `user` safe to publish: credential-like and reserved extra
/// fields are dropped.
pub fn redact_user(user: &User) -> User {
    let mut clean = user.clone();
    clean.extra.retain(|key, _| {
        let keep = !is_credential_key(key) && !RESERVED_USER_KEYS.contains(&key.as_str());
        if !keep {
            log::debug!("dropping field {key} from user {}", user.id);
        }
        keep
    });
    clean
}

fn is_credential_key(key: &str) -> bool {
    let normalized: String = key
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    normalized == "pin"
        || normalized.ends_with("key")
        || normalized.ends_with("keys")
        || CREDENTIAL_FRAGMENTS.iter().any(|f| normalized.contains(f))
}

/// Date descending; same-day rounds by id ascending.
fn sort_newest_first(rounds: &mut [&Round]) {
    rounds.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
}

#[derive(Debug, Default)]
struct ResourceWriter {
    written: usize,
}

impl ResourceWriter {
    fn write<T: Serialize>(&mut self, path: &Path, doc: &T) -> Result<(), PipelineError> {
        let mut json = serde_json::to_string_pretty(doc).map_err(|e| {
            PipelineError::new(
                "E2103",
                format!("failed to serialize {}: {e}", path.display()),
            )
            .with_path(path.display().to_string())
        })?;
        json.push('\n');
        fs::write(path, json).map_err(|e| {
            PipelineError::new(
                "E2102",
                format!("failed to write {}: {e}", path.display()),
            )
            .with_path(path.display().to_string())
        })?;
        self.written += 1;
        Ok(())
    }
}
