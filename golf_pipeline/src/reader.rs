use std::{
    collections::{BTreeMap, HashSet},
    fs, io,
    path::{Path, PathBuf},
};

use golf_schema::{paths::is_addressable_id, Course, Round, User};
use serde::de::DeserializeOwned;

use crate::PipelineError;

pub const USERS_DIR: &str = "users";
pub const COURSES_DIR: &str = "courses";
pub const ROUNDS_DIR: &str = "rounds";

/// Everything read from the record store, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    pub users: Vec<User>,
    pub courses: Vec<Course>,
    pub rounds_by_user: BTreeMap<String, Vec<Round>>,
}

impl RecordStore {
    pub fn rounds_for(&self, user_id: &str) -> &[Round] {
        self.rounds_by_user
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn round_count(&self) -> usize {
        self.rounds_by_user.values().map(Vec::len).sum()
    }

    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }
}

pub fn load_record_store(root: impl AsRef<Path>) -> Result<RecordStore, PipelineError> {
    let root = root.as_ref();

    let users: Vec<(PathBuf, User)> = read_records(&root.join(USERS_DIR))?;
    let mut user_ids = HashSet::new();
    for (path, user) in &users {
        check_id(&user.id, path)?;
        if !user_ids.insert(user.id.clone()) {
            return Err(duplicate_id("user", &user.id, path));
        }
    }

    let courses: Vec<(PathBuf, Course)> = read_records(&root.join(COURSES_DIR))?;
    let mut course_ids = HashSet::new();
    for (path, course) in &courses {
        check_id(&course.id, path)?;
        if !course_ids.insert(course.id.clone()) {
            return Err(duplicate_id("course", &course.id, path));
        }
        validate_course(course, path)?;
    }

    let rounds_root = root.join(ROUNDS_DIR);
    let mut round_ids = HashSet::new();
    let mut rounds_by_user = BTreeMap::new();
    for (_, user) in &users {
        let rounds: Vec<(PathBuf, Round)> = read_records(&rounds_root.join(&user.id))?;
        let mut kept = Vec::with_capacity(rounds.len());
        for (path, round) in rounds {
            validate_round(&round, &user.id, &path)?;
            if !round_ids.insert(round.id.clone()) {
                return Err(duplicate_id("round", &round.id, &path));
            }
            if !course_ids.contains(&round.course_id) {
                log::warn!(
                    "round {} references unknown course {} ({})",
                    round.id,
                    round.course_id,
                    path.display()
                );
            }
            kept.push(round);
        }
        rounds_by_user.insert(user.id.clone(), kept);
    }

    warn_orphan_round_dirs(&rounds_root, &user_ids)?;

    Ok(RecordStore {
        users: users.into_iter().map(|(_, u)| u).collect(),
        courses: courses.into_iter().map(|(_, c)| c).collect(),
        rounds_by_user,
    })
}

fn read_records<T: DeserializeOwned>(dir: &Path) -> Result<Vec<(PathBuf, T)>, PipelineError> {
    let mut out = Vec::new();
    for path in list_json_files(dir)? {
        let bytes = fs::read(&path).map_err(|e| {
            PipelineError::new(
                "E2001",
                format!("failed to read record {}: {e}", path.display()),
            )
            .with_path(path.display().to_string())
        })?;
        let record: T = serde_json::from_slice(&bytes).map_err(|e| {
            PipelineError::new(
                "E1001",
                format!("invalid record json {}: {e}", path.display()),
            )
            .with_path(path.display().to_string())
        })?;
        out.push((path, record));
    }
    Ok(out)
}

/// `.json` files directly under `dir`, sorted by file name. A missing
/// directory is an empty group.
fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let list_err = |e: io::Error| {
        PipelineError::new(
            "E2002",
            format!("failed to list directory {}: {e}", dir.display()),
        )
        .with_path(dir.display().to_string())
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(list_err(e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(list_err)?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn warn_orphan_round_dirs(rounds_root: &Path, user_ids: &HashSet<String>) -> Result<(), PipelineError> {
    let entries = match fs::read_dir(rounds_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(PipelineError::new(
                "E2002",
                format!("failed to list directory {}: {e}", rounds_root.display()),
            )
            .with_path(rounds_root.display().to_string()))
        }
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.path().is_dir() && !user_ids.contains(&name) {
            log::warn!("skipping rounds for unknown user {name}");
        }
    }
    Ok(())
}

fn check_id(id: &str, path: &Path) -> Result<(), PipelineError> {
    if is_addressable_id(id) {
        return Ok(());
    }
    Err(PipelineError::new(
        "E3001",
        format!("invalid id {id:?} in {}", path.display()),
    )
    .with_path(path.display().to_string())
    .with_record_id(id))
}

fn duplicate_id(what: &str, id: &str, path: &Path) -> PipelineError {
    PipelineError::new(
        "E3002",
        format!("duplicate {what} id {id:?} in {}", path.display()),
    )
    .with_path(path.display().to_string())
    .with_record_id(id)
}

fn validate_course(course: &Course, path: &Path) -> Result<(), PipelineError> {
    let invalid = |detail: String| {
        PipelineError::new(
            "E3003",
            format!("invalid hole layout for course {}: {detail}", course.id),
        )
        .with_path(path.display().to_string())
        .with_record_id(course.id.clone())
    };

    let hole_count = course.holes.len() as u32;
    let mut seen = HashSet::new();
    for hole in &course.holes {
        if hole.hole_number == 0 || hole.hole_number > hole_count {
            return Err(invalid(format!(
                "hole number {} outside 1..={hole_count}",
                hole.hole_number
            )));
        }
        if !seen.insert(hole.hole_number) {
            return Err(invalid(format!("hole number {} repeated", hole.hole_number)));
        }
        if !(3..=5).contains(&hole.par) {
            return Err(invalid(format!("hole {} has par {}", hole.hole_number, hole.par)));
        }
        if hole.distance == 0 {
            return Err(invalid(format!("hole {} has zero distance", hole.hole_number)));
        }
    }
    Ok(())
}

fn validate_round(round: &Round, user_id: &str, path: &Path) -> Result<(), PipelineError> {
    check_id(&round.id, path)?;

    if round.user_id != user_id {
        return Err(PipelineError::new(
            "E3004",
            format!(
                "round {} belongs to user {} but is filed under {user_id}",
                round.id, round.user_id
            ),
        )
        .with_path(path.display().to_string())
        .with_record_id(round.id.clone()));
    }

    // A hole may appear more than once; every entry is scored.
    for result in &round.hole_results {
        let problem = if result.hole_number == 0 {
            Some("hole number 0".to_string())
        } else if result.score < 1 {
            Some(format!("hole {} has score {}", result.hole_number, result.score))
        } else {
            None
        };
        if let Some(problem) = problem {
            return Err(PipelineError::new(
                "E3005",
                format!("invalid hole result in round {}: {problem}", round.id),
            )
            .with_path(path.display().to_string())
            .with_record_id(round.id.clone()));
        }
    }
    Ok(())
}
