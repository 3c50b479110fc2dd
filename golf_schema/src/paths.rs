//! Addressing for the materialized API tree.
//!
//! Writers and readers both go through these helpers, so `{group}/index.json`
//! and `{group}/{id}.json` are spelled out in exactly one place.

use std::path::{Path, PathBuf};

pub const INDEX_FILE: &str = "index.json";
const INDEX_STEM: &str = "index";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceGroup {
    Users,
    Rounds,
    Courses,
    Statistics,
}

impl ResourceGroup {
    pub const ALL: [ResourceGroup; 4] = [
        ResourceGroup::Users,
        ResourceGroup::Rounds,
        ResourceGroup::Courses,
        ResourceGroup::Statistics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceGroup::Users => "users",
            ResourceGroup::Rounds => "rounds",
            ResourceGroup::Courses => "courses",
            ResourceGroup::Statistics => "statistics",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ResourceGroup::Users => "Registered players with their statistics and round history",
            ResourceGroup::Rounds => "Recorded rounds, most recent first",
            ResourceGroup::Courses => "Courses with their hole layouts",
            ResourceGroup::Statistics => "Computed performance statistics per player",
        }
    }
}

impl std::fmt::Display for ResourceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `id` can be used verbatim as a file stem in the tree.
pub fn is_addressable_id(id: &str) -> bool {
    !id.is_empty()
        && id != INDEX_STEM
        && !id.starts_with('.')
        && !id.chars().any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control())
}

pub fn root_index_path(root: &Path) -> PathBuf {
    root.join(INDEX_FILE)
}

pub fn group_dir(root: &Path, group: ResourceGroup) -> PathBuf {
    root.join(group.as_str())
}

pub fn list_path(root: &Path, group: ResourceGroup) -> PathBuf {
    group_dir(root, group).join(INDEX_FILE)
}

pub fn detail_path(root: &Path, group: ResourceGroup, id: &str) -> PathBuf {
    group_dir(root, group).join(format!("{id}.json"))
}

/// Path of a group's list resource relative to the tree root, `/`-separated.
pub fn relative_list_path(group: ResourceGroup) -> String {
    format!("{}/{INDEX_FILE}", group.as_str())
}
