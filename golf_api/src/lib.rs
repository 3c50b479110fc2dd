//! Read access to a published API tree, addressed the same way the
//! pipeline writes it.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use golf_schema::{
    paths::{self, ResourceGroup},
    Course, Detail, ListResource, Round, RoundSummary, RootIndex, Statistics, UserDetail,
    UserSummary,
};
use serde::de::DeserializeOwned;

pub struct ApiTree {
    root: PathBuf,
}

impl ApiTree {
    pub fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        let index = paths::root_index_path(&root);
        if !index.is_file() {
            anyhow::bail!("not an API tree (missing {})", index.display());
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> anyhow::Result<RootIndex> {
        load_json_from_path(paths::root_index_path(&self.root))
    }

    pub fn users(&self) -> anyhow::Result<ListResource<UserSummary>> {
        load_json_from_path(paths::list_path(&self.root, ResourceGroup::Users))
    }

    pub fn user(&self, id: &str) -> anyhow::Result<UserDetail> {
        self.detail(ResourceGroup::Users, id)
    }

    pub fn rounds(&self) -> anyhow::Result<ListResource<RoundSummary>> {
        load_json_from_path(paths::list_path(&self.root, ResourceGroup::Rounds))
    }

    pub fn round(&self, id: &str) -> anyhow::Result<Detail<Round>> {
        self.detail(ResourceGroup::Rounds, id)
    }

    pub fn course(&self, id: &str) -> anyhow::Result<Detail<Course>> {
        self.detail(ResourceGroup::Courses, id)
    }

    /// `None` when the user has no rounds and so no statistics resource.
    pub fn statistics(&self, user_id: &str) -> anyhow::Result<Option<Detail<Statistics>>> {
        let path = paths::detail_path(&self.root, ResourceGroup::Statistics, user_id);
        if !path.exists() {
            return Ok(None);
        }
        load_json_from_path(path).map(Some)
    }

    fn detail<T: DeserializeOwned>(&self, group: ResourceGroup, id: &str) -> anyhow::Result<T> {
        if !paths::is_addressable_id(id) {
            anyhow::bail!("invalid {group} id: {id:?}");
        }
        load_json_from_path(paths::detail_path(&self.root, group, id))
    }
}

pub fn load_json_from_path<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("failed to read resource: {}", path.display()))?;
    let doc: T = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse resource json: {}", path.display()))?;
    Ok(doc)
}
