use std::fmt;

use rand::distr::Alphanumeric;
use rand::Rng;

use super::StoreError;

pub const PROJECTS: &str = "projects";
pub const ISSUES: &str = "issues";
pub const RESOLUTIONS: &str = "resolutions";

const AUTO_ID_LEN: usize = 20;

/// Path to a collection, e.g. `projects` or `projects/<pid>/issues`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn doc(&self, id: impl Into<String>) -> DocPath {
        DocPath {
            collection: self.clone(),
            id: id.into(),
        }
    }

    /// A child document whose id is allocated here rather than chosen by the caller.
    pub fn auto_doc(&self) -> DocPath {
        self.doc(auto_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path to a single document: its collection plus its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    collection: CollectionPath,
    id: String,
}

impl DocPath {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> &CollectionPath {
        &self.collection
    }

    /// Sub-collection nested under this document.
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}/{}", self.collection, self.id, name))
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if is_valid_id(&self.id) {
            Ok(())
        } else {
            Err(StoreError::InvalidPath(self.to_string()))
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && !id.contains('/')
}

pub fn auto_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

pub fn projects() -> CollectionPath {
    CollectionPath::root(PROJECTS)
}

pub fn issues(project_id: &str) -> CollectionPath {
    projects().doc(project_id).collection(ISSUES)
}

pub fn resolutions(project_id: &str, issue_id: &str) -> CollectionPath {
    issues(project_id).doc(issue_id).collection(RESOLUTIONS)
}
