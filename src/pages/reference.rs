//! Lazy page references.
//!
//! A reference names a page without compiling it. Templates registered at
//! startup carry one as their page marker; the loader turns it into a
//! compiled descriptor on first use.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a page by area and path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageReference {
    /// Area the page belongs to, if any.
    pub area: Option<String>,
    /// Path relative to the pages root (e.g., "/Index.page").
    pub relative_path: String,
    /// Path without extension, used as the page identity in links.
    pub view_engine_path: String,
}

impl PageReference {
    /// Create a reference from a relative path.
    /// The view-engine path is derived by stripping the extension.
    pub fn new(relative_path: impl Into<String>) -> Self {
        let relative_path = relative_path.into();
        let view_engine_path = match relative_path.rfind('.') {
            Some(dot) if dot > relative_path.rfind('/').unwrap_or(0) => relative_path[..dot].to_string(),
            _ => relative_path.clone(),
        };
        Self {
            area: None,
            relative_path,
            view_engine_path,
        }
    }

    /// Place the page in an area.
    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }
}

impl fmt::Display for PageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.area {
            Some(area) => write!(f, "{}:{}", area, self.view_engine_path),
            None => write!(f, "{}", self.view_engine_path),
        }
    }
}
