use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlaceParseError;

/// Identifies the kind of page that should be active in a region
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Names a slot inside a frame that hosts one child page
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One step of a view path: which page should be active in which region
/// of the parent frame
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewPathNode {
    pub region: RegionId,
    pub page_id: PageId,
}

impl ViewPathNode {
    pub fn new(region: impl Into<RegionId>, page_id: impl Into<PageId>) -> Self {
        Self {
            region: region.into(),
            page_id: page_id.into(),
        }
    }
}

/// A location in the application that the user can navigate to.
///
/// The view path is ordered from the root frame down to the innermost
/// page. Parameters refine the place without changing which pages are
/// shown (e.g. the database a grid is filtered on).
///
/// Places round-trip through history tokens of the form
/// `region:page/region:page?key=value&key=value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Place {
    view_path: Vec<ViewPathNode>,
    params: BTreeMap<String, String>,
}

impl Place {
    pub fn new(view_path: Vec<ViewPathNode>) -> Self {
        Self {
            view_path,
            params: BTreeMap::new(),
        }
    }

    /// Builder-style parameter setter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn view_path(&self) -> &[ViewPathNode] {
        &self.view_path
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// The innermost page of the view path
    pub fn leaf(&self) -> Option<&ViewPathNode> {
        self.view_path.last()
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.view_path.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}:{}", node.region, node.page_id)?;
        }
        for (i, (key, value)) in self.params.iter().enumerate() {
            f.write_str(if i == 0 { "?" } else { "&" })?;
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

impl FromStr for Place {
    type Err = PlaceParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (path, query) = match token.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (token, None),
        };

        let mut view_path = Vec::new();
        if !path.is_empty() {
            for (position, node) in path.split('/').enumerate() {
                if node.is_empty() {
                    return Err(PlaceParseError::EmptyNode(position));
                }
                let (region, page) = node
                    .split_once(':')
                    .ok_or_else(|| PlaceParseError::MissingSeparator(node.to_string()))?;
                if region.is_empty() || page.is_empty() {
                    return Err(PlaceParseError::EmptyComponent(node.to_string()));
                }
                view_path.push(ViewPathNode::new(region, page));
            }
        }

        let mut params = BTreeMap::new();
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            for pair in query.split('&') {
                match pair.split_once('=') {
                    Some((key, value)) if !key.is_empty() => {
                        params.insert(key.to_string(), value.to_string());
                    }
                    _ => return Err(PlaceParseError::MalformedParameter(pair.to_string())),
                }
            }
        }

        Ok(Self { view_path, params })
    }
}
