use serde::{Deserialize, Serialize};

/// Section header printed above database-backed graphs by `logseq list`.
pub const DB_GRAPHS_HEADER: &str = "DB Graphs";
/// Section header printed above file-backed graphs by `logseq list`.
pub const FILE_GRAPHS_HEADER: &str = "File Graphs";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphName(pub String);

impl GraphName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GraphName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GraphName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Pulls graph names out of the plain-text graph listing.
///
/// A line counts as a name when it is non-empty after trimming, contains no
/// `:` and is not one of the two section headers. Names keep their listing
/// order and are not de-duplicated.
pub fn extract_graph_names(listing: &str) -> Vec<GraphName> {
    listing
        .split('\n')
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.contains(':')
                && *line != DB_GRAPHS_HEADER
                && *line != FILE_GRAPHS_HEADER
        })
        .map(GraphName::from)
        .collect()
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
