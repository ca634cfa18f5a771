//! What a sweep should delete

/// Tables and containers named on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepRequest {
    pub tables: Vec<String>,
    pub containers: Vec<String>,
    /// Stop the emulator once deletion has finished
    pub stop_after: bool,
}

impl SweepRequest {
    pub fn new(tables: Option<&str>, containers: Option<&str>) -> Self {
        Self {
            tables: tables.map(parse_resource_list).unwrap_or_default(),
            containers: containers.map(parse_resource_list).unwrap_or_default(),
            stop_after: false,
        }
    }

    pub fn with_stop_after(mut self, stop_after: bool) -> Self {
        self.stop_after = stop_after;
        self
    }

    /// Nothing to delete
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.containers.is_empty()
    }
}

/// Split a resource list on commas when it has any, otherwise on whitespace.
///
/// Entries are trimmed and blanks dropped; order is preserved.
pub fn parse_resource_list(raw: &str) -> Vec<String> {
    let entries: Vec<&str> = if raw.contains(',') {
        raw.split(',').collect()
    } else {
        raw.split_whitespace().collect()
    };

    entries
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
