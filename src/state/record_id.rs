use std::fmt;

/// Opaque identifier of one contract on the portal
///
/// Ids are stable across runs and double as file names, so path separators
/// and parent references are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a record id from raw text
    ///
    /// Surrounding whitespace is trimmed. Returns `None` for empty ids and for
    /// ids that cannot be used as a single file name.
    pub fn new(raw: &str) -> Option<Self> {
        let id = raw.trim();
        if id.is_empty() || id == "." || id == ".." {
            return None;
        }
        if id.contains(['/', '\\', '\0']) {
            return None;
        }
        Some(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the downloaded document
    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
