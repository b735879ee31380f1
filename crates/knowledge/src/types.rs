use serde::{Deserialize, Serialize};

/// One knowledge base entry
///
/// `input` is the text that gets embedded, `output` is what the user sees on
/// a match. Identity is the record's position in its store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Intent label
    pub instruction: String,

    /// Example customer query
    pub input: String,

    /// Answer served on a match
    pub output: String,
}

impl Record {
    /// Create a new record
    pub fn new(
        instruction: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            instruction: instruction.into(),
            input: input.into(),
            output: output.into(),
        }
    }
}
