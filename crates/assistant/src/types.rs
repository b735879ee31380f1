use serde::Serialize;

/// Which tier produced an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    /// Confident dataset match
    Dataset,
    /// Generative fallback (or its canned reply when unavailable)
    Generated,
    /// Nothing to offer
    NoAnswer,
}

/// Reply to one user query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub source: AnswerSource,
    pub text: String,
    /// Similarity of the nearest dataset record (0.0 when none)
    pub similarity: f32,
}

impl Answer {
    pub fn new(source: AnswerSource, text: impl Into<String>, similarity: f32) -> Self {
        Self {
            source,
            text: text.into(),
            similarity,
        }
    }

    /// Text for display, labeled with its tier
    pub fn render(&self) -> String {
        match self.source {
            AnswerSource::Dataset => format!("**[Dataset Match]**\n{}", self.text),
            AnswerSource::Generated => format!("**[SLM Match]**\n{}", self.text),
            AnswerSource::NoAnswer => self.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_labels() {
        assert_eq!(
            Answer::new(AnswerSource::Dataset, "Rs. 1 lakh.", 1.0).render(),
            "**[Dataset Match]**\nRs. 1 lakh."
        );
        assert_eq!(
            Answer::new(AnswerSource::Generated, "Maybe.", 0.3).render(),
            "**[SLM Match]**\nMaybe."
        );
        assert_eq!(Answer::new(AnswerSource::NoAnswer, "Sorry.", 0.0).render(), "Sorry.");
    }
}
