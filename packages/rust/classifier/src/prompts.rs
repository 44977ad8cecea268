//! Prompt templates and the verdict shapes they ask for.
//!
//! Every template ends with an explicit JSON contract so the response can be
//! deserialized straight into the matching verdict type.

use serde::Deserialize;

/// Answer to the relevance prompt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelevanceVerdict {
    pub is_relevant: bool,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub topic: String,
}

impl RelevanceVerdict {
    /// Relevant and naming at least one subject.
    pub fn accepts(&self) -> bool {
        self.is_relevant && self.subjects.iter().any(|s| !s.trim().is_empty())
    }
}

/// Answer to the media judgment prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MediaVerdict {
    pub accept: bool,
}

/// Answer to the composition prompt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedCopy {
    pub title: String,
    pub short_text: String,
}

/// Ask whether a feed entry is worth tracking.
pub fn relevance_prompt(criteria: &str, title: &str, summary: &str) -> String {
    format!(
        "You screen news articles for a publishing pipeline.\n\
         \n\
         Criteria:\n{criteria}\n\
         \n\
         Article title: {title}\n\
         Article summary: {summary}\n\
         \n\
         Decide whether the article meets the criteria. If it does, list the \
         named people or entities it is about and give a topic label of at \
         most 20 characters.\n\
         \n\
         Respond with JSON only:\n\
         {{\"is_relevant\": true or false, \"subjects\": [\"name\", ...], \"topic\": \"label\"}}"
    )
}

/// Ask whether an image prominently shows the article's subjects.
pub fn media_prompt(subjects: &[String], title: &str) -> String {
    let names = subjects.join(", ");
    format!(
        "This image was found on a news article titled \"{title}\" about: {names}.\n\
         \n\
         Accept the image only if a person is clearly and prominently shown \
         (a face or upper body filling a meaningful part of the frame). Reject \
         logos, banners, advertisements, text-only graphics, screenshots of \
         user interfaces, tiny thumbnails, and crowd shots with no clear subject.\n\
         \n\
         Respond with JSON only:\n\
         {{\"accept\": true or false}}"
    )
}

/// Ask for a headline and a short promotional text.
pub fn composition_prompt(
    subjects: &[String],
    topic: &str,
    text: &str,
    max_short_text_chars: usize,
) -> String {
    let names = subjects.join(", ");
    format!(
        "Write presentation copy for a news post.\n\
         \n\
         People: {names}\n\
         Topic: {topic}\n\
         Article text:\n{text}\n\
         \n\
         Produce:\n\
         - title: a punchy headline that names the people involved\n\
         - short_text: a teaser of at most {max_short_text_chars} characters that \
         makes readers want to open the full story, without inventing facts\n\
         \n\
         Respond with JSON only:\n\
         {{\"title\": \"...\", \"short_text\": \"...\"}}"
    )
}
