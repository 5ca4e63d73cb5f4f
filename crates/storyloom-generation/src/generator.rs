//! The generator seam and its value types.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::GenerationError;

/// Input for one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRequest {
    /// The story so far.
    pub context: String,
    /// Chapters the story will have once complete.
    pub total_chapters: u32,
    /// Number of the chapter to write.
    pub chapter_number: u32,
    /// Top audience comment used as steering context; may be empty.
    pub audience_hint: String,
}

impl ChapterRequest {
    /// Checks chapter numbering.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::InvalidRequest` if the total is zero or the
    /// chapter number is outside `1..=total_chapters`.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.total_chapters == 0 {
            return Err(GenerationError::InvalidRequest("total_chapters is zero".into()));
        }
        if self.chapter_number == 0 || self.chapter_number > self.total_chapters {
            return Err(GenerationError::InvalidRequest(format!(
                "chapter {} outside 1..={}",
                self.chapter_number, self.total_chapters
            )));
        }
        Ok(())
    }
}

/// A chapter the service produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedChapter {
    /// Chapter text, never empty.
    pub text: String,
    /// Number of the chapter.
    pub chapter_number: u32,
    /// Chapters the story will have once complete.
    pub total_chapters: u32,
}

/// One generated illustration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
}

impl GeneratedImage {
    /// Encodes the image as a `data:` URI for storage in a text field.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

/// Narrative-chapter and illustration generation.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Writes the requested chapter.
    async fn generate_chapter(
        &self,
        request: &ChapterRequest,
    ) -> Result<GeneratedChapter, GenerationError>;

    /// Illustrates `prompt`. Failures are logged and yield an empty list.
    async fn generate_image(&self, prompt: &str) -> Vec<GeneratedImage>;
}

impl std::fmt::Debug for dyn ContentGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn ContentGenerator")
    }
}
