//! Test generator — scripted `ContentGenerator` for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use storyloom_generation::error::GenerationError;
use storyloom_generation::generator::{
    ChapterRequest, ContentGenerator, GeneratedChapter, GeneratedImage,
};

/// A generator whose chapters are `"Unlocked chapter {n} of {total}."`.
///
/// Requests whose context contains a configured marker fail. Illustrations
/// are a single small PNG unless disabled.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    failing_markers: Vec<String>,
    images_disabled: bool,
    requests: Mutex<Vec<ChapterRequest>>,
    image_prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// Creates a generator that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every chapter request whose context contains `marker`.
    #[must_use]
    pub fn failing_when_context_contains(mut self, marker: &str) -> Self {
        self.failing_markers.push(marker.to_owned());
        self
    }

    /// Returns no illustrations.
    #[must_use]
    pub fn without_images(mut self) -> Self {
        self.images_disabled = true;
        self
    }

    /// Every chapter request received, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<ChapterRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Every illustration prompt received, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn image_prompts(&self) -> Vec<String> {
        self.image_prompts.lock().unwrap().clone()
    }

    /// The illustration returned when images are enabled.
    #[must_use]
    pub fn sample_image() -> GeneratedImage {
        GeneratedImage {
            data: b"png!".to_vec(),
            mime_type: "image/png".into(),
        }
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate_chapter(
        &self,
        request: &ChapterRequest,
    ) -> Result<GeneratedChapter, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        if self
            .failing_markers
            .iter()
            .any(|marker| request.context.contains(marker.as_str()))
        {
            return Err(GenerationError::Api {
                status: 503,
                message: "model overloaded".into(),
            });
        }
        request.validate()?;
        Ok(GeneratedChapter {
            text: format!(
                "Unlocked chapter {} of {}.",
                request.chapter_number, request.total_chapters
            ),
            chapter_number: request.chapter_number,
            total_chapters: request.total_chapters,
        })
    }

    async fn generate_image(&self, prompt: &str) -> Vec<GeneratedImage> {
        self.image_prompts.lock().unwrap().push(prompt.to_owned());
        if self.images_disabled {
            Vec::new()
        } else {
            vec![Self::sample_image()]
        }
    }
}
