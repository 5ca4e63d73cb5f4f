//! Story initialization: chapter 1, registration and the first registry entry.

use storyloom_core::error::DomainError;
use storyloom_core::story_id::StoryId;
use storyloom_generation::generator::{ChapterRequest, GeneratedImage};
use storyloom_stories::domain::story::{Chapter, Story};
use tracing::{info, instrument, warn};

use super::orchestrator::Orchestrator;
use crate::domain::commands::InitializeStory;

/// Handles the `InitializeStory` command: generates chapter 1 from the seed
/// prompt, writes the story and registers it for daily unlocks.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank title, a zero chapter count
/// or an invalid post id. Returns `DomainError::Infrastructure` if chapter 1
/// cannot be generated, in which case nothing is written, or the store's error
/// if the story cannot be written or registered.
#[instrument(
    skip_all,
    fields(correlation_id = %command.correlation_id, post_id = %command.post_id)
)]
pub async fn initialize_story(
    command: &InitializeStory,
    orchestrator: &Orchestrator,
) -> Result<(StoryId, Story), DomainError> {
    let story_id = StoryId::parse(&command.post_id)?;
    if command.title.trim().is_empty() {
        return Err(DomainError::Validation("story title must not be blank".into()));
    }
    if command.total_chapters == 0 {
        return Err(DomainError::Validation("totalChapters must be at least 1".into()));
    }

    let generator = orchestrator.generator();
    let request = ChapterRequest {
        context: command.seed_prompt.clone(),
        total_chapters: command.total_chapters,
        chapter_number: 1,
        audience_hint: String::new(),
    };
    let generated = generator
        .generate_chapter(&request)
        .await
        .map_err(|e| DomainError::Infrastructure(format!("chapter 1 generation failed: {e}")))?;

    let image = generator
        .generate_image(&generated.text)
        .await
        .first()
        .map(GeneratedImage::to_data_uri)
        .unwrap_or_default();
    if image.is_empty() {
        warn!(story_id = %story_id, "chapter 1 stored without illustration");
    }

    let now = orchestrator.clock().now();
    let story = Story::new(
        command.title.trim(),
        command.total_chapters,
        Chapter {
            content: generated.text,
            image,
            top_comment: String::new(),
            unlocked_at: now,
        },
        now,
    )?;

    orchestrator.stories().set(&story_id, &story).await?;
    let newly_registered = orchestrator.registry().register(&story_id).await?;
    if let Err(e) = orchestrator
        .registry()
        .upsert(&story_id, story.summary())
        .await
    {
        warn!(story_id = %story_id, error = %e, "registry entry deferred to the next rebuild");
    }

    info!(
        story_id = %story_id,
        total_chapters = story.total_chapters(),
        newly_registered,
        "story initialized"
    );
    Ok((story_id, story))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use storyloom_test_support::{
        FailingKvStore, FixedClock, InMemoryCommentSource, InMemoryKvStore, RecordingScheduler,
        ScriptedGenerator,
    };
    use uuid::Uuid;

    use super::*;
    use crate::application::orchestrator::OrchestratorConfig;

    fn orchestrator_with(
        kv: Arc<dyn storyloom_core::kv::KeyValueStore>,
        generator: ScriptedGenerator,
    ) -> Orchestrator {
        Orchestrator::new(
            kv,
            Arc::new(generator),
            Arc::new(InMemoryCommentSource::new()),
            Arc::new(RecordingScheduler::new()),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())),
            OrchestratorConfig::default(),
        )
    }

    fn command(post_id: &str, title: &str, total_chapters: u32) -> InitializeStory {
        InitializeStory {
            correlation_id: Uuid::new_v4(),
            post_id: post_id.into(),
            title: title.into(),
            total_chapters,
            seed_prompt: "A cartographer maps a city that rearranges itself.".into(),
        }
    }

    #[tokio::test]
    async fn test_initialize_story_writes_registers_and_lists() {
        // Arrange
        let kv = Arc::new(InMemoryKvStore::new());
        let orchestrator = orchestrator_with(kv.clone(), ScriptedGenerator::new());

        // Act
        let (story_id, story) =
            initialize_story(&command("t3_Map1", "Shifting Streets", 4), &orchestrator)
                .await
                .unwrap();

        // Assert
        assert_eq!(story_id.as_str(), "map1");
        assert_eq!(story.current_chapter(), 1);
        assert_eq!(story.chapters()[&1].content, "Unlocked chapter 1 of 4.");
        assert!(!story.chapters()[&1].image.is_empty());
        assert!(kv.contains("story:map1"));
        assert_eq!(
            orchestrator.registry().story_ids().await.unwrap(),
            [story_id.clone()]
        );
        let listed = orchestrator.registry().list().await.unwrap();
        assert_eq!(listed.get(&story_id).unwrap().title, "Shifting Streets");
    }

    #[tokio::test]
    async fn test_initialize_story_rejects_zero_chapters_and_blank_title() {
        let orchestrator =
            orchestrator_with(Arc::new(InMemoryKvStore::new()), ScriptedGenerator::new());

        let zero = initialize_story(&command("abc", "Title", 0), &orchestrator).await;
        let blank = initialize_story(&command("abc", "   ", 3), &orchestrator).await;
        let bad_id = initialize_story(&command("a b", "Title", 3), &orchestrator).await;

        assert!(matches!(zero, Err(DomainError::Validation(_))));
        assert!(matches!(blank, Err(DomainError::Validation(_))));
        assert!(matches!(bad_id, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_generation_failure_writes_nothing() {
        // Arrange
        let kv = Arc::new(InMemoryKvStore::new());
        let orchestrator = orchestrator_with(
            kv.clone(),
            ScriptedGenerator::new().failing_when_context_contains("cartographer"),
        );

        // Act
        let result = initialize_story(&command("abc", "Title", 3), &orchestrator).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
        assert!(kv.writes().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_returned() {
        let orchestrator = orchestrator_with(Arc::new(FailingKvStore), ScriptedGenerator::new());

        let result = initialize_story(&command("abc", "Title", 3), &orchestrator).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
