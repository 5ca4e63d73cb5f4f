//! The daily unlock cycle and its batch continuations.
//!
//! A daily trigger rebuilds the registry, splits it into batches and runs
//! batch 1 in the same invocation. Every batch except the last schedules the
//! next one as a deferred `unlock_batch` job. The plan is fixed when the cycle
//! starts and travels with the continuations, so stories registered later
//! wait for the next cycle.
//!
//! Stories commit independently. A failure for one story is recorded in the
//! step's [`StepReport`] and never affects the others.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use storyloom_comments::harvester::CommentHarvester;
use storyloom_comments::source::CommentSource;
use storyloom_core::clock::Clock;
use storyloom_core::error::DomainError;
use storyloom_core::kv::{DEFAULT_TTL, KeyValueStore};
use storyloom_core::message::{BatchContinuation, TriggerMessage};
use storyloom_core::scheduler::{ScheduledJob, Scheduler};
use storyloom_core::story_id::StoryId;
use storyloom_generation::generator::{ChapterRequest, ContentGenerator, GeneratedImage};
use storyloom_stories::application::registry::StoryRegistry;
use storyloom_stories::application::story_store::StoryStore;
use storyloom_stories::domain::story::Chapter;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::batch::{BatchPlan, DEFAULT_BATCH_SIZE};
use crate::domain::report::{
    FailureStage, ScheduledContinuation, SkipReason, StepReport, StoryOutcome,
};
use crate::domain::state::CycleState;

/// Default pause between batches.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(60);

/// Name continuation jobs are scheduled under.
pub const CONTINUATION_JOB: &str = "unlock_batch";

/// Tunables for the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Stories per batch.
    pub batch_size: usize,
    /// Pause between a batch and its continuation.
    pub batch_delay: Duration,
    /// Expiry renewed on every write.
    pub story_ttl: Duration,
    /// Scheduler job name for continuations.
    pub continuation_job: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
            story_ttl: DEFAULT_TTL,
            continuation_job: CONTINUATION_JOB.to_owned(),
        }
    }
}

/// Drives unlock cycles over the story store and its collaborators.
#[derive(Debug)]
pub struct Orchestrator {
    stories: StoryStore,
    registry: StoryRegistry,
    generator: Arc<dyn ContentGenerator>,
    harvester: CommentHarvester,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Wires an orchestrator over one key-value store.
    #[must_use]
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        generator: Arc<dyn ContentGenerator>,
        comments: Arc<dyn CommentSource>,
        scheduler: Arc<dyn Scheduler>,
        clock: Arc<dyn Clock>,
        config: OrchestratorConfig,
    ) -> Self {
        let stories = StoryStore::new(kv.clone(), config.story_ttl);
        let registry = StoryRegistry::new(kv, stories.clone(), config.story_ttl);
        Self {
            stories,
            registry,
            generator,
            harvester: CommentHarvester::new(comments),
            scheduler,
            clock,
            config,
        }
    }

    /// The story store this orchestrator writes through.
    #[must_use]
    pub fn stories(&self) -> &StoryStore {
        &self.stories
    }

    /// The registry this orchestrator maintains.
    #[must_use]
    pub fn registry(&self) -> &StoryRegistry {
        &self.registry
    }

    pub(crate) fn generator(&self) -> &dyn ContentGenerator {
        self.generator.as_ref()
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Runs the step a trigger message asks for.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the message payload is invalid.
    pub async fn handle(&self, message: TriggerMessage) -> Result<StepReport, DomainError> {
        message.validate()?;
        match message {
            TriggerMessage::DailyUnlock => Ok(self.run_daily_cycle().await),
            TriggerMessage::UnlockBatch(continuation) => {
                self.run_continuation(&continuation).await
            }
        }
    }

    /// Rebuilds the registry and runs batch 1, scheduling batch 2 if needed.
    #[instrument(skip(self), fields(correlation_id = tracing::field::Empty))]
    pub async fn run_daily_cycle(&self) -> StepReport {
        let correlation_id = Uuid::new_v4();
        tracing::Span::current().record("correlation_id", tracing::field::display(correlation_id));
        let mut report = StepReport::new(correlation_id, "daily_unlock");
        report.states.enter(CycleState::CycleTriggered);

        let story_ids = match self.registry.story_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "story-id list unavailable, skipping cycle");
                report.states.enter(CycleState::CycleHalted);
                return report;
            }
        };

        let active = self.registry.rebuild(&story_ids).await;
        report.states.enter(CycleState::RegistryRebuilt);

        let plan = BatchPlan::partition(&active.ids(), self.config.batch_size);
        report.total_batches = plan.total();
        report.states.enter(CycleState::BatchesPlanned);
        info!(
            stories = active.len(),
            batches = plan.total(),
            "daily unlock cycle planned"
        );

        let Some(first) = plan.batch(1) else {
            info!("no stories registered, cycle complete");
            report.states.enter(CycleState::CycleComplete);
            return report;
        };

        self.run_batch(&mut report, 1, first, plan.after(1)).await;
        report
    }

    /// Runs one deferred batch and schedules the next planned batch it carries.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the continuation payload is
    /// invalid.
    #[instrument(
        skip(self, continuation),
        fields(
            correlation_id = tracing::field::Empty,
            batch_number = continuation.batch_number,
            total_batches = continuation.total_batches
        )
    )]
    pub async fn run_continuation(
        &self,
        continuation: &BatchContinuation,
    ) -> Result<StepReport, DomainError> {
        continuation.validate()?;
        let correlation_id = Uuid::new_v4();
        tracing::Span::current().record("correlation_id", tracing::field::display(correlation_id));
        let mut report = StepReport::new(correlation_id, "unlock_batch");
        report.total_batches = continuation.total_batches;

        self.run_batch(
            &mut report,
            continuation.batch_number,
            &continuation.post_ids,
            &continuation.remaining_batches,
        )
        .await;
        Ok(report)
    }

    /// Cancels the pending continuation, stopping the rest of the cycle.
    ///
    /// # Errors
    ///
    /// Returns the scheduler's error if cancellation fails.
    pub async fn cancel_pending(&self) -> Result<bool, DomainError> {
        let cancelled = self.scheduler.cancel(&self.config.continuation_job).await?;
        info!(cancelled, "pending continuation cancellation requested");
        Ok(cancelled)
    }

    async fn run_batch(
        &self,
        report: &mut StepReport,
        batch_number: u32,
        ids: &[StoryId],
        rest: &[Vec<StoryId>],
    ) {
        let total_batches = report.total_batches;
        report.batch_number = batch_number;
        report.states.enter(CycleState::BatchRunning {
            batch_number,
            total_batches,
        });
        info!(batch_number, total_batches, stories = ids.len(), "batch started");

        let started = self.clock.now();
        for id in ids {
            let outcome = self.advance_story(id).await;
            report.outcomes.push(outcome);
        }
        let elapsed = self.clock.elapsed_since(started);
        report.elapsed_ms = elapsed.num_milliseconds();

        let delay = TimeDelta::from_std(self.config.batch_delay).unwrap_or(TimeDelta::MAX);
        if batch_number < total_batches && elapsed > delay {
            warn!(
                batch_number,
                elapsed_ms = report.elapsed_ms,
                delay_ms = delay.num_milliseconds(),
                "batch ran longer than the inter-batch delay"
            );
        }

        info!(
            batch_number,
            advanced = report.advanced().len(),
            skipped = report.skipped().len(),
            failed = report.failed().len(),
            "batch finished"
        );

        if batch_number >= total_batches {
            info!(total_batches, "final batch done, cycle complete");
            report.states.enter(CycleState::CycleComplete);
            return;
        }

        let Some((next_ids, later)) = rest
            .split_first()
            .filter(|(batch, _)| !batch.is_empty())
        else {
            warn!(
                next_batch = batch_number + 1,
                "following batch has no stories, halting the chain"
            );
            report.states.enter(CycleState::CycleHalted);
            return;
        };

        match self
            .schedule_continuation(batch_number + 1, total_batches, next_ids, later)
            .await
        {
            Ok(scheduled) => {
                report.states.enter(CycleState::BatchScheduled {
                    batch_number: scheduled.batch_number,
                });
                report.continuation = Some(scheduled);
            }
            Err(e) => {
                error!(
                    error = %e,
                    next_batch = batch_number + 1,
                    "failed to schedule continuation"
                );
                report.states.enter(CycleState::CycleHalted);
            }
        }
    }

    async fn schedule_continuation(
        &self,
        batch_number: u32,
        total_batches: u32,
        post_ids: &[StoryId],
        remaining_batches: &[Vec<StoryId>],
    ) -> Result<ScheduledContinuation, DomainError> {
        let delay = TimeDelta::from_std(self.config.batch_delay)
            .map_err(|e| DomainError::Validation(format!("batch delay out of range: {e}")))?;
        let run_at = self.clock.now() + delay;
        let message = TriggerMessage::UnlockBatch(BatchContinuation {
            batch_number,
            total_batches,
            post_ids: post_ids.to_vec(),
            remaining_batches: remaining_batches.to_vec(),
        });
        let handle = self
            .scheduler
            .schedule(ScheduledJob {
                name: self.config.continuation_job.clone(),
                run_at,
                message,
            })
            .await?;
        info!(job_id = %handle.job_id, batch_number, %run_at, "continuation scheduled");
        Ok(ScheduledContinuation {
            job_id: handle.job_id,
            batch_number,
            post_ids: post_ids.to_vec(),
            run_at,
        })
    }

    /// Unlocks the next chapter of one story.
    #[instrument(skip_all, fields(story_id = %id))]
    async fn advance_story(&self, id: &StoryId) -> StoryOutcome {
        let mut story = match self.stories.get(id).await {
            Ok(Some(story)) => story,
            Ok(None) => {
                warn!("story document missing, skipping");
                return skipped(id, SkipReason::Missing);
            }
            Err(e) if e.is_state_corruption() => {
                warn!(error = %e, "story document unreadable, skipping");
                return skipped(id, SkipReason::Unreadable);
            }
            Err(e) => {
                warn!(error = %e, "failed to load story");
                return failed(id, FailureStage::Load, &e);
            }
        };

        if story.is_complete() {
            info!(chapters = story.total_chapters(), "story complete, nothing to unlock");
            return skipped(id, SkipReason::Complete);
        }

        let audience_hint = self.harvester.top_comment(id).await;
        let request = ChapterRequest {
            context: story.narrative_context(),
            total_chapters: story.total_chapters(),
            chapter_number: story.next_chapter_number(),
            audience_hint: audience_hint.clone(),
        };
        let generated = match self.generator.generate_chapter(&request).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(
                    error = %e,
                    chapter = request.chapter_number,
                    "chapter generation failed, story unchanged"
                );
                return failed(id, FailureStage::Generation, &e);
            }
        };

        let image = self
            .generator
            .generate_image(&generated.text)
            .await
            .first()
            .map(GeneratedImage::to_data_uri)
            .unwrap_or_default();
        let illustrated = !image.is_empty();

        let chapter = Chapter {
            content: generated.text,
            image,
            top_comment: audience_hint,
            unlocked_at: self.clock.now(),
        };
        let number = match story.unlock_chapter(chapter) {
            Ok(number) => number,
            Err(e) => return failed(id, FailureStage::Persist, &e),
        };

        if let Err(e) = self.stories.set(id, &story).await {
            error!(error = %e, chapter = number, "failed to write story, chapter discarded");
            return failed(id, FailureStage::Persist, &e);
        }

        let registry_updated = match self.registry.upsert(id, story.summary()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "registry entry not updated, next rebuild will correct it");
                false
            }
        };

        let deletion = self.harvester.delete_all_comments(id).await;
        info!(chapter = number, illustrated, "chapter unlocked");

        StoryOutcome::Advanced {
            story_id: id.clone(),
            chapter: number,
            illustrated,
            registry_updated,
            comments_removed: deletion.removed.len(),
            comments_failed: deletion.failed.len(),
        }
    }
}

fn skipped(id: &StoryId, reason: SkipReason) -> StoryOutcome {
    StoryOutcome::Skipped {
        story_id: id.clone(),
        reason,
    }
}

fn failed(id: &StoryId, stage: FailureStage, error: &impl std::fmt::Display) -> StoryOutcome {
    StoryOutcome::Failed {
        story_id: id.clone(),
        stage,
        error: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use storyloom_test_support::{
        FailingScheduler, FixedClock, InMemoryCommentSource, InMemoryKvStore, RecordingScheduler,
        ScriptedGenerator, SteppingClock,
    };

    use storyloom_stories::domain::story::Story;

    use super::*;
    use crate::application::initializer::initialize_story;
    use crate::domain::commands::InitializeStory;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn id(raw: &str) -> StoryId {
        StoryId::parse(raw).unwrap()
    }

    struct Harness {
        kv: Arc<InMemoryKvStore>,
        generator: Arc<ScriptedGenerator>,
        comments: Arc<InMemoryCommentSource>,
        scheduler: Arc<RecordingScheduler>,
        orchestrator: Orchestrator,
    }

    fn harness_with(generator: ScriptedGenerator, clock: Arc<dyn Clock>) -> Harness {
        let kv = Arc::new(InMemoryKvStore::new());
        let generator = Arc::new(generator);
        let comments = Arc::new(InMemoryCommentSource::new());
        let scheduler = Arc::new(RecordingScheduler::new());
        let orchestrator = Orchestrator::new(
            kv.clone(),
            generator.clone(),
            comments.clone(),
            scheduler.clone(),
            clock,
            OrchestratorConfig::default(),
        );
        Harness {
            kv,
            generator,
            comments,
            scheduler,
            orchestrator,
        }
    }

    fn harness() -> Harness {
        harness_with(ScriptedGenerator::new(), Arc::new(FixedClock(now())))
    }

    /// Seeds a story at `current` of `total` and registers it.
    async fn seed(h: &Harness, raw: &str, current: u32, total: u32) {
        let created = now() - TimeDelta::days(i64::from(current));
        let chapter = |n: u32| Chapter {
            content: format!("{raw} chapter {n}."),
            image: String::new(),
            top_comment: String::new(),
            unlocked_at: created,
        };
        let mut story = Story::new(format!("Story {raw}"), total, chapter(1), created).unwrap();
        for n in 2..=current {
            story.unlock_chapter(chapter(n)).unwrap();
        }
        let story_id = id(raw);
        h.orchestrator.stories().set(&story_id, &story).await.unwrap();
        h.orchestrator.registry().register(&story_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_single_batch_advances_incomplete_and_skips_complete() {
        // Arrange
        let h = harness();
        seed(&h, "s1", 1, 3).await;
        seed(&h, "s2", 3, 3).await;
        h.comments.add(&id("s1"), "c1", "the lantern is alive", 7);
        h.comments.add(&id("s1"), "c2", "go north", 2);
        let s2_before = h.kv.get_raw("story:s2");

        // Act
        let report = h.orchestrator.run_daily_cycle().await;

        // Assert
        assert_eq!(report.total_batches, 1);
        assert_eq!(report.advanced(), [&id("s1")]);
        assert_eq!(report.skipped(), [&id("s2")]);
        assert!(report.continuation.is_none());
        assert_eq!(report.states.current(), CycleState::CycleComplete);

        let s1 = h.orchestrator.stories().require(&id("s1")).await.unwrap();
        assert_eq!(s1.current_chapter(), 2);
        let chapter = &s1.chapters()[&2];
        assert_eq!(chapter.content, "Unlocked chapter 2 of 3.");
        assert_eq!(chapter.top_comment, "the lantern is alive");
        assert_eq!(chapter.image, ScriptedGenerator::sample_image().to_data_uri());
        assert_eq!(chapter.unlocked_at, now());

        assert!(h.comments.remaining(&id("s1")).is_empty());
        let registry = h.orchestrator.registry().list().await.unwrap();
        assert_eq!(registry.get(&id("s1")).unwrap().current_chapter, 2);
        assert_eq!(h.kv.get_raw("story:s2"), s2_before);
        assert!(h.scheduler.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_seven_stories_schedule_second_batch() {
        // Arrange
        let h = harness();
        for raw in ["s1", "s2", "s3", "s4", "s5", "s6", "s7"] {
            seed(&h, raw, 1, 5).await;
        }

        // Act
        let report = h.orchestrator.run_daily_cycle().await;

        // Assert
        assert_eq!(report.batch_number, 1);
        assert_eq!(report.total_batches, 3);
        assert_eq!(report.processed(), [&id("s1"), &id("s2"), &id("s3")]);

        let jobs = h.scheduler.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, CONTINUATION_JOB);
        assert!(jobs[0].run_at > now());
        assert_eq!(
            jobs[0].message,
            TriggerMessage::UnlockBatch(BatchContinuation {
                batch_number: 2,
                total_batches: 3,
                post_ids: vec![id("s4"), id("s5"), id("s6")],
                remaining_batches: vec![vec![id("s7")]],
            })
        );
        assert_eq!(
            report.states.current(),
            CycleState::BatchScheduled { batch_number: 2 }
        );

        let untouched = h.orchestrator.stories().require(&id("s4")).await.unwrap();
        assert_eq!(untouched.current_chapter(), 1);
    }

    #[tokio::test]
    async fn test_continuation_chain_runs_to_completion() {
        // Arrange
        let h = harness();
        for raw in ["s1", "s2", "s3", "s4", "s5", "s6", "s7"] {
            seed(&h, raw, 1, 5).await;
        }
        h.orchestrator.run_daily_cycle().await;

        // Act: deliver each scheduled continuation in turn.
        let mut reports = Vec::new();
        while let Some(job) = h.scheduler.pending().pop() {
            h.scheduler.cancel(&job.name).await.unwrap();
            reports.push(h.orchestrator.handle(job.message).await.unwrap());
        }

        // Assert
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].processed(), [&id("s4"), &id("s5"), &id("s6")]);
        assert_eq!(reports[1].processed(), [&id("s7")]);
        assert_eq!(reports[1].states.current(), CycleState::CycleComplete);
        assert!(reports[1].continuation.is_none());
        for raw in ["s1", "s2", "s3", "s4", "s5", "s6", "s7"] {
            let story = h.orchestrator.stories().require(&id(raw)).await.unwrap();
            assert_eq!(story.current_chapter(), 2, "{raw} should advance exactly once");
        }
    }

    #[tokio::test]
    async fn test_story_initialized_mid_cycle_waits_for_the_next_cycle() {
        // Arrange
        let h = harness();
        for raw in ["s1", "s2", "s3", "s4", "s5", "s6", "s7"] {
            seed(&h, raw, 1, 5).await;
        }
        h.orchestrator.run_daily_cycle().await;
        let command = InitializeStory {
            correlation_id: Uuid::new_v4(),
            post_id: "a0".into(),
            title: "Latecomer".into(),
            total_chapters: 5,
            seed_prompt: "It sorts first.".into(),
        };
        initialize_story(&command, &h.orchestrator).await.unwrap();

        // Act
        let mut reports = Vec::new();
        while let Some(job) = h.scheduler.pending().pop() {
            h.scheduler.cancel(&job.name).await.unwrap();
            reports.push(h.orchestrator.handle(job.message).await.unwrap());
        }

        // Assert
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].processed(), [&id("s4"), &id("s5"), &id("s6")]);
        assert_eq!(reports[1].processed(), [&id("s7")]);
        for raw in ["s1", "s2", "s3", "s4", "s5", "s6", "s7"] {
            let story = h.orchestrator.stories().require(&id(raw)).await.unwrap();
            assert_eq!(story.current_chapter(), 2, "{raw} should advance exactly once");
        }
        let late = h.orchestrator.stories().require(&id("a0")).await.unwrap();
        assert_eq!(late.current_chapter(), 1);

        let next_cycle = h.orchestrator.run_daily_cycle().await;
        assert_eq!(next_cycle.processed(), [&id("a0"), &id("s1"), &id("s2")]);
    }

    #[tokio::test]
    async fn test_continuation_without_remaining_batches_halts() {
        let h = harness();
        seed(&h, "a", 1, 3).await;
        let continuation = BatchContinuation {
            batch_number: 1,
            total_batches: 2,
            post_ids: vec![id("a")],
            remaining_batches: vec![],
        };

        let report = h.orchestrator.run_continuation(&continuation).await.unwrap();

        assert_eq!(report.advanced(), [&id("a")]);
        assert!(report.continuation.is_none());
        assert_eq!(report.states.current(), CycleState::CycleHalted);
        assert!(h.scheduler.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_comment_listing_failure_advances_without_hint() {
        // Arrange
        let h = harness();
        seed(&h, "a", 1, 3).await;
        h.comments.add(&id("a"), "c1", "unreachable", 9);
        h.comments.fail_listing_of(&id("a"));

        // Act
        let report = h.orchestrator.run_daily_cycle().await;

        // Assert
        assert_eq!(report.advanced(), [&id("a")]);
        assert_eq!(h.generator.requests()[0].audience_hint, "");
        let a = h.orchestrator.stories().require(&id("a")).await.unwrap();
        assert_eq!(a.chapters()[&2].top_comment, "");
        assert!(matches!(
            &report.outcomes[0],
            StoryOutcome::Advanced { comments_removed: 0, comments_failed: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_partial_comment_removal_failure_is_reported_after_commit() {
        // Arrange
        let h = harness();
        seed(&h, "a", 1, 3).await;
        seed(&h, "b", 1, 3).await;
        h.comments.add(&id("a"), "c1", "first", 5);
        h.comments.add(&id("a"), "c2", "stuck", 3);
        h.comments.add(&id("a"), "c3", "third", 1);
        h.comments.add(&id("b"), "c4", "other", 2);
        h.comments.fail_removal_of("c2");

        // Act
        let report = h.orchestrator.run_daily_cycle().await;

        // Assert
        assert_eq!(report.advanced(), [&id("a"), &id("b")]);
        assert!(matches!(
            &report.outcomes[0],
            StoryOutcome::Advanced { comments_removed: 2, comments_failed: 1, .. }
        ));
        let a = h.orchestrator.stories().require(&id("a")).await.unwrap();
        assert_eq!(a.current_chapter(), 2);
        assert_eq!(a.chapters()[&2].top_comment, "first");
        let left: Vec<String> = h.comments.remaining(&id("a")).into_iter().map(|c| c.id).collect();
        assert_eq!(left, ["c2"]);
        assert_eq!(h.comments.removed(), ["c1", "c3", "c4"]);
    }

    #[tokio::test]
    async fn test_generation_failure_is_isolated() {
        // Arrange
        let h = harness_with(
            ScriptedGenerator::new().failing_when_context_contains("a chapter 1."),
            Arc::new(FixedClock(now())),
        );
        seed(&h, "a", 1, 3).await;
        seed(&h, "b", 1, 3).await;
        seed(&h, "c", 1, 3).await;
        h.comments.add(&id("a"), "k1", "keep me", 1);

        // Act
        let report = h.orchestrator.run_daily_cycle().await;

        // Assert
        assert_eq!(report.failed(), [&id("a")]);
        assert_eq!(report.advanced(), [&id("b"), &id("c")]);
        let a = h.orchestrator.stories().require(&id("a")).await.unwrap();
        assert_eq!(a.current_chapter(), 1);
        assert_eq!(h.comments.remaining(&id("a")).len(), 1);
        let registry = h.orchestrator.registry().list().await.unwrap();
        assert_eq!(registry.get(&id("a")).unwrap().current_chapter, 1);
        assert_eq!(registry.get(&id("b")).unwrap().current_chapter, 2);
    }

    #[tokio::test]
    async fn test_illustration_failure_stores_empty_image() {
        let h = harness_with(
            ScriptedGenerator::new().without_images(),
            Arc::new(FixedClock(now())),
        );
        seed(&h, "a", 1, 2).await;

        let report = h.orchestrator.run_daily_cycle().await;

        assert_eq!(report.advanced(), [&id("a")]);
        let a = h.orchestrator.stories().require(&id("a")).await.unwrap();
        assert_eq!(a.chapters()[&2].image, "");
        assert!(a.is_complete());
    }

    #[tokio::test]
    async fn test_story_write_failure_keeps_comments_and_siblings_advance() {
        // Arrange
        let h = harness();
        seed(&h, "a", 1, 3).await;
        seed(&h, "b", 1, 3).await;
        h.comments.add(&id("a"), "k1", "still here", 4);
        h.kv.fail_writes_to("story:a");

        // Act
        let report = h.orchestrator.run_daily_cycle().await;

        // Assert
        assert!(matches!(
            &report.outcomes[0],
            StoryOutcome::Failed { stage: FailureStage::Persist, .. }
        ));
        assert_eq!(report.advanced(), [&id("b")]);
        assert_eq!(h.comments.remaining(&id("a")).len(), 1);
    }

    #[tokio::test]
    async fn test_second_cycle_is_no_op_for_finished_stories() {
        let h = harness();
        seed(&h, "a", 1, 2).await;

        let first = h.orchestrator.run_daily_cycle().await;
        let second = h.orchestrator.run_daily_cycle().await;

        assert_eq!(first.advanced(), [&id("a")]);
        assert_eq!(second.skipped(), [&id("a")]);
        let a = h.orchestrator.stories().require(&id("a")).await.unwrap();
        assert_eq!(a.current_chapter(), 2);
        assert_eq!(h.generator.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_context_contains_every_prior_chapter_in_order() {
        let h = harness();
        seed(&h, "a", 3, 5).await;

        h.orchestrator.run_daily_cycle().await;

        let requests = h.generator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].context,
            "a chapter 1.\n\na chapter 2.\n\na chapter 3."
        );
        assert_eq!(requests[0].chapter_number, 4);
        assert_eq!(requests[0].audience_hint, "");
    }

    #[tokio::test]
    async fn test_missing_and_corrupted_ids_are_excluded_from_the_cycle() {
        // Arrange
        let h = harness();
        seed(&h, "good", 1, 3).await;
        h.orchestrator.registry().register(&id("gone")).await.unwrap();
        h.orchestrator.registry().register(&id("junk")).await.unwrap();
        h.kv.insert_raw("story:junk", serde_json::json!({ "currentChapter": "two" }));

        // Act
        let report = h.orchestrator.run_daily_cycle().await;

        // Assert
        assert_eq!(report.processed(), [&id("good")]);
        assert_eq!(report.advanced(), [&id("good")]);
    }

    #[tokio::test]
    async fn test_empty_registry_completes_immediately() {
        let h = harness();

        let report = h.orchestrator.run_daily_cycle().await;

        assert_eq!(report.total_batches, 0);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.states.current(), CycleState::CycleComplete);
        assert!(h.scheduler.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_continuation_skips_story_deleted_before_its_batch() {
        let h = harness();
        seed(&h, "a", 1, 3).await;
        let continuation = BatchContinuation {
            batch_number: 2,
            total_batches: 2,
            post_ids: vec![id("a"), id("vanished")],
            remaining_batches: vec![],
        };

        let report = h.orchestrator.run_continuation(&continuation).await.unwrap();

        assert_eq!(report.advanced(), [&id("a")]);
        assert!(matches!(
            &report.outcomes[1],
            StoryOutcome::Skipped { reason: SkipReason::Missing, .. }
        ));
        assert_eq!(report.states.current(), CycleState::CycleComplete);
    }

    #[tokio::test]
    async fn test_invalid_continuation_is_rejected() {
        let h = harness();

        let result = h
            .orchestrator
            .handle(TriggerMessage::UnlockBatch(BatchContinuation {
                batch_number: 4,
                total_batches: 3,
                post_ids: vec![id("a")],
                remaining_batches: vec![],
            }))
            .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_schedule_failure_still_reports_batch_results() {
        // Arrange
        let kv = Arc::new(InMemoryKvStore::new());
        let orchestrator = Orchestrator::new(
            kv,
            Arc::new(ScriptedGenerator::new()),
            Arc::new(InMemoryCommentSource::new()),
            Arc::new(FailingScheduler),
            Arc::new(FixedClock(now())),
            OrchestratorConfig {
                batch_size: 1,
                ..OrchestratorConfig::default()
            },
        );
        for raw in ["a", "b"] {
            let story = Story::new(
                raw,
                3,
                Chapter {
                    content: "start".into(),
                    image: String::new(),
                    top_comment: String::new(),
                    unlocked_at: now(),
                },
                now(),
            )
            .unwrap();
            orchestrator.stories().set(&id(raw), &story).await.unwrap();
            orchestrator.registry().register(&id(raw)).await.unwrap();
        }

        // Act
        let report = orchestrator.run_daily_cycle().await;

        // Assert
        assert_eq!(report.advanced(), [&id("a")]);
        assert!(report.continuation.is_none());
        assert_eq!(report.states.current(), CycleState::CycleHalted);
    }

    #[tokio::test]
    async fn test_slow_batch_is_measured() {
        // Each clock read advances 45 s, so a batch spans well beyond the 60 s delay.
        let h = harness_with(
            ScriptedGenerator::new(),
            Arc::new(SteppingClock::new(now(), TimeDelta::seconds(45))),
        );
        for raw in ["a", "b", "c", "d"] {
            seed(&h, raw, 1, 3).await;
        }

        let report = h.orchestrator.run_daily_cycle().await;

        assert!(report.elapsed_ms > 60_000);
        assert!(report.continuation.is_some());
    }

    #[tokio::test]
    async fn test_cancel_pending_stops_the_chain() {
        let h = harness();
        for raw in ["a", "b", "c", "d"] {
            seed(&h, raw, 1, 3).await;
        }
        h.orchestrator.run_daily_cycle().await;

        let cancelled = h.orchestrator.cancel_pending().await.unwrap();

        assert!(cancelled);
        assert!(h.scheduler.pending().is_empty());
        let d = h.orchestrator.stories().require(&id("d")).await.unwrap();
        assert_eq!(d.current_chapter(), 1);
    }
}
