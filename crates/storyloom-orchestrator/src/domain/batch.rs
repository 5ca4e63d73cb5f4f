//! Partitioning of the registry into fixed-size batches.

use storyloom_core::story_id::StoryId;

/// Default number of stories per batch.
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// The registry's ids split into consecutive batches, in iteration order.
///
/// Every id lands in exactly one batch; only the last batch may be short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    batches: Vec<Vec<StoryId>>,
}

impl BatchPlan {
    /// Splits `ids` into batches of `batch_size`. A size of zero is treated
    /// as one.
    #[must_use]
    pub fn partition(ids: &[StoryId], batch_size: usize) -> Self {
        let size = batch_size.max(1);
        Self {
            batches: ids.chunks(size).map(<[StoryId]>::to_vec).collect(),
        }
    }

    /// Number of batches, `ceil(N / batch_size)`.
    #[must_use]
    pub fn total(&self) -> u32 {
        u32::try_from(self.batches.len()).unwrap_or(u32::MAX)
    }

    /// Whether there is nothing to process.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// The ids of 1-based batch `number`.
    #[must_use]
    pub fn batch(&self, number: u32) -> Option<&[StoryId]> {
        let index = usize::try_from(number.checked_sub(1)?).ok()?;
        self.batches.get(index).map(Vec::as_slice)
    }

    /// The batches following 1-based batch `number`, in order.
    #[must_use]
    pub fn after(&self, number: u32) -> &[Vec<StoryId>] {
        let start = usize::try_from(number)
            .unwrap_or(usize::MAX)
            .min(self.batches.len());
        &self.batches[start..]
    }
}
