use std::path::{Path, PathBuf};

use super::item_error::ItemResult;

/// Abstracts how the items of a batch are scheduled.
///
/// `work` runs once per item, possibly on several threads at once.
/// `on_result` is always called on the caller's thread, which makes it the
/// single accumulation point for results.
pub trait BatchExecutor: Send + Sync {
    fn execute(
        &self,
        items: Vec<PathBuf>,
        work: &(dyn Fn(&Path) -> ItemResult + Sync),
        on_result: &mut dyn FnMut(ItemResult),
    );
}

/// Processes items one after another on the calling thread.
#[derive(Default)]
pub struct SequentialBatchExecutor;

impl SequentialBatchExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl BatchExecutor for SequentialBatchExecutor {
    fn execute(
        &self,
        items: Vec<PathBuf>,
        work: &(dyn Fn(&Path) -> ItemResult + Sync),
        on_result: &mut dyn FnMut(ItemResult),
    ) {
        for item in items {
            on_result(work(&item));
        }
    }
}
