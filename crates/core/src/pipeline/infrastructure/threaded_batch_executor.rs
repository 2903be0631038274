use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread::ScopedJoinHandle;

use crate::pipeline::batch_executor::BatchExecutor;
use crate::pipeline::item_error::ItemResult;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Processes items on a bounded pool of worker threads.
///
/// Layout: `feeder → workers[n] → caller [on_result]`
///
/// Items are independent, so results arrive in completion order. Every
/// result is handed to `on_result` on the caller's thread. An item whose
/// work panics is logged by path and yields no result; its worker moves on.
pub struct ThreadedBatchExecutor {
    workers: usize,
    channel_capacity: usize,
}

impl ThreadedBatchExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl BatchExecutor for ThreadedBatchExecutor {
    fn execute(
        &self,
        items: Vec<PathBuf>,
        work: &(dyn Fn(&Path) -> ItemResult + Sync),
        on_result: &mut dyn FnMut(ItemResult),
    ) {
        if items.is_empty() {
            return;
        }
        let workers = self.workers.min(items.len());
        let cap = self.channel_capacity;

        let (job_tx, job_rx) = crossbeam_channel::bounded::<PathBuf>(cap);
        let (result_tx, result_rx) = crossbeam_channel::bounded::<ItemResult>(cap);

        std::thread::scope(|scope| {
            let feeder = scope.spawn(move || {
                for item in items {
                    if job_tx.send(item).is_err() {
                        break;
                    }
                }
            });

            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let job_rx = job_rx.clone();
                    let result_tx = result_tx.clone();
                    scope.spawn(move || {
                        for item in job_rx {
                            let Some(result) = run_item(work, &item) else {
                                continue;
                            };
                            if result_tx.send(result).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();
            drop(job_rx);
            drop(result_tx);

            for result in result_rx {
                on_result(result);
            }

            join_threads(feeder, handles);
        });
    }
}

fn run_item(work: &(dyn Fn(&Path) -> ItemResult + Sync), item: &Path) -> Option<ItemResult> {
    match panic::catch_unwind(AssertUnwindSafe(|| work(item))) {
        Ok(result) => Some(result),
        Err(_) => {
            log::error!("{}: worker panicked, item has no result", item.display());
            None
        }
    }
}

fn join_threads(feeder: ScopedJoinHandle<'_, ()>, workers: Vec<ScopedJoinHandle<'_, ()>>) {
    if feeder.join().is_err() {
        log::error!("Batch feeder thread panicked; remaining items were not processed");
    }
    for (index, handle) in workers.into_iter().enumerate() {
        if handle.join().is_err() {
            log::error!("Batch worker {index} panicked");
        }
    }
}
