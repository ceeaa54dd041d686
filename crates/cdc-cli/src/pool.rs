//! Bounded worker pool for running `check_source` over independent sources
//! concurrently (SPEC_FULL.md §1): generalizes the teacher's sequential
//! per-stage loop to a fixed-size pool of `std::thread`s pulling from a
//! shared queue, joined back through a single channel.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use cdc_core::config::Source;
use cdc_store::Store;

use crate::check::{check_one, CheckOutcome};

const POOL_SIZE: usize = 4;

/// Runs `check_one` for every source in `sources`, using up to
/// `POOL_SIZE` worker threads. Results are returned in the order the
/// workers complete them, not the input order.
pub fn run_checks(store: Arc<Store>, sources: Vec<Source>) -> Vec<CheckOutcome> {
    let worker_count = POOL_SIZE.min(sources.len()).max(1);
    let (tx, rx) = mpsc::channel();
    let job_queue = Arc::new(std::sync::Mutex::new(sources.into_iter().collect::<Vec<_>>()));

    let mut handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let store = Arc::clone(&store);
        let job_queue = Arc::clone(&job_queue);
        let tx = tx.clone();
        handles.push(thread::spawn(move || loop {
            let next = { job_queue.lock().unwrap().pop() };
            match next {
                Some(source) => {
                    let outcome = check_one(&store, &source);
                    let _ = tx.send(outcome);
                }
                None => break,
            }
        }));
    }
    drop(tx);

    let results: Vec<CheckOutcome> = rx.iter().collect();
    for handle in handles {
        let _ = handle.join();
    }
    results
}
