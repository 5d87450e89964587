//! Chunked execution of independent remote operations.
//!
//! Operations are plain futures. A Rust future does nothing until polled, so
//! an unpolled future is the operation itself: the executor decides when each
//! one starts by deciding when it is first polled.

use std::fmt::Display;
use std::future::Future;
use std::num::NonZeroUsize;

use futures::future::join_all;
use serde::Serialize;
use tracing::debug;

/// Default number of operations in flight at once.
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(20) {
    Some(size) => size,
    None => unreachable!(),
};

/// Settled result of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Outcome<V> {
    Success(V),
    Failure(String),
}

impl<V> Outcome<V> {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

impl<V, E: Display> From<Result<V, E>> for Outcome<V> {
    fn from(result: Result<V, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(err.to_string()),
        }
    }
}

/// Run `operations` in consecutive chunks of at most `batch_size`.
///
/// Every operation of a chunk is polled concurrently and the next chunk is
/// not started until all of them have settled. A failing operation never
/// cancels its siblings or later chunks. The returned outcomes line up with
/// the input order, one per operation.
pub async fn run_batched<I, Fut, V, E>(operations: I, batch_size: NonZeroUsize) -> Vec<Outcome<V>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<V, E>>,
    E: Display,
{
    let mut pending = operations.into_iter().peekable();
    let mut outcomes = Vec::new();
    let mut chunk_index = 0usize;

    while pending.peek().is_some() {
        let chunk: Vec<Fut> = pending.by_ref().take(batch_size.get()).collect();
        debug!(chunk = chunk_index, size = chunk.len(), "running batch chunk");

        let settled = join_all(chunk).await;
        outcomes.extend(settled.into_iter().map(Outcome::from));
        chunk_index += 1;
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).expect("non-zero")
    }

    #[tokio::test]
    async fn every_operation_is_accounted_for_in_order() {
        let ops = (0..45u32).map(|i| async move {
            if i % 7 == 0 {
                Err(format!("op {i} failed"))
            } else {
                Ok(i * 2)
            }
        });

        let outcomes = run_batched(ops, size(20)).await;

        assert_eq!(outcomes.len(), 45);
        assert_eq!(outcomes.iter().filter(|o| o.is_failure()).count(), 7);
        for (i, outcome) in outcomes.iter().enumerate() {
            let i = u32::try_from(i).expect("small index");
            if i % 7 == 0 {
                assert_eq!(outcome, &Outcome::Failure(format!("op {i} failed")));
            } else {
                assert_eq!(outcome, &Outcome::Success(i * 2));
            }
        }
    }

    #[tokio::test]
    async fn in_flight_never_exceeds_batch_size() {
        let in_flight = Cell::new(0usize);
        let peak = Cell::new(0usize);

        let ops = (0..23u64).map(|i| {
            let in_flight = &in_flight;
            let peak = &peak;
            async move {
                in_flight.set(in_flight.get() + 1);
                peak.set(peak.get().max(in_flight.get()));
                tokio::time::sleep(Duration::from_millis(1 + i % 3)).await;
                in_flight.set(in_flight.get() - 1);
                Ok::<_, String>(i)
            }
        });

        let outcomes = run_batched(ops, size(5)).await;

        assert_eq!(outcomes.len(), 23);
        assert!(outcomes.iter().all(Outcome::is_success));
        assert_eq!(peak.get(), 5);
    }

    #[tokio::test]
    async fn chunk_waits_for_slow_siblings_before_next_starts() {
        let started = Cell::new(0usize);
        let finished = Cell::new(0usize);
        let started_before_first_chunk_done = Cell::new(0usize);

        let ops = (0..4u64).map(|i| {
            let started = &started;
            let finished = &finished;
            let early = &started_before_first_chunk_done;
            async move {
                if i >= 2 && finished.get() < 2 {
                    early.set(early.get() + 1);
                }
                started.set(started.get() + 1);
                let delay = if i == 0 { 20 } else { 1 };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                finished.set(finished.get() + 1);
                if i == 1 { Err("boom") } else { Ok(i) }
            }
        });

        let outcomes = run_batched(ops, size(2)).await;

        assert_eq!(started.get(), 4);
        assert_eq!(started_before_first_chunk_done.get(), 0);
        assert_eq!(outcomes[1], Outcome::Failure("boom".to_string()));
        assert_eq!(outcomes[3], Outcome::Success(3));
    }

    #[tokio::test]
    async fn empty_input_yields_no_outcomes() {
        let ops: Vec<std::future::Ready<Result<(), String>>> = Vec::new();
        assert!(run_batched(ops, DEFAULT_BATCH_SIZE).await.is_empty());
    }
}
