use super::core::ParallelRunner;
use crate::config::WorkgateConfig;
use crate::error::{TaskError, WorkgateError};
use std::num::NonZeroUsize;
use std::time::Duration;

/// Splits input into fixed-size chunks and processes them through a [`ParallelRunner`]
///
/// Every chunk always runs to completion; the first error in chunk order is
/// reported afterwards. Sibling chunks are not cancelled when one fails.
#[derive(Debug, Clone, Copy)]
pub struct BatchChunker {
    chunk_size: NonZeroUsize,
    runner: ParallelRunner,
}

impl BatchChunker {
    pub fn new(chunk_size: usize, max_concurrency: usize) -> Result<Self, WorkgateError> {
        let chunk_size = NonZeroUsize::new(chunk_size).ok_or(WorkgateError::zero("chunk_size"))?;
        Ok(Self {
            chunk_size,
            runner: ParallelRunner::new(max_concurrency, Duration::ZERO)?,
        })
    }

    pub fn from_config(config: &WorkgateConfig) -> Result<Self, WorkgateError> {
        Self::new(config.batch.chunk_size, config.max_concurrency())
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size.get()
    }

    /// Run `chunk_fn` over consecutive chunks of `items`
    ///
    /// The final chunk may be shorter than `chunk_size`. Returns the error of the
    /// lowest-indexed failing chunk, if any.
    pub fn process<T, F>(&self, items: &[T], chunk_fn: F) -> Result<(), TaskError>
    where
        T: Sync,
        F: Fn(&[T]) -> anyhow::Result<()> + Sync,
    {
        let chunk_fn = &chunk_fn;
        let tasks: Vec<_> = items
            .chunks(self.chunk_size.get())
            .map(|chunk| move || chunk_fn(chunk))
            .collect();

        tracing::debug!(
            "Processing {} items in {} chunks of up to {}",
            items.len(),
            tasks.len(),
            self.chunk_size
        );

        self.runner
            .run(tasks)
            .into_iter()
            .find_map(|result| result.outcome.err())
            .map_or(Ok(()), Err)
    }
}

/// One-shot chunked processing with anyhow-flavoured errors
pub fn process_in_batches<T, F>(
    items: &[T],
    chunk_size: usize,
    max_concurrency: usize,
    chunk_fn: F,
) -> anyhow::Result<()>
where
    T: Sync,
    F: Fn(&[T]) -> anyhow::Result<()> + Sync,
{
    BatchChunker::new(chunk_size, max_concurrency)?.process(items, chunk_fn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::AtomicCounter;
    use parking_lot::Mutex;

    #[test]
    fn test_from_config() {
        let mut config = WorkgateConfig::default();
        config.batch.chunk_size = 7;
        assert_eq!(BatchChunker::from_config(&config).unwrap().chunk_size(), 7);

        config.batch.chunk_size = 0;
        assert!(BatchChunker::from_config(&config).is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(BatchChunker::new(0, 2).is_err());
        assert!(BatchChunker::new(3, 0).is_err());
    }

    #[test]
    fn test_chunk_boundaries() {
        let items: Vec<u32> = (1..=10).collect();
        let seen = Mutex::new(Vec::new());

        let chunker = BatchChunker::new(3, 2).unwrap();
        chunker
            .process(&items, |chunk| {
                seen.lock().push(chunk.to_vec());
                Ok(())
            })
            .unwrap();

        let mut seen = seen.into_inner();
        seen.sort();
        assert_eq!(
            seen,
            vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9], vec![10]]
        );
    }

    #[test]
    fn test_lowest_index_error_wins_and_all_chunks_run() {
        let items: Vec<u32> = (1..=10).collect();
        let calls = AtomicCounter::default();

        let err = process_in_batches(&items, 2, 4, |chunk| {
            calls.increment();
            if chunk.contains(&3) {
                anyhow::bail!("chunk with 3 failed");
            }
            if chunk.contains(&9) {
                anyhow::bail!("chunk with 9 failed");
            }
            Ok(())
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "chunk with 3 failed");
        assert_eq!(calls.get(), 5);
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<u8> = Vec::new();
        assert!(process_in_batches(&items, 4, 2, |_| anyhow::bail!("never called")).is_ok());
    }

    #[test]
    fn test_panicking_chunk_is_reported() {
        let items = [1, 2, 3, 4];
        let err = BatchChunker::new(2, 2)
            .unwrap()
            .process(&items, |chunk| {
                if chunk[0] == 3 {
                    panic!("bad chunk");
                }
                Ok(())
            })
            .unwrap_err();
        assert!(err.is_panic());
    }
}
