//! Partitioned parallel-for over a disjoint output buffer
//!
//! Each partition owns a distinct `&mut` chunk of the output, so tasks need no
//! synchronization beyond the join at the end. Inputs are shared read-only.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::{LinalgError, Result};

/// Run `task(chunk_index, chunk)` over `output` split into `chunk_len` pieces
///
/// Partitions run on the rayon pool when `parallel` is set and the
/// `parallel` feature is enabled, otherwise in order on the calling thread.
/// The partitioning is identical either way.
///
/// A task that returns an error or panics fails its partition. When any
/// partition fails the whole call fails with
/// [`LinalgError::AggregatedTaskFailure`] carrying the failure count and the
/// message of the lowest-indexed failure; the partially written output must be
/// discarded by the caller.
///
/// # Examples
///
/// ```
/// use dlinalg::parallel::run_partitioned;
///
/// let mut out = vec![0.0; 5];
/// run_partitioned(&mut out, 2, true, |chunk, values| {
///     values.fill(chunk as f64);
///     Ok(())
/// })
/// .unwrap();
/// assert_eq!(out, vec![0.0, 0.0, 1.0, 1.0, 2.0]);
/// ```
#[cfg_attr(
    feature = "tracing",
    instrument(skip(output, task), fields(len = output.len()))
)]
pub fn run_partitioned<F>(output: &mut [f64], chunk_len: usize, parallel: bool, task: F) -> Result<()>
where
    F: Fn(usize, &mut [f64]) -> Result<()> + Sync,
{
    if chunk_len == 0 {
        return Err(LinalgError::InvalidInput(
            "partition length must be at least 1".to_string(),
        ));
    }
    let partitions = output.len().div_ceil(chunk_len);

    let run = |(index, chunk): (usize, &mut [f64])| -> Option<(usize, String)> {
        match panic::catch_unwind(AssertUnwindSafe(|| task(index, chunk))) {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some((index, err.to_string())),
            Err(payload) => Some((index, panic_message(payload.as_ref()))),
        }
    };

    #[cfg(feature = "parallel")]
    let failures: Vec<(usize, String)> = if parallel {
        output
            .par_chunks_mut(chunk_len)
            .enumerate()
            .filter_map(&run)
            .collect()
    } else {
        output.chunks_mut(chunk_len).enumerate().filter_map(&run).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let failures: Vec<(usize, String)> = {
        let _ = parallel;
        output.chunks_mut(chunk_len).enumerate().filter_map(&run).collect()
    };

    aggregate(failures, partitions)
}

fn aggregate(failures: Vec<(usize, String)>, partitions: usize) -> Result<()> {
    let failed = failures.len();
    match failures.into_iter().min_by_key(|(index, _)| *index) {
        None => Ok(()),
        Some((index, message)) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(failed, partitions, first = index, "partitioned computation failed");
            Err(LinalgError::AggregatedTaskFailure {
                failed,
                partitions,
                first: format!("partition {index}: {message}"),
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
