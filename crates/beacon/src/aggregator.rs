//! Fan-out/fan-in for logical queries that need several independent beacon requests.
//!
//! Every sub-query runs as its own task in a [`JoinSet`]. Outcomes are consumed in
//! completion order and stored by position. The first failure is returned immediately;
//! the set is then dropped, which aborts the sub-queries still in flight. A finished
//! task's output is held by the runtime until joined, so a slow task never blocks on
//! reporting its outcome after the caller has gone.

use std::{future::Future, time::Duration};

use futures::FutureExt;
use tokio::{task::JoinSet, time::timeout};
use tracing::debug;

use crate::error::BeaconClientError;

/// Runs every task concurrently and returns their results in input order.
///
/// `deadline` bounds the whole fan-out; on expiry every outstanding task is aborted and
/// [`BeaconClientError::Timeout`] is returned for `query`.
pub async fn fan_out<T, F>(
    query: &'static str,
    deadline: Option<Duration>,
    tasks: Vec<F>,
) -> Result<Vec<T>, BeaconClientError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, BeaconClientError>> + Send + 'static,
{
    let expected = tasks.len();
    let mut set = JoinSet::new();
    for (position, task) in tasks.into_iter().enumerate() {
        set.spawn(task.map(move |result| (position, result)));
    }

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(expected).collect();
    let collect = collect_outcomes(&mut set, &mut slots);

    let outcome = match deadline {
        Some(after) => match timeout(after, collect).await {
            Ok(outcome) => outcome,
            Err(_) => Err(BeaconClientError::Timeout { query, after }),
        },
        None => collect.await,
    };

    if let Err(err) = outcome {
        debug!(query, outstanding = set.len(), %err, "aborting outstanding sub-queries");
        set.abort_all();
        return Err(err);
    }

    let results: Vec<T> = slots.into_iter().flatten().collect();
    debug_assert_eq!(results.len(), expected);
    Ok(results)
}

async fn collect_outcomes<T: 'static>(
    set: &mut JoinSet<(usize, Result<T, BeaconClientError>)>,
    slots: &mut [Option<T>],
) -> Result<(), BeaconClientError> {
    while let Some(joined) = set.join_next().await {
        let (position, result) = joined?;
        slots[position] = Some(result?);
    }
    Ok(())
}

enum Part<A, B, C> {
    A(A),
    B(B),
    C(C),
}

fn out_of_position(query: &'static str) -> BeaconClientError {
    BeaconClientError::Decode {
        query,
        source: crate::error::DecodeError::Invalid {
            field: "sub-query",
            reason: "result arrived out of position".to_string(),
        },
    }
}

/// Typed two-way [`fan_out`].
pub async fn try_join2<A, B, FA, FB>(
    query: &'static str,
    deadline: Option<Duration>,
    a: FA,
    b: FB,
) -> Result<(A, B), BeaconClientError>
where
    A: Send + 'static,
    B: Send + 'static,
    FA: Future<Output = Result<A, BeaconClientError>> + Send + 'static,
    FB: Future<Output = Result<B, BeaconClientError>> + Send + 'static,
{
    let tasks = vec![
        a.map(|r| r.map(Part::<A, B, ()>::A)).boxed(),
        b.map(|r| r.map(Part::<A, B, ()>::B)).boxed(),
    ];
    let parts = fan_out(query, deadline, tasks).await?;

    match <[Part<A, B, ()>; 2]>::try_from(parts) {
        Ok([Part::A(a), Part::B(b)]) => Ok((a, b)),
        _ => Err(out_of_position(query)),
    }
}

/// Typed three-way [`fan_out`].
pub async fn try_join3<A, B, C, FA, FB, FC>(
    query: &'static str,
    deadline: Option<Duration>,
    a: FA,
    b: FB,
    c: FC,
) -> Result<(A, B, C), BeaconClientError>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    FA: Future<Output = Result<A, BeaconClientError>> + Send + 'static,
    FB: Future<Output = Result<B, BeaconClientError>> + Send + 'static,
    FC: Future<Output = Result<C, BeaconClientError>> + Send + 'static,
{
    let tasks = vec![
        a.map(|r| r.map(Part::A)).boxed(),
        b.map(|r| r.map(Part::B)).boxed(),
        c.map(|r| r.map(Part::C)).boxed(),
    ];
    let parts = fan_out(query, deadline, tasks).await?;

    match <[Part<A, B, C>; 3]>::try_from(parts) {
        Ok([Part::A(a), Part::B(b), Part::C(c)]) => Ok((a, b, c)),
        _ => Err(out_of_position(query)),
    }
}
