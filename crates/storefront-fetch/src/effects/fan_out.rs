//! Running independent child operations under one parent.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::effects::aggregator::ProgressAggregator;
use crate::error::Error;

/// How often a reporting join samples its aggregator.
pub const PROGRESS_PERIOD: Duration = Duration::from_millis(300);

/// A group of child operations whose results are merged into one.
///
/// Children run concurrently inside the task that awaits [`FanOut::join`];
/// the join returns once, after every launched child has finished. The
/// first error recorded wins; later ones are logged and dropped.
///
/// # Examples
///
/// ```
/// use storefront_fetch::{Error, FanOut};
/// use tokio_util::sync::CancellationToken;
///
/// # tokio_test_block_on(async {
/// let mut fan_out: FanOut<'_, u32> = FanOut::new(CancellationToken::new());
/// for n in 1..=3 {
///     fan_out.launch(async move { Ok::<_, Error>(n) });
/// }
/// let sum = fan_out.join(0, |sum, n| *sum += n).await.unwrap();
/// assert_eq!(sum, 6);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
/// # }
/// ```
pub struct FanOut<'a, T, E = Error> {
    children: FuturesUnordered<BoxFuture<'a, Result<T, E>>>,
    cancel: CancellationToken,
    first_error: Option<E>,
    launched: usize,
}

enum Event<T, E> {
    Child(Option<Result<T, E>>),
    Tick,
}

impl<'a, T, E> FanOut<'a, T, E>
where
    T: 'a,
    E: From<Error> + fmt::Display + 'a,
{
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            children: FuturesUnordered::new(),
            cancel,
            first_error: None,
            launched: 0,
        }
    }

    /// Start `child` unless cancellation was already requested.
    ///
    /// A refused launch records [`Error::Cancelled`] and returns `false`;
    /// callers stop launching then. Children already running are not
    /// interrupted by this.
    pub fn launch<F>(&mut self, child: F) -> bool
    where
        F: Future<Output = Result<T, E>> + Send + 'a,
    {
        if self.cancel.is_cancelled() {
            self.record(Error::Cancelled.into());
            return false;
        }
        self.children.push(Box::pin(child));
        self.launched += 1;
        true
    }

    /// Record an error that did not come from a child.
    pub fn record(&mut self, error: E) {
        if self.first_error.is_none() {
            self.first_error = Some(error);
        } else {
            debug!(%error, "additional error in fan-out");
        }
    }

    pub fn launched(&self) -> usize {
        self.launched
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Wait for every child, folding successful results into `init`.
    pub async fn join<A>(mut self, init: A, mut merge: impl FnMut(&mut A, T)) -> Result<A, E> {
        let mut acc = init;
        while let Some(result) = self.children.next().await {
            self.settle(&mut acc, &mut merge, result);
        }
        self.into_result(acc)
    }

    /// Like [`FanOut::join`], sampling `aggregator` every `period` while
    /// children run and reporting a final value once they have all finished.
    pub async fn join_reporting<A>(
        mut self,
        init: A,
        mut merge: impl FnMut(&mut A, T),
        mut aggregator: ProgressAggregator,
        period: Duration,
    ) -> Result<A, E> {
        let mut acc = init;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                next = self.children.next() => Event::Child(next),
                _ = ticker.tick() => Event::Tick,
            };
            match event {
                Event::Child(Some(result)) => self.settle(&mut acc, &mut merge, result),
                Event::Child(None) => break,
                Event::Tick => {
                    aggregator.sample();
                }
            }
        }

        aggregator.finish();
        self.into_result(acc)
    }

    fn settle<A>(&mut self, acc: &mut A, merge: &mut impl FnMut(&mut A, T), result: Result<T, E>) {
        match result {
            Ok(value) => merge(acc, value),
            Err(error) => self.record(error),
        }
    }

    fn into_result<A>(self, acc: A) -> Result<A, E> {
        match self.first_error {
            Some(error) => Err(error),
            None => Ok(acc),
        }
    }
}
