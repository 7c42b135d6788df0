//! Load progress watching
//!
//! A watcher turns one unit's load state into a stream of snapshots: an
//! immediate snapshot of the state as subscribed, one snapshot when the
//! delay signal fires, one when the timeout signal fires, and a final
//! snapshot when the load settles. Polling the watcher drives the shared
//! load itself; dropping it cancels the timers but never the load.

use crate::error::LoadError;
use crate::state::{SettledFuture, StateHandle};
use futures_util::stream::Stream;
use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::Sleep;

/// One observation of a unit's load progress
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSnapshot<T> {
    /// True until the load settles
    pub is_loading: bool,
    /// True once the configured delay elapsed while still loading
    pub past_delay: bool,
    /// True once the configured timeout elapsed while still loading
    pub timed_out: bool,
    /// The failure, if the load has failed
    pub error: Option<LoadError>,
    /// The payload, possibly partial for composite units
    pub value: Option<T>,
}

/// Stream of [`LoadSnapshot`]s for one unit.
///
/// Ends after the settlement snapshot. Timers that have not fired by then
/// are discarded, so a fast load never raises `past_delay` or `timed_out`.
#[pin_project]
pub struct LoadWatcher<S: StateHandle> {
    state: S,
    settled: SettledFuture<S::Output>,
    #[pin]
    delay: Option<Sleep>,
    #[pin]
    timeout: Option<Sleep>,
    past_delay: bool,
    timed_out: bool,
    emitted_initial: bool,
    done: bool,
}

impl<S: StateHandle> LoadWatcher<S> {
    pub(crate) fn new(state: S, delay: Option<Duration>, timeout: Option<Duration>) -> Self {
        let loading = state.is_loading();
        // A zero delay raises the signal up front instead of arming a timer.
        let past_delay = loading && matches!(delay, Some(d) if d.is_zero());
        let delay_timer = match delay {
            Some(d) if loading && !d.is_zero() => Some(tokio::time::sleep(d)),
            _ => None,
        };
        let timeout_timer = match timeout {
            Some(d) if loading => Some(tokio::time::sleep(d)),
            _ => None,
        };
        let settled = state.settled();

        Self {
            state,
            settled,
            delay: delay_timer,
            timeout: timeout_timer,
            past_delay,
            timed_out: false,
            emitted_initial: false,
            done: false,
        }
    }

    fn snapshot(state: &S, past_delay: bool, timed_out: bool) -> LoadSnapshot<S::Output> {
        LoadSnapshot {
            is_loading: state.is_loading(),
            past_delay,
            timed_out,
            error: state.error(),
            value: state.current(),
        }
    }
}

impl<S: StateHandle> Stream for LoadWatcher<S> {
    type Item = LoadSnapshot<S::Output>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.done {
            return Poll::Ready(None);
        }

        if !*this.emitted_initial {
            *this.emitted_initial = true;
            if !this.state.is_loading() {
                *this.done = true;
            }
            return Poll::Ready(Some(Self::snapshot(
                this.state,
                *this.past_delay,
                *this.timed_out,
            )));
        }

        // Settlement wins over timer signals due in the same poll; pending
        // timers are dropped so they cannot fire after the final snapshot.
        if Pin::new(&mut *this.settled).poll(cx).is_ready() {
            *this.done = true;
            this.delay.set(None);
            this.timeout.set(None);
            return Poll::Ready(Some(Self::snapshot(
                this.state,
                *this.past_delay,
                *this.timed_out,
            )));
        }

        let mut fired = false;
        if let Some(sleep) = this.delay.as_mut().as_pin_mut() {
            if sleep.poll(cx).is_ready() {
                *this.past_delay = true;
                fired = true;
            }
        }
        if fired {
            this.delay.set(None);
        }

        let mut timeout_fired = false;
        if let Some(sleep) = this.timeout.as_mut().as_pin_mut() {
            if sleep.poll(cx).is_ready() {
                *this.timed_out = true;
                timeout_fired = true;
            }
        }
        if timeout_fired {
            this.timeout.set(None);
            fired = true;
        }

        if fired {
            return Poll::Ready(Some(Self::snapshot(
                this.state,
                *this.past_delay,
                *this.timed_out,
            )));
        }

        Poll::Pending
    }
}
