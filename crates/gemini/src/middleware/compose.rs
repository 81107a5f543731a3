//! Onion-model composition of a middleware list.
//!
//! A [`Chain`] runs its middleware in registration order. Each one gets a
//! [`Next`] bound to the position after it; a shared cursor records the last
//! position entered, so running the same `Next` twice fails with
//! [`NextError::CalledMultipleTimes`] instead of executing the rest of the
//! chain again.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;

use crate::context::Context;
use crate::middleware::{HandlerResult, Middleware};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextError {
    #[error("next() called multiple times")]
    CalledMultipleTimes,
}

/// An immutable, cheaply cloneable list of middleware.
#[derive(Clone)]
pub struct Chain {
    middleware: Arc<[Arc<dyn Middleware>]>,
}

/// Composes `middleware` into a single dispatchable [`Chain`].
pub fn compose(middleware: Vec<Arc<dyn Middleware>>) -> Chain {
    Chain { middleware: middleware.into() }
}

impl Chain {
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Runs the chain over `ctx`.
    ///
    /// `tail` is invoked when the last middleware calls its continuation.
    /// The first error returned by any middleware aborts the run and is
    /// returned unchanged.
    pub async fn run(&self, ctx: &mut Context, tail: Option<&Next<'_>>) -> HandlerResult {
        let dispatch = Dispatch { middleware: &self.middleware, tail, cursor: AtomicUsize::new(0) };
        dispatch.advance(0, ctx).await
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("len", &self.middleware.len()).finish()
    }
}

/// A chain nested inside another one continues with the outer chain once its
/// own middleware are exhausted.
#[async_trait]
impl Middleware for Chain {
    async fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        self.run(ctx, Some(&next)).await
    }
}

struct Dispatch<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    tail: Option<&'a Next<'a>>,
    // one past the last entered position
    cursor: AtomicUsize,
}

impl Dispatch<'_> {
    fn advance<'s>(&'s self, index: usize, ctx: &'s mut Context) -> BoxFuture<'s, HandlerResult> {
        Box::pin(async move {
            if index < self.cursor.load(Ordering::Acquire) {
                return Err(NextError::CalledMultipleTimes.into());
            }
            self.cursor.store(index + 1, Ordering::Release);

            let next = Next { dispatch: self, index: index + 1 };
            match self.middleware.get(index) {
                Some(middleware) => middleware.call(ctx, next).await,
                None => match self.tail {
                    Some(tail) if index == self.middleware.len() => tail.run(ctx).await,
                    _ => Ok(()),
                },
            }
        })
    }
}

/// The continuation handed to a middleware, resuming the rest of the chain.
pub struct Next<'a> {
    dispatch: &'a Dispatch<'a>,
    index: usize,
}

impl Next<'_> {
    /// Runs the remaining middleware. Completes once all of them, including
    /// their code after their own `next`, have finished.
    pub async fn run(&self, ctx: &mut Context) -> HandlerResult {
        self.dispatch.advance(self.index, ctx).await
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").field("index", &self.index).finish()
    }
}
