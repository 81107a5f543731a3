//! Request context types for routed handlers.
//!
//! - `RouterContext`: the engine's [`Context`] plus the parameters of the matched route
//! - `PathParams`: the decoded named segments of the request path

use std::ops::{Deref, DerefMut};

use micro_gemini::Context;

/// What a [`RouteHandler`](crate::router::RouteHandler) receives.
///
/// Derefs to [`Context`], so the request and response are reached the same
/// way as in plain middleware.
#[derive(Debug)]
pub struct RouterContext<'c> {
    context: &'c mut Context,
    params: PathParams,
}

impl<'c> RouterContext<'c> {
    pub fn new(context: &'c mut Context, params: PathParams) -> Self {
        Self { context, params }
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Shortcut for `params().get(name)`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }
}

impl Deref for RouterContext<'_> {
    type Target = Context;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for RouterContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

/// Named path segments, in pattern order, already percent-decoded.
///
/// For the pattern `/user/:id` and the path `/user/j%C3%B6rg`, `id` is `jörg`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(String, String)>,
}

impl PathParams {
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Gets the value of a path parameter by its name
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.params.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<'k, 'v> From<matchit::Params<'k, 'v>> for PathParams {
    fn from(params: matchit::Params<'k, 'v>) -> Self {
        let params = params
            .iter()
            .map(|(name, value)| {
                let value = percent_encoding::percent_decode_str(value).decode_utf8_lossy();
                (name.to_owned(), value.into_owned())
            })
            .collect();
        Self { params }
    }
}
