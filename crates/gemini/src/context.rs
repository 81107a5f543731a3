//! The per-request state threaded through the middleware chain.

use crate::protocol::{Request, Response};

/// Owns the [`Request`] and the [`Response`] of a single request.
///
/// A context is created for every request and dropped once the response
/// is written. Handlers that need extra per-request data wrap a
/// `&mut Context` instead of extending this type.
#[derive(Debug)]
pub struct Context {
    request: Request,
    response: Response,
}

impl Context {
    /// Creates a context holding an empty success response.
    pub fn new(request: Request) -> Self {
        Self { request, response: Response::new() }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}
