//! Serving files from a directory.
//!
//! [`send`] answers a request with the contents of `root` + `path`. The path
//! is resolved lexically first, so a request can never name a file outside
//! `root`.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use micro_gemini::Context;
use micro_gemini::middleware::HandlerResult;
use micro_gemini::protocol::{BoxError, GeminiError, status};
use percent_encoding::percent_decode_str;
use tracing::{debug, trace};

pub const GEMTEXT: &str = "text/gemini; lang=en";

const FALLBACK_CONTENT_TYPE: &str = "text/plain";

#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Directory the requested paths are resolved against.
    pub root: PathBuf,
    /// File served when the path names a directory.
    pub index: Option<String>,
    /// Content types by extension, without the dot. Checked before the
    /// built-in guesses.
    pub content_types: HashMap<String, String>,
    /// Whether files and directories starting with `.` may be served.
    pub hidden: bool,
    /// Path to serve instead of the request path, used by
    /// [`ContextExt::send`](crate::ContextExt::send).
    pub path: Option<String>,
}

impl SendOptions {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into(), ..Default::default() }
    }

    pub fn with_index<S: Into<String>>(mut self, index: S) -> Self {
        self.index = Some(index.into());
        self
    }
}

/// Sets the response to the file at `path` below `options.root`.
///
/// Fails with `59` when `path` escapes the root and with `51` when the file
/// is hidden, missing, or a directory without a usable index.
pub async fn send(ctx: &mut Context, path: &str, options: &SendOptions) -> HandlerResult {
    let relative = normalize(path)
        .ok_or_else(|| GeminiError::bad_request("Path must not travel up from the root directory"))?;

    if !options.hidden && is_hidden(&relative) {
        debug!(path, "refuse to send hidden path");
        return Err(GeminiError::not_found().into());
    }

    let mut target = options.root.join(&relative);
    let metadata = tokio::fs::metadata(&target).await.map_err(|e| not_found(&target, &e))?;
    if metadata.is_dir() {
        let index = options.index.as_deref().ok_or_else(GeminiError::not_found)?;
        target.push(index);
        let metadata = tokio::fs::metadata(&target).await.map_err(|e| not_found(&target, &e))?;
        if !metadata.is_file() {
            return Err(GeminiError::not_found().into());
        }
    }

    let meta = content_type(&target, &options.content_types);
    let contents = tokio::fs::read(&target).await.map_err(|e| match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::IsADirectory => not_found(&target, &e).into(),
        _ => BoxError::from(e),
    })?;

    trace!(file = %target.display(), meta, size = contents.len(), "send file");
    ctx.response_mut().set_status(status::SUCCESS).set_meta(meta).set_body(contents);
    Ok(())
}

fn not_found(target: &Path, e: &io::Error) -> GeminiError {
    debug!(file = %target.display(), cause = %e, "file not found");
    GeminiError::not_found()
}

/// Resolves `.` and `..` segments of a decoded `path` without touching the
/// filesystem. `None` when the path climbs above its start.
fn normalize(path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(path).decode_utf8_lossy();

    let mut segments = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            segment => segments.push(segment),
        }
    }
    Some(segments.into_iter().collect())
}

fn is_hidden(relative: &Path) -> bool {
    relative.iter().any(|segment| segment.to_str().is_some_and(|s| s.starts_with('.')))
}

fn content_type(target: &Path, content_types: &HashMap<String, String>) -> String {
    let extension = target.extension().and_then(|ext| ext.to_str());

    if let Some(meta) = extension.and_then(|ext| content_types.get(ext)) {
        return meta.clone();
    }
    match extension {
        Some("gmi" | "gemini") => GEMTEXT.to_owned(),
        _ => mime_guess::from_path(target).first_raw().unwrap_or(FALLBACK_CONTENT_TYPE).to_owned(),
    }
}
