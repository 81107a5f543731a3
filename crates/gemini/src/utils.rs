//! Internal helper macros.

/// Returns early with `$error` when `$predicate` does not hold.
///
/// Like `assert!`, but for conditions a caller can recover from.
///
/// ```ignore
/// ensure!(status::is_valid(status), ResponseError::InvalidStatus(status));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
