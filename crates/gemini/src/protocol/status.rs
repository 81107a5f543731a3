//! Gemini status codes and their default messages.
//!
//! A status is a two digit number in `10..=69`. The tens digit selects the
//! [`StatusClass`], the units digit refines it. Every code has a default
//! message used whenever a response or an error carries no explicit meta.

pub type Status = u8;

pub const INPUT: Status = 10;
pub const SENSITIVE_INPUT: Status = 11;
pub const SUCCESS: Status = 20;
pub const REDIRECT_TEMPORARY: Status = 30;
pub const REDIRECT_PERMANENT: Status = 31;
pub const TEMPORARY_FAILURE: Status = 40;
pub const SERVER_UNAVAILABLE: Status = 41;
pub const CGI_ERROR: Status = 42;
pub const PROXY_ERROR: Status = 43;
pub const SLOW_DOWN: Status = 44;
pub const PERMANENT_FAILURE: Status = 50;
pub const NOT_FOUND: Status = 51;
pub const GONE: Status = 52;
pub const PROXY_REQUEST_REFUSED: Status = 53;
pub const BAD_REQUEST: Status = 59;
pub const CLIENT_CERTIFICATE_REQUIRED: Status = 60;
pub const CERTIFICATE_NOT_AUTHORIZED: Status = 61;
pub const CERTIFICATE_NOT_VALID: Status = 62;

/// Lowest status a response may carry.
pub const MIN_STATUS: Status = 10;
/// Highest status a response may carry.
pub const MAX_STATUS: Status = 69;

/// The family a status belongs to, taken from its tens digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Input,
    Success,
    Redirect,
    TemporaryFailure,
    PermanentFailure,
    ClientCertificateRequired,
}

impl StatusClass {
    /// Returns `None` when the tens digit is outside `1..=6`.
    pub fn of(status: Status) -> Option<Self> {
        match status / 10 {
            1 => Some(Self::Input),
            2 => Some(Self::Success),
            3 => Some(Self::Redirect),
            4 => Some(Self::TemporaryFailure),
            5 => Some(Self::PermanentFailure),
            6 => Some(Self::ClientCertificateRequired),
            _ => None,
        }
    }
}

#[inline]
pub fn is_valid(status: Status) -> bool {
    (MIN_STATUS..=MAX_STATUS).contains(&status)
}

#[inline]
pub fn is_success(status: Status) -> bool {
    status / 10 == 2
}

#[inline]
pub fn is_redirect(status: Status) -> bool {
    status / 10 == 3
}

/// Looks up the default message of `status`: the exact code first, then the
/// first code of its family (`45` falls back to `40`), then the empty string.
pub fn default_message(status: Status) -> &'static str {
    lookup(status).or_else(|| lookup(status / 10 * 10)).unwrap_or("")
}

fn lookup(key: Status) -> Option<&'static str> {
    let message = match key {
        10 => "Input: ",
        11 => "Sensitive Input: ",
        20 => "text/plain; lang=en",
        30 => "Temporary redirection",
        31 => "Permanent redirection",
        40 => "Server Error",
        41 => "Server unavailable",
        42 => "CGI error",
        43 => "Proxy error",
        44 => "Slow down",
        50 => "Permanent Failure",
        51 => "Not found",
        52 => "Gone",
        53 => "Proxy request refused",
        59 => "Bad request",
        60 => "Certificate required",
        61 => "Certificate not authorized",
        62 => "Certificate not valid",
        _ => return None,
    };
    Some(message)
}
