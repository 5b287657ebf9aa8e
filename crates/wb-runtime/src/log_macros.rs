/// Domain-aware logging macros.
///
/// Each macro injects a `domain` field so callers never repeat the string
/// literal. Domains used by this runtime: `sys` (startup/shutdown), `pipe`
/// (per-polygon processing), `queue` (message handling).
///
/// # Usage
///
/// ```ignore
/// wb_info!(pipe, uid = %uid, "processing");
/// wb_warn!(queue, error = %e, "leaving message for redelivery");
/// ```
///
/// The domain is a bare identifier, converted to a `&str` by the macro; any
/// tracing-compatible field syntax may follow it.

/// Internal helper. Do not call directly; use `wb_error!` … `wb_debug!`.
#[doc(hidden)]
macro_rules! wb_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

/// Log at ERROR level with an automatic `domain` field.
#[allow(unused_macros)]
macro_rules! wb_error {
    ($domain:ident, $($rest:tt)*) => {
        wb_log!(error, $domain, $($rest)*)
    };
}

/// Log at WARN level with an automatic `domain` field.
macro_rules! wb_warn {
    ($domain:ident, $($rest:tt)*) => {
        wb_log!(warn, $domain, $($rest)*)
    };
}

/// Log at INFO level with an automatic `domain` field.
macro_rules! wb_info {
    ($domain:ident, $($rest:tt)*) => {
        wb_log!(info, $domain, $($rest)*)
    };
}

/// Log at DEBUG level with an automatic `domain` field.
#[allow(unused_macros)]
macro_rules! wb_debug {
    ($domain:ident, $($rest:tt)*) => {
        wb_log!(debug, $domain, $($rest)*)
    };
}
