//! Logging macros
//!
//! - `log_error!` - critical errors
//! - `log_warn!` - conditions that should be investigated
//! - `log_info!` - normal operation milestones
//! - `log_debug!` - development detail, tagged with the calling function
//! - `log_trace!` - deep tracing, tagged with the calling function
//!
//! All macros capture `module_path!()`, `file!()` and `line!()` and format
//! through `core::fmt::Arguments` into a stack buffer, so they are safe in
//! trap handlers and the panic path.
//!
//! ```ignore
//! log_warn!("corrupt frame chain at {:#x}", fp);
//! log_trace!("page {:#x} -> {:?}", va, lookup);
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:expr, $func:expr, $($arg:tt)*) => {
        $crate::logging::log_impl(
            $level,
            module_path!(),
            file!(),
            line!(),
            $func,
            format_args!($($arg)*),
        )
    };
}

/// Name of the enclosing function, recovered from a nested item's type name.
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            core::any::type_name::<T>()
        }
        type_name_of(f).rsplit("::").nth(1).unwrap_or("unknown")
    }};
}

/// Log an ERROR level message
///
/// ```text
/// [ERROR module] message
/// ```
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::__log_at!($crate::logging::LogLevel::Error, None, $($arg)*)
    };
}

/// Log a WARN level message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::__log_at!($crate::logging::LogLevel::Warn, None, $($arg)*)
    };
}

/// Log an INFO level message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::__log_at!($crate::logging::LogLevel::Info, None, $($arg)*)
    };
}

/// Log a DEBUG level message (includes function name)
///
/// ```text
/// [DEBUG module::function@file:line] message
/// ```
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::__log_at!(
            $crate::logging::LogLevel::Debug,
            Some($crate::__function_name!()),
            $($arg)*
        )
    };
}

/// Log a TRACE level message (includes function name)
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        $crate::__log_at!(
            $crate::logging::LogLevel::Trace,
            Some($crate::__function_name!()),
            $($arg)*
        )
    };
}
