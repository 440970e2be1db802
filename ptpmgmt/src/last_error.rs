//! Thread-local diagnostic slot for the last error reported by this crate.
//!
//! The original C++ library keeps a single process-wide record updated by
//! `PMC_ERROR`/`PMC_ERRORA`-style macros (see `original_source/err.h`). This
//! crate keeps the same shape but scopes it per-thread (spec.md §5, §9) so a
//! failing call's diagnostic is always readable on the calling thread without
//! synchronization.

use std::cell::RefCell;

/// A single recorded error, as close to the call site as possible.
#[derive(Debug, Clone, Default)]
pub struct ErrorRecord {
    file: &'static str,
    line: u32,
    function: &'static str,
    errno_val: i32,
    short_msg: String,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<ErrorRecord>> = RefCell::new(None);
}

/// Records a plain error with no associated `errno`.
pub fn set_error(file: &'static str, line: u32, function: &'static str, msg: impl Into<String>) {
    set_errno_error(file, line, function, 0, msg)
}

/// Records an error alongside an `errno`-style status code.
pub fn set_errno_error(
    file: &'static str,
    line: u32,
    function: &'static str,
    errno_val: i32,
    msg: impl Into<String>,
) {
    let short_msg = msg.into();
    log::warn!("{}:{} {}: {}", file, line, function, short_msg);
    LAST_ERROR.with(|slot| {
        *slot.borrow_mut() = Some(ErrorRecord {
            file,
            line,
            function,
            errno_val,
            short_msg,
        })
    });
}

/// Whether an error has been recorded on this thread since the last `clear`.
pub fn is_error() -> bool {
    LAST_ERROR.with(|slot| slot.borrow().is_some())
}

/// The full formatted error, or an empty string if none is recorded.
pub fn get_error() -> String {
    LAST_ERROR.with(|slot| match &*slot.borrow() {
        Some(e) => format!("{}:{} {}: {}", e.file, e.line, e.function, e.short_msg),
        None => String::new(),
    })
}

/// The source file of the last recorded error.
pub fn get_file() -> &'static str {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map(|e| e.file).unwrap_or(""))
}

/// The source line of the last recorded error.
pub fn get_file_line() -> u32 {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map(|e| e.line).unwrap_or(0))
}

/// The function name of the last recorded error.
pub fn get_func() -> &'static str {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map(|e| e.function).unwrap_or(""))
}

/// The `errno`-style status code of the last recorded error, 0 if none.
pub fn get_errno() -> i32 {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map(|e| e.errno_val).unwrap_or(0))
}

/// The short message of the last recorded error.
pub fn get_msg() -> String {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|e| e.short_msg.clone())
            .unwrap_or_default()
    })
}

/// The short message with the `errno` value appended in parentheses.
pub fn get_errno_msg() -> String {
    LAST_ERROR.with(|slot| match &*slot.borrow() {
        Some(e) if e.errno_val != 0 => format!("{} ({})", e.short_msg, e.errno_val),
        Some(e) => e.short_msg.clone(),
        None => String::new(),
    })
}

/// Clears the recorded error on this thread.
pub fn clear() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

/// Records a plain error at the call site.
macro_rules! record_error {
    ($msg:expr) => {
        $crate::last_error::set_error(file!(), line!(), module_path!(), $msg)
    };
}

/// Records an `errno`-carrying error at the call site.
macro_rules! record_errno_error {
    ($errno:expr, $msg:expr) => {
        $crate::last_error::set_errno_error(file!(), line!(), module_path!(), $errno, $msg)
    };
}

pub(crate) use record_errno_error;
pub(crate) use record_error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_clears() {
        clear();
        assert!(!is_error());
        set_error("f.rs", 12, "func", "boom");
        assert!(is_error());
        assert_eq!(get_file(), "f.rs");
        assert_eq!(get_file_line(), 12);
        assert_eq!(get_func(), "func");
        assert_eq!(get_msg(), "boom");
        clear();
        assert!(!is_error());
    }

    #[test]
    fn errno_variant_carries_code() {
        clear();
        set_errno_error("f.rs", 1, "func", 5, "nope");
        assert_eq!(get_errno(), 5);
        assert_eq!(get_errno_msg(), "nope (5)");
        clear();
    }
}
