pub use log::debug;

/// Log a debug message which can be forced on for a single traced item
///
/// The first argument is the trace flag. When true the message is printed directly to stderr,
/// otherwise it is only logged when the global debug log level is active.
///
/// # Examples
///
/// ```ignore
/// debug_msg!(sample.name == traced_name, "Sample {} mean depth {}", sample.name, x);
/// ```
macro_rules! debug_msg {
    ($flag:expr, $($arg:tt)+) => {
        if $flag {
            eprintln!($($arg)+);
        } else {
            $crate::log_utils::debug!($($arg)+);
        }
    }
}

pub(crate) use debug_msg;
