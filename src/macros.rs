/// Prints a timestamped progress line to stdout, like `info!` in tracing.
/// Pass a starting time first and the elapsed runtime is appended.
/// ```ignore
/// info_time!("cell {} done", label);
/// let time = Local::now();
/// info_time!(time, "cell {} done", label);
/// ```
#[macro_export]
macro_rules! info_time {
    ($strfm:literal $(,)? $($arg:expr),*) => {{
        println!("{}", $crate::macros::stamp(None, format!($strfm, $($arg),*)));
    }};
    ($time:expr, $strfm:literal $(,)? $($arg:expr),*) => {{
        println!("{}", $crate::macros::stamp(Some($time), format!($strfm, $($arg),*)));
    }};
}

/// Same as [`info_time!`] but goes to stderr and is marked as a warning.
/// Used for outcomes that are deliberately incomplete.
#[macro_export]
macro_rules! warn_time {
    ($strfm:literal $(,)? $($arg:expr),*) => {{
        eprintln!("{}", $crate::macros::stamp(None, format!("WARN {}", format!($strfm, $($arg),*))));
    }};
    ($time:expr, $strfm:literal $(,)? $($arg:expr),*) => {{
        eprintln!("{}", $crate::macros::stamp(Some($time), format!("WARN {}", format!($strfm, $($arg),*))));
    }};
}

#[doc(hidden)]
pub fn stamp(start: Option<chrono::DateTime<chrono::Local>>, msg: String) -> String {
    let local_now = chrono::Local::now();
    match start {
        None => format!("{:<30} : {}", local_now, msg),
        Some(start) => {
            let run_time = (local_now - start)
                .num_microseconds()
                .map(|n| n as f64 / 1_000_000.0)
                .unwrap_or(0.0);
            format!("{:<30} : {}\nRUNTIME: {} sec", local_now, msg, run_time)
        }
    }
}
