mod prompt;
pub use prompt::{ask_confirm, ask_credentials};

use console::Term;
use std::sync::atomic::{AtomicBool, Ordering};

/// Width of the message prefix column, including the trailing space
const PREFIX_LEN: usize = 10;

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Right-align a (possibly styled) prefix into the prefix column
pub fn gen_prefix(prefix: &str) -> String {
    let width = console::measure_text_width(prefix);
    if width >= PREFIX_LEN {
        return format!("{prefix} ");
    }
    let padding = " ".repeat(PREFIX_LEN - width - 1);
    format!("{padding}{prefix} ")
}

pub fn writeln(prefix: &str, msg: &str) {
    let term = Term::stdout();
    let prefix = gen_prefix(prefix);
    let mut lines = msg.lines();
    let first = lines.next().unwrap_or_default();
    // Nowhere left to report a broken stdout
    let _ = term.write_line(&format!("{prefix}{first}"));
    for line in lines {
        let _ = term.write_line(&format!("{}{line}", gen_prefix("")));
    }
}

/// Width available for messages after the prefix column
pub fn get_max_len() -> usize {
    let (_, cols) = Term::stdout().size();
    (cols as usize).saturating_sub(PREFIX_LEN)
}

#[macro_export]
macro_rules! msg {
    ($prefix:expr, $($arg:tt)+) => {
        $crate::cli::writeln(&$prefix, &format!($($arg)+))
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        if $crate::cli::is_verbose() {
            $crate::msg!(console::style("DEBUG").dim().to_string(), $($arg)+);
        }
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::msg!(console::style("INFO").blue().bold().to_string(), $($arg)+);
    };
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)+) => {
        $crate::msg!(console::style("SUCCESS").green().bold().to_string(), $($arg)+);
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::msg!(console::style("WARNING").yellow().bold().to_string(), $($arg)+);
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        $crate::msg!(console::style("ERROR").red().bold().to_string(), $($arg)+);
    };
}

#[macro_export]
macro_rules! due_to {
    ($($arg:tt)+) => {
        $crate::msg!(console::style("DUE TO").yellow().bold().to_string(), $($arg)+);
    };
}
