//! Progress lines and the failure banner.
//!
//! Progress goes to stdout with a magenta `[automation] ` prefix so it interleaves with the output of the tools
//! being driven. Colors are dropped when `NO_COLOR` is set.

use std::env;
use std::time::Duration;

const MAGENTA: &str = "\x1b[35m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

const PREFIX: &str = "[automation] ";

/// Longest command echoed in a progress line.
pub const MAX_COMMAND_LEN: usize = 150;

pub const FAILURE_BANNER: &str = " !!! AUTOMATION: FAILED !!!";

/// Whether ANSI colors should be emitted.
pub fn color_enabled() -> bool {
    env::var_os("NO_COLOR").is_none_or(|v| v.is_empty())
}

fn paint(color: &str, text: &str) -> String {
    if color_enabled() {
        format!("{color}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// Keep the first `limit` characters of `text`, marking a cut with a trailing `...`.
pub fn limit_str_length(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push_str("...");
    out
}

/// Render a step-start line without printing it.
pub fn format_step(label: &str, command: &str) -> String {
    format!(
        "{}{} > {}",
        paint(MAGENTA, PREFIX),
        label,
        limit_str_length(command, MAX_COMMAND_LEN)
    )
}

/// Render a step-completion line without printing it.
pub fn format_done(label: &str, elapsed: Duration) -> String {
    format!("{}done: {} ({:.2}s)", paint(MAGENTA, PREFIX), label, elapsed.as_secs_f64())
}

pub fn step(label: &str, command: &str) {
    println!("{}", format_step(label, command));
}

pub fn done(label: &str, elapsed: Duration) {
    println!("{}", format_done(label, elapsed));
}

pub fn info(message: &str) {
    println!("{}{}", paint(MAGENTA, PREFIX), message);
}

/// Print the red failure banner on stderr.
pub fn failure_banner() {
    eprintln!("{}", paint(RED, FAILURE_BANNER));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_commands_are_untouched() {
        assert_eq!(limit_str_length("javac -g Main.java", 150), "javac -g Main.java");
    }

    #[test]
    fn test_long_commands_keep_limit_chars_then_ellipsis() {
        let long = "x".repeat(200);
        let cut = limit_str_length(&long, MAX_COMMAND_LEN);
        assert_eq!(cut.chars().count(), MAX_COMMAND_LEN + 3);
        assert_eq!(cut, format!("{}...", "x".repeat(MAX_COMMAND_LEN)));
        assert_eq!(limit_str_length("abcdef", 6), "abcdef");
        assert_eq!(limit_str_length("abcdefg", 6), "abcdef...");
    }

    #[test]
    fn test_step_line_names_label_and_command() {
        let line = format_step("compiling javac plugin", "mvn -f p/pom.xml clean:clean");
        assert!(line.contains("[automation] "));
        assert!(line.ends_with("compiling javac plugin > mvn -f p/pom.xml clean:clean"));
    }

    #[test]
    fn test_done_line_reports_seconds() {
        let line = format_done("running example", Duration::from_millis(1500));
        assert!(line.ends_with("done: running example (1.50s)"));
    }
}
