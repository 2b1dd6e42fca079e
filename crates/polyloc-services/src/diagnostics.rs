//! User-facing rendering of fatal run errors.

use crate::Error;
use owo_colors::OwoColorize;
use std::io::IsTerminal;

pub const QUOTING_HINT: &str =
    "values containing reserved characters such as ':', '%', '{' or '}' must be quoted";

/// Render `err` for the error stream. Parse errors get the file, the line
/// when known, and a hint about quoting.
pub fn render(err: &Error, color: bool) -> String {
    match err {
        Error::Parse {
            path,
            line,
            message,
        } => {
            let location = match line {
                Some(l) => format!("{}:{}", path.display(), l),
                None => path.display().to_string(),
            };
            let head = format!("failed to parse {location}");
            let hint = format!("hint: {QUOTING_HINT}");
            if color {
                format!(
                    "{} {}\n  {}\n  {}\n  {}",
                    "✖".red(),
                    head.red().bold(),
                    message,
                    hint.cyan(),
                    "no output files were written".yellow()
                )
            } else {
                format!("✖ {head}\n  {message}\n  {hint}\n  no output files were written")
            }
        }
        Error::Write { failures } => {
            let mut out = format!("✖ {err}");
            for f in failures {
                out.push_str(&format!("\n  {} ({}): {}", f.path.display(), f.lang, f.error));
            }
            if color {
                out.red().to_string()
            } else {
                out
            }
        }
        other => {
            if color {
                format!("{} {}", "✖".red(), other)
            } else {
                format!("✖ {other}")
            }
        }
    }
}

/// Print `err` to stderr, colored when stderr is a terminal and `NO_COLOR`
/// is unset.
pub fn report(err: &Error) {
    let color = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    eprintln!("{}", render(err, color));
}
