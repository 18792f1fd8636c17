//! Terminal styling: semantic colors, status lines and tables.

use std::sync::atomic::{AtomicBool, Ordering};

use owo_colors::{OwoColorize, Style};

mod table;

pub use table::{print_report, print_table};

static NO_COLOR: AtomicBool = AtomicBool::new(false);

pub fn set_no_color(value: bool) {
    NO_COLOR.store(value, Ordering::SeqCst);
}

pub fn no_color() -> bool {
    NO_COLOR.load(Ordering::SeqCst)
}

fn paint(text: &impl std::fmt::Display, style: Style) -> String {
    if no_color() {
        text.to_string()
    } else {
        text.style(style).to_string()
    }
}

/// Semantic styles for any displayable value.
pub trait Paint: std::fmt::Display + Sized {
    fn success(&self) -> String {
        paint(self, Style::new().green().bold())
    }

    fn failure(&self) -> String {
        paint(self, Style::new().red().bold())
    }

    fn warning(&self) -> String {
        paint(self, Style::new().yellow())
    }

    fn muted(&self) -> String {
        paint(self, Style::new().dimmed())
    }

    fn header(&self) -> String {
        paint(self, Style::new().bold())
    }

    fn code(&self) -> String {
        paint(self, Style::new().blue())
    }
}

impl<T: std::fmt::Display> Paint for T {}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".success(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".failure(), msg);
}

pub fn print_warn(msg: &str) {
    eprintln!("{} {}", "⚠".warning(), msg);
}

pub fn print_labeled(key: &str, value: &str) {
    println!("  {}: {}", key.muted(), value);
}
