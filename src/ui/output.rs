use crate::ui::Icons;
use owo_colors::{OwoColorize, Style};
use std::sync::OnceLock;

static STYLES: OnceLock<Styles> = OnceLock::new();

/// Console styles. Plain when stdout isn't a terminal or `NO_COLOR` is set.
struct Styles {
    header: Style,
    success: Style,
    error: Style,
    warn: Style,
    info: Style,
    dim: Style,
}

impl Styles {
    fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        if no_color || !console::Term::stdout().is_term() {
            return Self {
                header: Style::new(),
                success: Style::new(),
                error: Style::new(),
                warn: Style::new(),
                info: Style::new(),
                dim: Style::new(),
            };
        }
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            dim: Style::new().white().dimmed(),
        }
    }
}

fn styles() -> &'static Styles {
    STYLES.get_or_init(Styles::detect)
}

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(styles().header));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(styles().success));
}

/// Fatal failures: the store could not be opened or bootstrapped
pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(styles().error));
}

/// Rejected requests (bad input, missing row); the store itself is fine
pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(styles().warn));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(styles().info),
        label.style(styles().dim),
        value
    );
}

pub fn dim(text: &str) -> String {
    text.style(styles().dim).to_string()
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(styles().dim), value);
}
