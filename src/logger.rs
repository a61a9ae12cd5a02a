use chrono::Utc;
use colored::*;

/// Module tags for log filtering and scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    Api,
    Cache,
    Store,
    Warmer,
    System,
}

impl LogTag {
    fn label(self) -> &'static str {
        match self {
            LogTag::Api => "API",
            LogTag::Cache => "CACHE",
            LogTag::Store => "STORE",
            LogTag::Warmer => "WARMER",
            LogTag::System => "SYSTEM",
        }
    }
}

/// Log a tagged message to the console.
///
/// # Example
/// ```rust
/// use printful_proxy::logger::{log, LogTag};
///
/// log(LogTag::Api, "INFO", "products endpoint ready");
/// ```
pub fn log(tag: LogTag, level: &str, message: &str) {
    let timestamp = format!("[{}]", Utc::now().format("%H:%M:%S"));

    match level {
        "ERROR" => println!(
            "{} {} {}",
            timestamp.dimmed(),
            tag.label().red().bold(),
            message.red()
        ),
        "WARN" => println!(
            "{} {} {}",
            timestamp.dimmed(),
            tag.label().yellow().bold(),
            message.yellow()
        ),
        "DEBUG" => println!(
            "{} {} {}",
            timestamp.dimmed(),
            tag.label().purple().bold(),
            message.dimmed()
        ),
        _ => println!("{} {} {}", timestamp.dimmed(), tag.label().blue().bold(), message),
    }
}
