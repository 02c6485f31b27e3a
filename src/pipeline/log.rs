use tracing::info;

/// Human-readable run log returned to the caller.
///
/// Each line is also emitted as a tracing event.
#[derive(Debug, Default, Clone)]
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!(target: "kitchen_scraper::run", "{line}");
        self.lines.push(line);
    }

    /// Joins the lines with `\n` (no trailing newline).
    #[must_use]
    pub fn into_text(self) -> String {
        self.lines.join("\n")
    }
}
