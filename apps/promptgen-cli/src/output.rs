//! Output formatting and display for promptgen CLI.
//!
//! Status messages go to stderr; command results go to stdout so they can
//! be piped.

use promptgen_core::{DeleteReport, FailedRemoval, HistoryEntry, Template, TemplateSummary};

/// Output formatter for CLI messages.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Use colors in status output.
    colors_enabled: bool,
}

impl OutputFormatter {
    /// Create a new output formatter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new output formatter with color control.
    #[must_use]
    #[allow(dead_code)]
    pub const fn with_colors(mut self, colors_enabled: bool) -> Self {
        self.colors_enabled = colors_enabled;
        self
    }

    /// Print a success message.
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", self.paint("32", "✓"), message);
    }

    /// Print a warning message.
    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", self.paint("33", "⚠"), message);
    }

    /// Print an info message.
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", self.paint("36", "ℹ"), message);
    }

    /// Print template content under a header.
    pub fn template(&self, header: &str, template: &Template) {
        eprintln!("{}\n", self.paint("1", header));
        println!("{}", template.content);
    }

    /// Print a generated prompt.
    pub fn prompt(&self, version: u32, text: &str) {
        eprintln!(
            "{}\n",
            self.paint("1", &format!("Generated prompt (from template version {version}):"))
        );
        println!("{text}");
    }

    /// Print the template list.
    pub fn template_list(&self, templates: &[TemplateSummary]) {
        if templates.is_empty() {
            self.info("No templates found.");
            return;
        }
        eprintln!("{}", self.paint("1", "Templates:"));
        for summary in templates {
            println!("{}", format_summary(summary));
        }
    }

    /// Print the versions of one template.
    pub fn version_list(&self, name: &str, versions: &[u32]) {
        if versions.is_empty() {
            self.info(&format!("No versions found for template '{name}'"));
            return;
        }
        eprintln!("{}", self.paint("1", &format!("Versions for template '{name}':")));
        for version in versions {
            println!("Version {version}");
        }
    }

    /// Report the outcome of deleting a template.
    pub fn deletion(&self, name: &str, report: &DeleteReport) {
        if !report.is_partial() {
            self.success(&format!("Deleted template and all versions: {name}"));
            return;
        }
        for failure in &report.failed {
            self.warning(&format_failed_removal(failure));
        }
        self.warning(&format_partial_delete(name, report));
    }

    /// Print generation history.
    pub fn history(&self, entries: &[HistoryEntry]) {
        if entries.is_empty() {
            self.info("No history found.");
            return;
        }
        eprintln!("{}", self.paint("1", "Prompt generation history:"));
        for entry in entries {
            println!("{}", format_history_entry(entry));
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.colors_enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        // Colors only apply to status output on stderr
        let colors_enabled = atty::is(atty::Stream::Stderr);
        Self { colors_enabled }
    }
}

fn format_summary(summary: &TemplateSummary) -> String {
    format!(" - {} (version {})", summary.name, summary.version)
}

fn format_failed_removal(failure: &FailedRemoval) -> String {
    format!("Could not delete {}: {}", failure.path.display(), failure.error)
}

fn format_partial_delete(name: &str, report: &DeleteReport) -> String {
    format!(
        "Template '{name}' only partially deleted ({} of {} records removed).",
        report.removed_count(),
        report.removed_count() + report.failed.len()
    )
}

fn format_history_entry(entry: &HistoryEntry) -> String {
    format!(
        "{}  {} (version {})",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        entry.name,
        entry.version
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_formatter() {
        let formatter = OutputFormatter::new().with_colors(false);
        // Just test that it doesn't panic
        formatter.success("Test success");
        formatter.warning("Test warning");
        formatter.info("Test info");
        formatter.template_list(&[]);
        formatter.version_list("sum", &[]);
        formatter.history(&[]);
    }

    #[test]
    fn test_paint() {
        assert_eq!(OutputFormatter::new().with_colors(false).paint("1", "x"), "x");
        assert_eq!(
            OutputFormatter::new().with_colors(true).paint("1", "x"),
            "\x1b[1mx\x1b[0m"
        );
    }

    #[test]
    fn test_format_summary() {
        let summary = Template::first("sum", "x").next("y").unwrap().summary();
        assert_eq!(format_summary(&summary), " - sum (version 2)");
    }

    #[test]
    fn test_partial_delete_messages() {
        let report = DeleteReport {
            removed: vec!["/s/sum.json".into(), "/s/sum_v1.json".into()],
            failed: vec![FailedRemoval {
                path: "/s/sum_v2.json".into(),
                error: "Permission denied (os error 13)".to_string(),
            }],
        };
        assert_eq!(
            format_failed_removal(&report.failed[0]),
            "Could not delete /s/sum_v2.json: Permission denied (os error 13)"
        );
        assert_eq!(
            format_partial_delete("sum", &report),
            "Template 'sum' only partially deleted (2 of 3 records removed)."
        );

        let formatter = OutputFormatter::new().with_colors(false);
        formatter.deletion("sum", &report);
        formatter.deletion("sum", &DeleteReport::default());
    }

    #[test]
    fn test_format_history_entry() {
        let mut entry = HistoryEntry::now("sum", 3);
        entry.timestamp = "2024-05-01T12:30:00Z".parse().unwrap();
        assert_eq!(
            format_history_entry(&entry),
            "2024-05-01 12:30:00 UTC  sum (version 3)"
        );
    }
}
