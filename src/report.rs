//! Sync run summary

use colored::Colorize;
use std::fmt::Write;

use crate::linker::{OutcomeStatus, SyncReport};

pub const NOTHING_SELECTED: &str = "No platforms selected.";

/// Render one line per platform, in config order, followed by the count line
pub fn render_summary(report: &SyncReport) -> String {
    if report.is_empty() {
        return format!("{}\n", NOTHING_SELECTED.yellow());
    }

    let mut output = String::new();

    for outcome in &report.outcomes {
        let note = match &outcome.status {
            OutcomeStatus::Failed { error } => {
                let _ = writeln!(
                    output,
                    "  {} {}: {}: {}",
                    "✘".red(),
                    outcome.name,
                    outcome.target.display(),
                    error
                );
                continue;
            }
            OutcomeStatus::Linked => "",
            OutcomeStatus::Copied => " (copy)",
            OutcomeStatus::Shared => " (shared)",
            OutcomeStatus::Planned => " (planned)",
        };
        let _ = writeln!(
            output,
            "  {} {}: {}{}",
            "✔".green(),
            outcome.name,
            outcome.target.display(),
            note.dimmed()
        );
    }

    let verb = if report.is_dry_run() {
        "Would sync"
    } else {
        "Synced"
    };
    let count = format!(
        "{verb} to {}/{} platform(s)",
        report.success_count(),
        report.total()
    );
    let _ = writeln!(output, "\n{}", count.bold());

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::SyncOutcome;
    use std::path::PathBuf;

    fn outcome(name: &str, target: &str, status: OutcomeStatus) -> SyncOutcome {
        SyncOutcome {
            id: name.to_lowercase(),
            name: name.to_string(),
            target: PathBuf::from(target),
            status,
        }
    }

    #[test]
    fn test_render_empty_report() {
        colored::control::set_override(false);
        assert_eq!(
            render_summary(&SyncReport::default()),
            "No platforms selected.\n"
        );
    }

    #[test]
    fn test_render_mixed_report() {
        colored::control::set_override(false);
        let report = SyncReport {
            outcomes: vec![
                outcome("Claude", "CLAUDE.MD", OutcomeStatus::Linked),
                outcome(
                    "Broken",
                    "x/X.MD",
                    OutcomeStatus::Failed {
                        error: "Permission denied".to_string(),
                    },
                ),
                outcome("Codex", "AGENTS.MD", OutcomeStatus::Shared),
            ],
        };

        let rendered = render_summary(&report);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "  ✔ Claude: CLAUDE.MD");
        assert_eq!(lines[1], "  ✘ Broken: x/X.MD: Permission denied");
        assert_eq!(lines[2], "  ✔ Codex: AGENTS.MD (shared)");
        assert_eq!(lines.last(), Some(&"Synced to 2/3 platform(s)"));
    }

    #[test]
    fn test_render_dry_run_count() {
        colored::control::set_override(false);
        let report = SyncReport {
            outcomes: vec![outcome("Aider", "AIDER.MD", OutcomeStatus::Planned)],
        };

        let rendered = render_summary(&report);

        assert!(rendered.contains("AIDER.MD (planned)"));
        assert!(rendered.contains("Would sync to 1/1 platform(s)"));
    }
}
