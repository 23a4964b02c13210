//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the tiny-research CLI.
//! Progress and diagnostics go to stderr so the report on stdout can be piped.

use crate::workflows::WorkflowOutput;
use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the banner
    pub fn banner(&self) {
        if self.colored {
            eprintln!(
                "\n   {} {}\n",
                "tiny-research".bright_cyan().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            eprintln!("\n   tiny-research v{}\n", env!("CARGO_PKG_VERSION"));
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✓".green().bold(), message.green());
        } else {
            eprintln!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "•".blue(), message);
        } else {
            eprintln!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            eprintln!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            eprintln!("\n  {}", title.bright_white().bold().underline());
        } else {
            eprintln!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            eprintln!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            eprintln!("    {}: {}", key, value);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            eprintln!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            eprintln!("\n  [TIP] {}", message);
        }
    }

    /// Print the final report to stdout, unstyled.
    pub fn report(&self, report: &str) {
        println!("{}", report);
    }

    /// Print one row per stage invocation of a finished run.
    pub fn trace(&self, output: &WorkflowOutput) {
        self.header("Trace");
        let rows: Vec<[String; 3]> = output
            .reasoning_path
            .iter()
            .enumerate()
            .map(|(i, step)| {
                [
                    (i + 1).to_string(),
                    step.agent.to_string(),
                    format!("{} ms", step.duration_ms),
                ]
            })
            .collect();

        let header = format!("{:<6}{:<16}{}", "#", "Stage", "Duration");
        if self.colored {
            eprintln!("    {}", header.bright_white().bold());
            eprintln!("    {}", "─".repeat(32).dimmed());
        } else {
            eprintln!("    {}", header);
            eprintln!("    {}", "-".repeat(32));
        }
        for [n, stage, duration] in &rows {
            eprintln!("    {:<6}{:<16}{}", n, stage, duration);
        }

        self.kv("stages", &output.agents_used.join(", "));
        self.kv("plan iterations", &output.plan_iterations.to_string());
    }
}
