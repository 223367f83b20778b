//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use pnlog_errors::SourceError;
use pnlog_events::{LifecycleOutput, LogEvent, ProgressMessage, ProgressStatus, RootMessage};
use pnlog_reducer::{PackageSummary, RunSummary};
use pnlog_stream::Outcome;
use pnlog_types::{ColorChoice, LogLevel};
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render one decode outcome
    pub fn render_outcome(&self, position: usize, outcome: &Outcome) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string(&outcome_json(position, outcome))
                .map_err(io::Error::other)?;
            return self.term.write_line(&json);
        }

        let line = match outcome {
            Ok(record) => format!(
                "{:>6} {} {} {}",
                position,
                self.style_level(record.level),
                self.paint(&Style::new().bold(), record.name().qualified()),
                describe(&record.event)
            ),
            Err(err) => format!(
                "{:>6} {} {}",
                position,
                self.paint(&Style::new().red().bold(), "reject"),
                err
            ),
        };
        self.term.write_line(&line)
    }

    /// Closing line of `check`
    pub fn render_check_totals(&self, records: usize, rejected: usize) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::json!({ "records": records, "rejected": rejected });
            return self.term.write_line(&json.to_string());
        }

        let line = if rejected == 0 {
            self.paint(
                &Style::new().green(),
                &format!("[OK] {records} records, all valid"),
            )
        } else {
            self.paint(
                &Style::new().red(),
                &format!("[ERROR] {rejected} of {records} records rejected"),
            )
        };
        self.term.write_line(&line)
    }

    /// Report a read failure that cut the input short
    pub fn render_read_error(&self, err: &SourceError) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::json!({ "sourceError": err });
            return self.term.write_line(&json.to_string());
        }
        eprintln!("{}", self.paint(&Style::new().yellow(), &format!("Warning: {err}")));
        Ok(())
    }

    /// Render the folded run
    pub fn render_summary(&self, summary: &RunSummary) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        if summary.packages.is_empty() {
            println!("No package activity recorded.");
        } else {
            println!("{}", self.package_table(&summary.packages));
        }
        println!();

        let state = if summary.finished {
            self.paint(&Style::new().green(), "finished")
        } else {
            self.paint(&Style::new().yellow(), "unfinished")
        };
        println!("Run:          {state}");
        println!(
            "Resolution:   {}",
            if summary.resolution_done { "done" } else { "pending" }
        );
        println!(
            "Records:      {} ({} debug, {} info, {} warn, {} error)",
            summary.records,
            summary.levels.debug,
            summary.levels.info,
            summary.levels.warn,
            summary.levels.error
        );
        println!(
            "Packages:     {} ({} installed)",
            summary.totals.packages, summary.totals.installed
        );
        println!(
            "Downloaded:   {} of {}",
            format_size(summary.totals.downloaded_bytes),
            format_size(summary.totals.expected_bytes)
        );

        if summary.decode_errors.total() > 0 {
            println!(
                "Rejected:     {} ({} malformed, {} unknown name, {} schema)",
                summary.decode_errors.total(),
                summary.decode_errors.malformed_record,
                summary.decode_errors.unknown_event_name,
                summary.decode_errors.schema_violation
            );
        }

        for dep in &summary.added {
            println!(
                "  {} {} {} ({})",
                self.paint(&Style::new().green(), "+"),
                dep.name,
                dep.version,
                dep.dependency_type
            );
        }
        for dep in &summary.removed {
            println!(
                "  {} {} {} ({})",
                self.paint(&Style::new().red(), "-"),
                dep.name,
                dep.version.as_deref().unwrap_or(""),
                dep.dependency_type
            );
        }

        if !summary.deprecations.is_empty() {
            println!();
            println!("Deprecated:");
            for deprecation in &summary.deprecations {
                println!(
                    "  {}@{}: {}",
                    deprecation.pkg_name, deprecation.pkg_version, deprecation.deprecated
                );
            }
        }

        if !summary.anomalies.is_empty() {
            println!();
            println!("Out-of-order events:");
            for anomaly in &summary.anomalies {
                println!("  {anomaly:?}");
            }
        }

        Ok(())
    }

    fn package_table(&self, packages: &[PackageSummary]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if !self.supports_color() {
            table.force_no_tty();
        }

        table.set_header(vec![
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Downloaded").add_attribute(Attribute::Bold),
            Cell::new("Size").add_attribute(Attribute::Bold),
            Cell::new("Attempts").add_attribute(Attribute::Bold),
            Cell::new("Scripts").add_attribute(Attribute::Bold),
        ]);

        for package in packages {
            let progress = &package.progress;
            let scripts = progress
                .scripts
                .iter()
                .map(|(name, script)| match script.exit_code {
                    Some(code) => format!("{name}:{code}"),
                    None => name.clone(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            let mut id = Cell::new(&package.pkg_id);
            if progress.untracked {
                id = id.fg(Color::Yellow);
            }

            table.add_row(vec![
                id,
                format_status(progress.status),
                Cell::new(format_size(progress.downloaded)),
                Cell::new(progress.size.map_or_else(|| "-".to_string(), format_size)),
                Cell::new(progress.attempts),
                Cell::new(if scripts.is_empty() { "-".to_string() } else { scripts }),
            ]);
        }
        table
    }

    fn style_level(&self, level: LogLevel) -> String {
        let style = match level {
            LogLevel::Debug => Style::new().dim(),
            LogLevel::Info => Style::new().cyan(),
            LogLevel::Warn => Style::new().yellow(),
            LogLevel::Error => Style::new().red().bold(),
        };
        self.paint(&style, &format!("{:<5}", level.as_str()))
    }

    fn paint(&self, style: &Style, text: &str) -> String {
        if self.supports_color() {
            style.clone().force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

/// JSON line for one outcome of `decode`/`check`
pub fn outcome_json(position: usize, outcome: &Outcome) -> serde_json::Value {
    match outcome {
        Ok(record) => serde_json::json!({ "position": position, "record": record }),
        Err(err) => serde_json::json!({ "position": position, "error": err }),
    }
}

/// One-line human description of an event's payload
pub fn describe(event: &LogEvent) -> String {
    match event {
        LogEvent::Base(message) => {
            let text = message.message().unwrap_or("(no message)");
            if message.extra().is_empty() {
                text.to_string()
            } else {
                let keys: Vec<&str> = message.extra().keys().map(String::as_str).collect();
                format!("{text} [{}]", keys.join(", "))
            }
        }
        LogEvent::Progress(message) => describe_progress(message),
        LogEvent::Lifecycle(message) => match &message.output {
            LifecycleOutput::Line(line) => {
                format!("{} {}: {line}", message.pkg_id, message.script)
            }
            LifecycleOutput::ExitCode(code) => {
                format!("{} {} exited with {code}", message.pkg_id, message.script)
            }
        },
        LogEvent::InstallCheck(message) => format!("{}: {}", message.pkg_id, message.code),
        LogEvent::Deprecation(message) => format!(
            "{}@{} is deprecated: {}",
            message.pkg_name, message.pkg_version, message.deprecated
        ),
        LogEvent::Stage(stage) => stage.as_str().to_string(),
        LogEvent::Registry(message) => message.message.clone(),
        LogEvent::Root(RootMessage::Added(dep)) => {
            format!("+ {} {} ({})", dep.name, dep.version, dep.dependency_type)
        }
        LogEvent::Root(RootMessage::Removed(dep)) => match &dep.version {
            Some(version) => format!("- {} {version} ({})", dep.name, dep.dependency_type),
            None => format!("- {} ({})", dep.name, dep.dependency_type),
        },
        LogEvent::Summary(_) => "install finished".to_string(),
    }
}

fn describe_progress(message: &ProgressMessage) -> String {
    let status = message.status();
    match message {
        ProgressMessage::Milestone { pkg_id, .. } => format!("{status} {pkg_id}"),
        ProgressMessage::Resolved { pkg_id, pkg } => {
            format!("{status} {}@{} -> {pkg_id}", pkg.name, pkg.raw_spec)
        }
        ProgressMessage::Request { pkg, .. } => match &pkg.dependent_id {
            Some(dependent) => format!("{status} {}@{} for {dependent}", pkg.name, pkg.raw_spec),
            None => format!("{status} {}@{}", pkg.name, pkg.raw_spec),
        },
        ProgressMessage::FetchingStarted {
            pkg_id,
            size,
            attempt,
        } => {
            let size = size.map_or_else(|| "unknown size".to_string(), format_size);
            format!("{status} {pkg_id} ({size}, attempt {attempt})")
        }
        ProgressMessage::FetchingProgress { pkg_id, downloaded } => {
            format!("{status} {pkg_id} {}", format_size(*downloaded))
        }
        ProgressMessage::DownloadedManifest {
            pkg_id,
            pkg_version,
        } => format!("{status} {pkg_id} version {pkg_version}"),
    }
}

fn format_status(status: Option<ProgressStatus>) -> Cell {
    match status {
        None => Cell::new("-"),
        Some(status @ (ProgressStatus::Installed | ProgressStatus::DependenciesInstalled)) => {
            Cell::new(status).fg(Color::Green)
        }
        Some(status @ ProgressStatus::Error) => Cell::new(status).fg(Color::Red),
        Some(
            status @ (ProgressStatus::FetchingStarted
            | ProgressStatus::FetchingProgress
            | ProgressStatus::Fetched),
        ) => Cell::new(status).fg(Color::Yellow),
        Some(status) => Cell::new(status),
    }
}

#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{size:.0} {}", UNITS[unit_index])
    } else {
        format!("{size:.1} {}", UNITS[unit_index])
    }
}
