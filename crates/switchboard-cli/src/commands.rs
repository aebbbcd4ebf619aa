//! Command handlers for the switchboard CLI

use std::path::{Path, PathBuf};
use std::time::Duration;

use switchboard_core::loader::{self, format_duration, format_timestamp};
use switchboard_core::SearchField;
use switchboard_runtime::{SearchHit, TrafficReport};
use tracing::{info, warn};

use crate::app::{read_optional, SwitchboardApp};
use crate::cli::Commands;
use crate::config::AppConfig;
use crate::error::Result;

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(command: Commands, mut app: SwitchboardApp) -> Result<()> {
        match command {
            Commands::Search { field, text, limit } => {
                let limit = limit.unwrap_or(app.config.engine.search.search_limit);
                let hits = app.engine.search_by_prefix(field, &text, limit);
                Self::print_hits(&app, &hits);
                if hits.is_empty() {
                    Self::print_suggestions(&app, field, &text);
                }
                Ok(())
            }
            Commands::Autocomplete {
                field,
                prefix,
                limit,
            } => {
                let limit = limit.unwrap_or(app.config.engine.search.autocomplete_limit);
                let hits = app.engine.autocomplete(field, &prefix, limit);
                Self::print_hits(&app, &hits);
                Ok(())
            }
            Commands::History { number } => {
                Self::handle_history_command(&app, &number);
                Ok(())
            }
            Commands::Between { first, second } => {
                Self::handle_between_command(&app, &first, &second);
                Ok(())
            }
            Commands::Top { n } => {
                for (i, (number, score)) in app.engine.top_n(n).iter().enumerate() {
                    println!("{}) {} score={:.1}", i + 1, app.engine.display_name(number), score);
                }
                Ok(())
            }
            Commands::Suggest { query, names } => {
                if names {
                    Self::print_suggestions(&app, SearchField::FirstName, &query);
                } else {
                    Self::print_suggestions(&app, SearchField::Number, &query);
                }
                Ok(())
            }
            Commands::Simulate { file, limit } => {
                Self::handle_simulate_command(&app, file, limit)?;
                app.persist()
            }
            Commands::Stress { seconds, calls } => {
                Self::handle_stress_command(&mut app, seconds, calls).await?;
                app.persist()
            }
            Commands::Save { output } => app.save_to(Path::new(&output)),
            Commands::ExampleConfig => {
                print!("{}", AppConfig::example_config());
                Ok(())
            }
        }
    }

    fn handle_history_command(app: &SwitchboardApp, number: &str) {
        let number = number.trim();
        if app.engine.contact(number).is_none() {
            println!("[!] Number not found in contacts");
            Self::print_suggestions(app, SearchField::Number, number);
        }

        let records = app.engine.history_for(number);
        if records.is_empty() {
            println!("No call history for {}", number);
            return;
        }
        for record in records {
            let role = if record.caller.as_str() == number {
                "caller"
            } else {
                "callee"
            };
            println!(
                "{} | {} {} <-> {} | {}",
                format_timestamp(&record.start_time),
                role,
                number,
                record.counterpart(number),
                format_duration(record.duration)
            );
        }
    }

    fn handle_between_command(app: &SwitchboardApp, first: &str, second: &str) {
        for number in [first, second] {
            if app.engine.contact(number).is_none() {
                println!("[!] Number {} not found in contacts", number.trim());
                Self::print_suggestions(app, SearchField::Number, number);
            }
        }

        let records = app.engine.history_between(first, second);
        if records.is_empty() {
            println!("No call history between {} and {}", first.trim(), second.trim());
            return;
        }
        for record in records {
            println!(
                "{} | {}->{} | {}",
                format_timestamp(&record.start_time),
                record.caller,
                record.callee,
                format_duration(record.duration)
            );
        }
    }

    fn handle_simulate_command(app: &SwitchboardApp, file: Option<String>, limit: usize) -> Result<()> {
        let path = file
            .map(PathBuf::from)
            .unwrap_or_else(|| app.config.paths.calls.clone());
        let Some(text) = read_optional(&path)? else {
            return Ok(());
        };

        let summary = app
            .engine
            .simulate_calls(loader::parse_calls(&text, Some(limit)));
        println!(
            "Simulated {} calls: {} accepted, {} rejected",
            summary.accepted + summary.rejected,
            summary.accepted,
            summary.rejected
        );
        Ok(())
    }

    async fn handle_stress_command(app: &mut SwitchboardApp, seconds: u64, calls: u64) -> Result<()> {
        app.engine
            .start_traffic(Duration::from_secs(seconds), calls)?;
        println!(
            "Stress test started: duration {}s, target {} calls (Ctrl-C to stop)",
            seconds, calls
        );

        let interrupted = tokio::select! {
            _ = app.engine.wait_traffic() => false,
            _ = tokio::signal::ctrl_c() => true,
        };
        if interrupted {
            info!("Interrupted, stopping traffic generator");
            if let Err(e) = app.engine.stop_traffic().await {
                warn!("Failed to stop traffic generator cleanly: {}", e);
            }
        }

        let report = app.engine.traffic_report();
        Self::print_report(app, &report);
        Ok(())
    }

    fn print_hits(app: &SwitchboardApp, hits: &[SearchHit]) {
        for (i, hit) in hits.iter().enumerate() {
            let name = match &hit.contact {
                Some(contact) => contact.to_string(),
                None => app.engine.display_name(&hit.number),
            };
            println!("{}) {}  [score={:.1}]", i + 1, name, hit.score);
        }
    }

    fn print_suggestions(app: &SwitchboardApp, field: SearchField, query: &str) {
        let suggestions: Vec<String> = match field {
            SearchField::Number => app
                .engine
                .suggest_numbers(query)
                .iter()
                .map(ToString::to_string)
                .collect(),
            SearchField::FirstName | SearchField::LastName => app
                .engine
                .suggest_names(query)
                .into_iter()
                .map(|suggestion| format!("{} ({})", suggestion.full_name, suggestion.number))
                .collect(),
        };
        if !suggestions.is_empty() {
            println!("Did you mean: {}", suggestions.join(", "));
        }
    }

    fn print_report(app: &SwitchboardApp, report: &TrafficReport) {
        println!("----- Stress test report -----");
        println!("Generated: {}", report.generated);
        println!("Accepted: {}", report.accepted);
        println!("Blocked: {}", report.blocked);
        println!("Average duration (s): {:.2}", report.average_duration_secs);
        println!("Top {} most popular (score):", report.top.len());
        for (i, (number, score)) in report.top.iter().enumerate() {
            println!("{}) {} -> score={:.2}", i + 1, app.engine.display_name(number), score);
        }
        println!("{}", "-".repeat(30));
    }
}
