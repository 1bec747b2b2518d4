//! Terminal rendering for status, files, transcript and settings.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use console::style;
use playground_client::{
    AttachedFile, Outcome, Rejection, Settings, SettingsField, StatusIndicator, StatusView,
    TranscriptEntry,
};
use playground_protocol::Role;

pub fn status_line(view: &StatusView) -> String {
    let indicator = match view.indicator {
        StatusIndicator::Busy => style(view.indicator.as_str()).red().bold(),
        StatusIndicator::IdleNoSession => style(view.indicator.as_str()).dim(),
        StatusIndicator::IdleSessionActive => style(view.indicator.as_str()).green().bold(),
    };
    let loaded = if view.assistant_id.is_empty() {
        String::new()
    } else {
        format!("{}  ", style("ASSISTANT LOADED").green())
    };
    format!(
        "[{indicator}] {loaded}ASSISTANT ID: {}  THREAD ID: {}  FILES LOADED: {}",
        or_dash(&view.assistant_id),
        or_dash(&view.thread_id),
        view.files.len()
    )
}

pub fn print_status(view: &StatusView) {
    println!("  {}", status_line(view));
}

pub fn print_files(files: &[AttachedFile]) {
    if files.is_empty() {
        println!("  No files uploaded.");
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "FILE"]);
    for file in files {
        table.add_row(vec![file.id.as_str(), file.name.as_str()]);
    }
    println!("{table}");
}

pub fn print_transcript(entries: &[TranscriptEntry]) {
    if entries.is_empty() {
        println!("  Transcript is empty.");
        return;
    }
    for entry in entries {
        print_entry(entry);
    }
}

pub fn print_entry(entry: &TranscriptEntry) {
    let header = match entry.role {
        Role::User => style("user").cyan().bold(),
        Role::Assistant => style("assistant").green().bold(),
    };
    println!();
    println!("{header}");
    println!("{}", entry.content);
    if let Some(image) = &entry.image {
        println!("{} {}", style("[image]").dim(), image);
    }
}

pub fn print_settings(settings: &Settings) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for field in SettingsField::ALL {
        table.add_row(vec![field.as_str(), settings.field(field)]);
    }
    println!("{table}");
    println!(
        "  {} You can provide a comma separated list of files.",
        style("Note:").yellow().bold()
    );
}

pub fn print_outcome(operation: &str, outcome: Outcome) {
    match outcome {
        Outcome::Completed => println!("  {} {operation} completed", style("✓").green()),
        Outcome::Busy => println!(
            "  {} another request is in flight; {operation} skipped",
            style("…").yellow()
        ),
        Outcome::Declined => println!("  {operation} cancelled"),
        // Failures are only in the log; the status line shows what changed.
        Outcome::Failed => println!("  {operation} did not complete"),
    }
}

pub fn print_rejection(rejection: Rejection) {
    println!("  {} {rejection}", style("!").red().bold());
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_shows_dashes_without_session() {
        console::set_colors_enabled(false);
        let view = StatusView {
            indicator: StatusIndicator::IdleNoSession,
            assistant_id: String::new(),
            thread_id: String::new(),
            files: Vec::new(),
        };
        assert_eq!(
            status_line(&view),
            "[idle-no-session] ASSISTANT ID: -  THREAD ID: -  FILES LOADED: 0"
        );
    }

    #[test]
    fn status_line_marks_loaded_assistant() {
        console::set_colors_enabled(false);
        let view = StatusView {
            indicator: StatusIndicator::IdleSessionActive,
            assistant_id: "asst_1".to_string(),
            thread_id: "thread_1".to_string(),
            files: vec![AttachedFile {
                id: "file-1".to_string(),
                name: "f1.csv".to_string(),
            }],
        };
        let line = status_line(&view);
        assert!(line.starts_with("[idle-session-active] ASSISTANT LOADED"));
        assert!(line.ends_with("THREAD ID: thread_1  FILES LOADED: 1"));
    }
}
