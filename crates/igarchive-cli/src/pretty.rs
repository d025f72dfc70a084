//! Pretty terminal output formatting for igarchive CLI.

use chrono::{DateTime, Utc};
use console::{Style, Term, style};
use igarchive_core::models::{Connection, MediaItem, MediaKind, RelationKind};

use crate::ingest::IngestOutcome;

/// Terminal width for formatting, with fallback.
fn term_width() -> usize {
    usize::from(Term::stdout().size().1)
}

/// Format a relative time string (e.g., "2 days ago", "just now").
fn relative_time(dt: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(dt);

    if duration.num_seconds() < 60 {
        return "just now".to_string();
    }
    if duration.num_minutes() < 60 {
        let mins = duration.num_minutes();
        return format!("{mins} min{s} ago", s = if mins == 1 { "" } else { "s" });
    }
    if duration.num_hours() < 24 {
        let hours = duration.num_hours();
        return format!("{hours} hour{s} ago", s = if hours == 1 { "" } else { "s" });
    }
    if duration.num_days() < 7 {
        let days = duration.num_days();
        return format!("{days} day{s} ago", s = if days == 1 { "" } else { "s" });
    }

    dt.format("%Y-%m-%d").to_string()
}

fn kind_style(kind: RelationKind) -> Style {
    match kind {
        RelationKind::Follower | RelationKind::Following => Style::new().cyan().bold(),
        RelationKind::CloseFriend | RelationKind::Contact => Style::new().green().bold(),
        RelationKind::Blocked | RelationKind::Restricted | RelationKind::StoryHiddenFrom => {
            Style::new().red().bold()
        }
        _ => Style::new().yellow(),
    }
}

fn separator() -> String {
    "─".repeat(term_width().clamp(20, 80))
}

/// Print the outcome of an ingest run.
pub fn print_ingest_outcome(outcome: &IngestOutcome) {
    let report = &outcome.report;
    println!(
        "{} {}",
        style("Ingested").bold().white(),
        style(outcome.archive.display()).cyan()
    );
    println!("{}", style(separator()).dim());
    println!("User:                 {}", outcome.user_id);
    if let Some(files) = outcome.extracted {
        println!("Files extracted:      {files}");
    }
    println!("Entries seen:         {}", report.entries_seen);
    println!("Entries recognized:   {}", report.entries_recognized);
    println!("Entries unrecognized: {}", report.entries_unrecognized);
    println!("Records written:      {}", report.facts_written);

    if report.is_complete() {
        println!("{}", style("All recognized entries ingested.").green());
    } else {
        println!(
            "{}",
            style(format!(
                "{} entr{} skipped, {} record{} failed (see log)",
                report.entries_failed,
                if report.entries_failed == 1 { "y" } else { "ies" },
                report.facts_failed,
                if report.facts_failed == 1 { "" } else { "s" },
            ))
            .yellow()
        );
    }
}

/// Per-kind row counts for one user.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct UserStats {
    pub user_id: i64,
    pub media: Vec<(MediaKind, i64)>,
    pub connections: Vec<(RelationKind, i64)>,
}

pub fn print_stats(stats: &UserStats) {
    println!(
        "{}",
        style(format!("Statistics for user {}", stats.user_id)).bold()
    );
    println!("{}", style(separator()).dim());
    for (kind, count) in &stats.media {
        let label = match kind {
            MediaKind::Post => "posts",
            MediaKind::Story => "stories",
        };
        println!("{label:<24}{count}");
    }
    for (kind, count) in stats.connections.iter().filter(|(_, count)| *count > 0) {
        println!("{:<24}{count}", kind_style(*kind).apply_to(kind));
    }
}

pub fn print_media(items: &[MediaItem]) {
    if items.is_empty() {
        println!("{}", style("No media found.").dim());
        return;
    }
    for item in items {
        let caption = if item.caption.is_empty() {
            style("(no caption)".to_string()).dim()
        } else {
            style(item.caption.replace('\n', " "))
        };
        println!(
            "{:<6} {} {} {caption}",
            item.media_type,
            style(relative_time(item.taken_at)).dim().italic(),
            style(&item.uri).cyan(),
        );
    }
}

pub fn print_connections(connections: &[Connection]) {
    if connections.is_empty() {
        println!("{}", style("No connections found.").dim());
        return;
    }
    for conn in connections {
        let info = conn
            .contact_info
            .as_deref()
            .filter(|info| !info.is_empty())
            .map(|info| format!(" <{info}>"))
            .unwrap_or_default();
        println!(
            "{} {}{info} {}",
            kind_style(conn.connection_type).apply_to(conn.connection_type),
            conn.username,
            style(relative_time(conn.timestamp)).dim().italic(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_time_just_now() {
        let now = Utc::now();
        assert_eq!(relative_time(now), "just now");
    }

    #[test]
    fn test_relative_time_old_dates_are_absolute() {
        let old = DateTime::from_timestamp(1_500_000_000, 0).expect("valid timestamp");
        assert_eq!(relative_time(old), "2017-07-14");
    }
}
