use colored::*;

use crate::models::{
    date::{DateKey, Locale, format_date_label},
    store::TaskStore,
    task::Task,
};

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Get the appropriate status glyph for a task
pub fn get_status_glyph(task: &Task) -> ColoredString {
    if task.completed {
        "✓".green()
    } else {
        "○".normal()
    }
}

/// Plain text of a task line, numbered from 1
pub fn format_task_line(position: usize, task: &Task) -> String {
    let time = task
        .time
        .map(|t| t.to_string())
        .unwrap_or_else(|| " ".repeat(5));
    format!("{:>3}  {}  {}", position, time, task.text)
}

/// Render a day header with its label and task count
pub fn render_day_header(date: DateKey, count: usize, locale: Locale) {
    let task_word = if count == 1 { "task" } else { "tasks" };
    let label = format_date_label(date, None, locale);
    println!(
        "\n  {}  {}",
        label.cyan().bold(),
        format!("{} · {} {}", date, count, task_word).dimmed()
    );
}

/// Render a single task line with glyph, number, time and text
pub fn render_task_line(position: usize, task: &Task) {
    let line = format!("  {}  {}", get_status_glyph(task), format_task_line(position, task));
    if task.completed {
        println!("{}", line.dimmed());
    } else {
        println!("{}", line);
    }
}

/// Render every day in calendar order
pub fn render_store(store: &TaskStore, locale: Locale) {
    if store.is_empty() {
        println!("Nothing planned");
        return;
    }

    for (date, tasks) in store.days() {
        render_day_header(date, tasks.len(), locale);
        println!("  {}", "─".repeat(get_terminal_width().saturating_sub(4).min(40)).dimmed());
        for (index, task) in tasks.iter().enumerate() {
            render_task_line(index + 1, task);
        }
    }
    println!();
}
