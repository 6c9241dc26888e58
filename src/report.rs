use crate::collect::GitDataCollector;
use crate::git::CommandRunner;
use anyhow::{Context, Result};
use console::style;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn output_json<R: CommandRunner>(data: &GitDataCollector<R>, output: Option<&Path>) -> Result<()> {
    let report = data.report().context("Failed to assemble report")?;
    match output {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            if let Some(dir) = dir {
                if !dir.is_dir() {
                    anyhow::bail!("Output directory {} does not exist", dir.display());
                }
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &report)?;
            writer.flush()?;
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

pub fn output_summary<R: CommandRunner>(data: &GitDataCollector<R>) -> Result<()> {
    let summary = data.summary();

    println!("{}", style(format!("GitStats - {}", summary.project_name)).bold());
    println!("{}", "─".repeat(50));

    if let (Some(first), Some(last)) = (summary.first_commit, summary.last_commit) {
        println!(
            "Report period: {} to {}",
            style(first.format(DATE_FORMAT)).dim(),
            style(last.format(DATE_FORMAT)).dim()
        );
    }
    println!(
        "Age: {} days, {} active days ({:.2}%)",
        style(summary.age_days).cyan(),
        style(summary.active_days).cyan(),
        summary.active_day_percentage
    );
    println!("Total files: {}", style(summary.total_files).cyan());
    println!(
        "Total lines of code: {} ({} added, {} removed)",
        style(summary.total_lines).cyan(),
        style(summary.total_lines_added).green(),
        style(summary.total_lines_removed).red()
    );
    println!(
        "Total commits: {} (average {:.1} commits per active day, {:.1} per all days)",
        style(summary.total_commits).cyan(),
        summary.commits_per_active_day,
        summary.commits_per_day
    );
    println!("Authors: {}", style(summary.total_authors).yellow());

    let tags = data.tags_by_date_desc();
    if !tags.is_empty() {
        println!("\n{}", style("Tags").bold());
        for (name, tag) in tags.iter().take(10) {
            println!(
                "  {:<20} {}  {:>6} commits, {} authors",
                name,
                tag.stamp.format("%Y-%m-%d"),
                tag.commits,
                tag.authors.len()
            );
        }
    }

    let extensions = data.extensions_by_files();
    if !extensions.is_empty() {
        println!("\n{}", style("Extensions").bold());
        for (ext, stats) in extensions.iter().take(10) {
            let name = if ext.is_empty() { "(none)" } else { ext.as_str() };
            println!("  {:<12} {:>6} files {:>9} lines", name, stats.files, stats.lines);
        }
    }

    Ok(())
}

pub fn output_authors<R: CommandRunner>(data: &GitDataCollector<R>, limit: usize) -> Result<()> {
    let authors = data.ranked_authors(Some(limit)).context("Failed to rank authors")?;
    println!(
        "{:<4} {:<30} {:>8} {:>8} {:>9} {:>9} {:>7}",
        style("#").bold(),
        style("Author").bold(),
        style("Commits").bold(),
        style("%").bold(),
        style("+lines").bold(),
        style("-lines").bold(),
        style("Days").bold()
    );
    println!("{}", "─".repeat(82));
    for entry in &authors {
        let author = &entry.author;
        println!(
            "{:<4} {:<30} {:>8} {:>7.2}% {:>9} {:>9} {:>7}",
            author.place_by_commits.unwrap_or_default(),
            entry.name,
            author.commits,
            author.commits_frac,
            author.lines_added,
            author.lines_removed,
            author.active_days
        );
    }
    let total = data.stats().authors.len();
    if total > authors.len() {
        println!("\n... and {} more authors", total - authors.len());
    }
    Ok(())
}
