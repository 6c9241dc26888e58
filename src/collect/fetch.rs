use super::{parse_count, Fact, GitDataCollector, Phase};
use crate::git::{describe, CommandRunner, Stage};
use crate::parse::{
    parse_commit_line, parse_revision_line, parse_shortlog_line, parse_shortstat_line,
    parse_tag_ref, parse_tag_stamp, parse_tree_line, ChangeWindow,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

impl<R: CommandRunner> GitDataCollector<R> {
    /// Runs every collection pass in order. Each source is drained completely
    /// before the next query is issued; failed queries contribute nothing.
    pub fn collect(&mut self) {
        info!("Collecting data for {}", self.project_name);
        self.collect_total_authors();
        self.collect_tags();
        self.collect_commits();
        self.collect_revisions();
        self.collect_files();
        self.collect_line_stats();
        self.phase = Phase::Ingested;
        info!(
            commits = self.stats.total_commits,
            authors = self.stats.authors.len(),
            files = self.stats.total_files,
            "Collection finished"
        );
    }

    fn query(&self, pipeline: &[Stage]) -> String {
        match self.runner.run(pipeline) {
            Ok(output) => output,
            Err(e) => {
                warn!("No data from `{}`: {e}", describe(pipeline));
                String::new()
            }
        }
    }

    pub fn collect_total_authors(&mut self) {
        let pipeline = [Stage::git(["shortlog", "-s", "HEAD"]), Stage::line_count()];
        self.stats.total_authors = match self.runner.run(&pipeline).and_then(|out| parse_count(&out)) {
            Ok(count) => count,
            Err(e) => {
                warn!("Could not count authors: {e}");
                0
            }
        };
    }

    pub fn collect_tags(&mut self) {
        // show-ref exits non-zero when there are no tags at all
        let output = match self.runner.run(&[Stage::git(["show-ref", "--tags"])]) {
            Ok(output) => output,
            Err(e) => {
                debug!("No tags: {e}");
                return;
            }
        };

        let mut refs = Vec::new();
        for line in output.lines().filter(|line| !line.trim().is_empty()) {
            match parse_tag_ref(line) {
                Ok(tag) => refs.push(tag),
                Err(e) => warn!("{e}"),
            }
        }

        for tag in refs {
            let output = self.query(&[Stage::git([
                "log",
                tag.hash.as_str(),
                "--pretty=format:%at %an",
                "-n",
                "1",
            ])]);
            let stamp = parse_tag_stamp(&output);
            self.ingest(Fact::Tag { tag, stamp });
        }

        // displayed newest first, but walked oldest first
        let mut oldest_first: Vec<_> = self
            .stats
            .tags
            .iter()
            .map(|(name, tag)| (tag.stamp, name.clone()))
            .collect();
        oldest_first.sort();

        for (_, name) in oldest_first {
            let reference = format!("refs/tags/{name}");
            let output = self.query(&[Stage::git(["shortlog", "-s", reference.as_str()])]);
            for line in output.lines().filter(|line| !line.trim().is_empty()) {
                match parse_shortlog_line(line) {
                    Ok(entry) => self.ingest(Fact::TagAuthors {
                        tag: name.clone(),
                        entry,
                    }),
                    Err(e) => warn!("{e}"),
                }
            }
        }
    }

    pub fn collect_commits(&mut self) {
        let output = self.query(&[
            Stage::git([
                "rev-list",
                "--reverse",
                "--pretty=format:%at %ai %an <%aE>",
                "HEAD",
            ]),
            Stage::new("grep", ["-v", "^commit"]),
        ]);

        for line in output.lines().filter(|line| !line.trim().is_empty()) {
            match parse_commit_line(line) {
                Ok(record) => self.ingest(Fact::Commit(record)),
                Err(e) => warn!("{e}"),
            }
        }
    }

    pub fn collect_revisions(&mut self) {
        let output = self.query(&[
            Stage::git(["rev-list", "--pretty=format:%at %T", "HEAD"]),
            Stage::new("grep", ["-v", "^commit"]),
        ]);
        let lines: Vec<&str> = output.lines().filter(|line| !line.trim().is_empty()).collect();

        let pb = self.progress_bar(lines.len() as u64, "Counting files per revision");
        for line in lines {
            match parse_revision_line(line) {
                Ok((stamp, tree)) => self.ingest(Fact::Revision { stamp, tree }),
                Err(e) => warn!("{e}"),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
    }

    pub fn collect_files(&mut self) {
        let output = self.query(&[Stage::git(["ls-tree", "-r", "-z", "HEAD"])]);
        let lines: Vec<&str> = output.split('\0').filter(|line| !line.is_empty()).collect();

        let pb = self.progress_bar(lines.len() as u64, "Counting lines per file");
        for line in lines {
            match parse_tree_line(line, self.config.max_ext_length) {
                Ok(entry) => self.ingest(Fact::File(entry)),
                Err(e) => warn!("{e}"),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
    }

    pub fn collect_line_stats(&mut self) {
        let output = self.query(&[Stage::git(["log", "--shortstat", "--pretty=format:%at %an"])]);

        // git log is newest first; the window expects oldest first
        let mut window = ChangeWindow::new();
        for line in output.lines().rev() {
            match parse_shortstat_line(line) {
                Ok(parsed) => {
                    if let Some(record) = window.feed(parsed) {
                        self.ingest(Fact::Change(record));
                    }
                }
                Err(e) => warn!("{e}"),
            }
        }
        self.stats.total_lines = window.total_lines();
    }

    fn progress_bar(&self, len: u64, message: &'static str) -> ProgressBar {
        if !self.config.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:30}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message(message);
        pb
    }
}
