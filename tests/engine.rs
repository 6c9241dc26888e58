use gitstats::git::{describe, CommandRunner, Stage};
use gitstats::parse::parse_commit_line;
use gitstats::{Config, Fact, GitDataCollector, LookupCache, Phase, StatsError};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::collections::HashMap;

/// Answers pipelines from a table of canned outputs and records every call.
#[derive(Default)]
struct ScriptedRunner {
    outputs: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    fn with(mut self, pipeline: &str, output: &str) -> Self {
        self.outputs.insert(pipeline.to_string(), output.to_string());
        self
    }

    fn calls_matching(&self, needle: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.contains(needle)).count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, pipeline: &[Stage]) -> gitstats::Result<String> {
        let command = describe(pipeline);
        self.calls.borrow_mut().push(command.clone());
        self.outputs
            .get(&command)
            .cloned()
            .ok_or_else(|| StatsError::Command(format!("`{command}` exited with 128")))
    }
}

const COMMITS: &str = "git rev-list --reverse \"--pretty=format:%at %ai %an <%aE>\" HEAD | grep -v ^commit";
const REVISIONS: &str = "git rev-list \"--pretty=format:%at %T\" HEAD | grep -v ^commit";
const SHORTSTAT: &str = "git log --shortstat \"--pretty=format:%at %an\"";

fn quiet_config() -> Config {
    Config::new().with_progress(false)
}

fn small_repo() -> ScriptedRunner {
    ScriptedRunner::default()
        .with("git shortlog -s HEAD | wc -l", "2")
        .with(
            "git show-ref --tags",
            "1111111111111111111111111111111111111111 refs/tags/v1.0\n\
             2222222222222222222222222222222222222222 refs/tags/v2.0",
        )
        .with(
            "git log 1111111111111111111111111111111111111111 \"--pretty=format:%at %an\" -n 1",
            "1700000100 Alice",
        )
        .with(
            "git log 2222222222222222222222222222222222222222 \"--pretty=format:%at %an\" -n 1",
            "1700090000 Bob",
        )
        .with("git shortlog -s refs/tags/v1.0", "     2\tAlice")
        .with("git shortlog -s refs/tags/v2.0", "     2\tAlice\n     1\tBob")
        .with(
            COMMITS,
            "1700000000 2023-11-14 22:13:20 +0000 Alice <alice@example.com>\n\
             1700000100 2023-11-14 22:15:00 +0000 Alice <alice@example.com>\n\
             1700090000 2023-11-15 23:13:20 +0000 Bob <bob@corp.net>",
        )
        .with(
            REVISIONS,
            "1700090000 aaaa\n1700000100 bbbb\n1700000000 cccc",
        )
        .with("git ls-tree -r --name-only aaaa | wc -l", "3")
        .with("git ls-tree -r --name-only bbbb | wc -l", "2")
        .with("git ls-tree -r --name-only cccc | wc -l", "1")
        .with(
            "git ls-tree -r -z HEAD",
            "100644 blob b1\tsrc/main.rs\u{0}100644 blob b2\tsrc/lib.RS\u{0}100644 blob b3\tREADME\u{0}",
        )
        .with("git cat-file blob b1 | wc -l", "       40")
        .with("git cat-file blob b2 | wc -l", "2")
        .with("git cat-file blob b3 | wc -l", "7")
        .with(
            SHORTSTAT,
            "1700090000 Bob\n \
             1 file changed, 3 insertions(+), 1 deletion(-)\n\
             \n\
             1700000100 Alice\n \
             1 file changed, 2 insertions(+)\n\
             \n\
             1700000000 Alice\n \
             2 files changed, 40 insertions(+)",
        )
}

fn collected(runner: &ScriptedRunner) -> GitDataCollector<&ScriptedRunner> {
    let mut data = GitDataCollector::new(quiet_config(), runner, LookupCache::new())
        .with_project_name("demo");
    data.collect();
    data
}

#[test]
fn ranks_authors_by_commit_share() {
    let runner = small_repo();
    let mut data = collected(&runner);
    data.refine().unwrap();

    assert_eq!(data.authors(None).unwrap(), vec!["Alice", "Bob"]);
    let alice = data.author_info("Alice").unwrap();
    let bob = data.author_info("Bob").unwrap();
    assert_eq!(alice.place_by_commits, Some(1));
    assert_eq!(bob.place_by_commits, Some(2));
    assert!((alice.commits_frac - 66.666).abs() < 0.01);
    assert!((bob.commits_frac - 33.333).abs() < 0.01);
    assert_eq!(alice.time_delta.num_seconds(), 100);

    let total: u64 = data.stats().authors.values().map(|a| a.commits).sum();
    assert_eq!(total, data.stats().total_commits);
    assert_eq!(data.stats().total_commits, 3);
    assert_eq!(data.stats().total_authors, 2);
}

#[test]
fn collects_every_table() {
    let runner = small_repo();
    let data = collected(&runner);
    let stats = data.stats();

    assert_eq!(data.phase(), Phase::Ingested);
    assert_eq!(stats.domains.get_ref("example.com").commits, 2);
    assert_eq!(data.domain_info("nowhere.org").commits, 0);
    assert_eq!(stats.files_by_stamp.get(&1_700_090_000), 3);
    assert_eq!(stats.files_by_stamp.len(), 3);

    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.extensions.get_ref("rs").files, 2);
    assert_eq!(stats.extensions.get_ref("rs").lines, 42);
    assert_eq!(stats.extensions.get_ref("").lines, 7);

    assert_eq!(stats.total_lines_added, 45);
    assert_eq!(stats.total_lines_removed, 1);
    assert_eq!(stats.total_lines, 44);
    assert_eq!(stats.authors.get_ref("Alice").lines_added, 42);
    assert_eq!(stats.authors.get_ref("Bob").lines_removed, 1);
    assert_eq!(stats.changes_by_date.get(&1_700_090_000).total_lines, 44);

    assert_eq!(data.active_days().len(), 2);
    assert_eq!(data.author_of_month("2023-11"), Some((&"Alice".to_string(), 2)));
    assert_eq!(data.author_of_year(1999), None);
}

#[test]
fn tags_are_listed_newest_first_with_cumulative_authors() {
    let runner = small_repo();
    let data = collected(&runner);

    let names: Vec<&String> = data.tags_by_date_desc().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["v2.0", "v1.0"]);

    let v2 = data.tag_info("v2.0").unwrap();
    assert_eq!(v2.commits, 3);
    assert_eq!(v2.authors.get("Bob"), Some(&1));
    assert_eq!(data.tag_info("v1.0").unwrap().commits, 2);
    assert!(data.tag_info("v3.0").is_none());
}

#[test]
fn stamps_do_not_depend_on_ingestion_order() {
    let lines = [
        "1700090000 2023-11-15 23:13:20 +0000 Bob <bob@corp.net>",
        "1700000000 2023-11-14 22:13:20 +0000 Bob <bob@corp.net>",
        "1700050000 2023-11-15 12:06:40 +0000 Bob <bob@corp.net>",
    ];
    let runner = ScriptedRunner::default();
    let mut data = GitDataCollector::new(quiet_config(), &runner, LookupCache::new());
    for line in lines {
        data.ingest(Fact::Commit(parse_commit_line(line).unwrap()));
    }

    assert_eq!(data.first_commit_date().unwrap().timestamp(), 1_700_000_000);
    assert_eq!(data.last_commit_date().unwrap().timestamp(), 1_700_090_000);
    let bob = data.stats().authors.get_ref("Bob");
    assert_eq!(bob.first_commit_stamp.unwrap().timestamp(), 1_700_000_000);
    assert_eq!(bob.last_commit_stamp.unwrap().timestamp(), 1_700_090_000);
}

#[test]
fn refinement_is_guarded_and_repeatable() {
    let runner = small_repo();
    let mut empty = GitDataCollector::new(quiet_config(), &runner, LookupCache::new());
    assert!(matches!(empty.refine(), Err(StatsError::InvalidState(_))));
    assert_eq!(empty.phase(), Phase::Empty);

    let mut data = collected(&runner);
    assert!(matches!(data.authors(None), Err(StatsError::InvalidState(_))));
    assert!(data.report().is_err());

    data.refine().unwrap();
    let first = data.ranked_authors(None).unwrap();
    data.refine().unwrap();
    let second = data.ranked_authors(None).unwrap();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.author, b.author);
    }
    assert_eq!(data.phase(), Phase::Refined);
    assert!(matches!(data.author_info("Mallory"), Err(StatsError::NotFound(_))));
}

#[test]
fn ingesting_after_refinement_invalidates_rankings() {
    let runner = small_repo();
    let mut data = collected(&runner);
    data.refine().unwrap();

    let line = "1700100000 2023-11-16 02:00:00 +0000 Bob <bob@corp.net>";
    data.ingest(Fact::Commit(parse_commit_line(line).unwrap()));
    assert_eq!(data.phase(), Phase::Ingested);
    assert!(data.authors(None).is_err());

    data.refine().unwrap();
    assert_eq!(data.author_info("Bob").unwrap().commits_frac, 50.0);
}

#[test]
fn failed_line_count_still_counts_the_file() {
    let mut runner = small_repo();
    runner.outputs.remove("git cat-file blob b1 | wc -l");
    let data = collected(&runner);

    assert_eq!(data.stats().total_files, 3);
    assert_eq!(data.stats().extensions.get_ref("rs").files, 2);
    assert_eq!(data.stats().extensions.get_ref("rs").lines, 2);
    assert_eq!(data.cache().cached_lines_in_blob("b1"), None);
}

#[test]
fn malformed_shortstat_line_is_skipped() {
    let runner = small_repo().with(
        SHORTSTAT,
        "1700090000 Bob\n\
         this line is not a summary\n\
         1700000000 Alice\n \
         1 file changed, 5 insertions(+)",
    );
    let data = collected(&runner);
    let stats = data.stats();

    assert_eq!(stats.authors.get_ref("Alice").lines_added, 5);
    assert_eq!(stats.authors.get_ref("Bob").lines_added, 0);
    assert_eq!(stats.changes_by_date.len(), 2);
    assert_eq!(stats.total_lines, 5);
}

#[test]
fn missing_sources_contribute_nothing() {
    let runner = ScriptedRunner::default();
    let mut data = GitDataCollector::new(quiet_config(), &runner, LookupCache::new());
    data.collect();

    assert_eq!(data.phase(), Phase::Ingested);
    assert_eq!(data.stats().total_commits, 0);
    assert_eq!(data.stats().total_authors, 0);
    assert!(data.stats().tags.is_empty());
    assert_eq!(data.commit_delta_days(), 1);
    assert_eq!(data.average_commits_per_active_day(), 0.0);
    assert_eq!(data.active_day_percentage(), 0.0);

    data.refine().unwrap();
    assert!(data.authors(None).unwrap().is_empty());
}

#[test]
fn same_day_history_still_spans_one_day() {
    let runner = ScriptedRunner::default();
    let mut data = GitDataCollector::new(quiet_config(), &runner, LookupCache::new());
    for line in [
        "1700000000 2023-11-14 22:13:20 +0000 A <a@x.org>",
        "1700000100 2023-11-14 22:15:00 +0000 A <a@x.org>",
    ] {
        data.ingest(Fact::Commit(parse_commit_line(line).unwrap()));
    }
    assert_eq!(data.commit_delta_days(), 1);
    assert_eq!(data.average_commits_per_day(), 2.0);
    assert_eq!(data.active_day_percentage(), 100.0);
}

#[test]
fn warm_cache_skips_object_queries() {
    let runner = small_repo();
    let first = collected(&runner);
    assert_eq!(runner.calls_matching("cat-file"), 3);
    assert_eq!(runner.calls_matching("ls-tree -r --name-only"), 3);

    let cache = first.into_cache();
    assert_eq!(cache.len(), 6);

    let mut second = GitDataCollector::new(quiet_config(), &runner, cache);
    second.collect();
    assert_eq!(runner.calls_matching("cat-file"), 3);
    assert_eq!(runner.calls_matching("ls-tree -r --name-only"), 3);
    assert_eq!(second.stats().extensions.get_ref("rs").lines, 42);
    assert_eq!(second.stats().files_by_stamp.get(&1_700_000_000), 1);
}

#[test]
fn report_caps_authors_and_domains() {
    let runner = small_repo();
    let mut config = quiet_config();
    config.apply_override("max_authors=1").unwrap();
    config.apply_override("max_domains=1").unwrap();
    let mut data = GitDataCollector::new(config, &runner, LookupCache::new()).with_project_name("demo");
    data.collect();
    data.refine().unwrap();

    let report = data.report().unwrap();
    assert_eq!(report.authors.len(), 1);
    assert_eq!(report.authors[0].name, "Alice");
    assert_eq!(report.domains, vec![("example.com".to_string(), 2)]);
    assert_eq!(report.summary.project_name, "demo");

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["summary"]["total_commits"], 3);
    assert_eq!(json["authors"][0]["place_by_commits"], 1);
    assert_eq!(json["extensions"]["rs"]["files"], 2);
    assert_eq!(json["calendar"]["hour_of_day"]["22"], 2);
}
