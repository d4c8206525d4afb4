//! End-to-end query scenarios over on-disk log corpora.

mod common;

use common::{generation_path, test_log_type, write_generation, SharedSink};
use dlog_engine::{
    CompareOp, Criteria, FixedClock, JobEntry, NumericFilter, Query, QueryConfig, QueryOutcome,
    StaticJobInfo, ViewFlags,
};
use tempfile::TempDir;

/// Two V0 records; the second one is archived.
fn simple_corpus(dir: &TempDir) {
    write_generation(
        dir.path(),
        0,
        0x5f000010,
        &[
            "5f000000|hostA|1 2|foo|  |00a|0.25|0000f|",
            "5f000010|hostA|1 2|bar|  |014|0.50|0000f|arch/5f0a0000_1",
        ],
    );
}

fn query_for(dir: &TempDir, criteria: Criteria) -> Query<dlog_engine::NoJobInfo, FixedClock> {
    let config = QueryConfig::new(dir.path());
    Query::new(criteria, config)
        .with_clock(FixedClock(0x5f000020))
        .with_log_type(test_log_type())
}

#[tokio::test]
async fn simple_window_emits_both_records() {
    let dir = TempDir::new().unwrap();
    simple_corpus(&dir);

    let criteria = Criteria::new().with_end_time(0x5f000015);
    let mut query = query_for(&dir, criteria);
    let mut sink = SharedSink::default();

    let outcome = query.run(&mut sink).await.unwrap();

    assert_eq!(outcome, QueryOutcome::Done);
    assert_eq!(sink.names(), ["foo", "bar"]);

    let rows = sink.state().rows.clone();
    assert_eq!(rows[0].archive, 'N');
    assert_eq!(rows[1].archive, 'Y');

    let summary = sink.last_summary();
    assert_eq!(summary.records, 2);
    assert_eq!(summary.bytes, 30.0);
    assert_eq!(summary.first_time, Some(0x5f000000));
    assert_eq!(summary.last_time, Some(0x5f000010));
    assert_eq!(summary.transfer_time, 0.75);
}

#[tokio::test]
async fn name_glob_selects_matching_records() {
    let dir = TempDir::new().unwrap();
    simple_corpus(&dir);

    let criteria = Criteria::new()
        .with_end_time(0x5f000015)
        .with_file_names(vec!["f*".into()]);
    let mut query = query_for(&dir, criteria);
    let mut sink = SharedSink::default();

    query.run(&mut sink).await.unwrap();

    assert_eq!(sink.names(), ["foo"]);
    assert_eq!(sink.last_summary().records, 1);
}

#[tokio::test]
async fn size_sentinel_compares_greater_than_any_finite_value() {
    let dir = TempDir::new().unwrap();
    write_generation(
        dir.path(),
        0,
        0x5f000000,
        &["5f000000|hostA|1 2|big|  |0123456789abcdef|1.00|f|"],
    );

    let criteria = Criteria::new()
        .with_end_time(0x5f000005)
        .with_size_filter(NumericFilter::new(CompareOp::Greater, 1_000_000.0));
    let mut query = query_for(&dir, criteria);
    let mut sink = SharedSink::default();

    query.run(&mut sink).await.unwrap();

    assert_eq!(sink.names(), ["big"]);
    assert!(sink.last_summary().bytes.is_infinite());
}

#[tokio::test]
async fn negated_glob_excludes_what_it_matches() {
    let dir = TempDir::new().unwrap();
    write_generation(
        dir.path(),
        0,
        0x5f000001,
        &[
            "5f000000|hostA|1 2|alpha|  |00a|0.25|f|",
            "5f000001|hostA|1 2|beta|  |00a|0.25|f|",
        ],
    );

    let criteria = Criteria::new()
        .with_end_time(0x5f000005)
        .with_file_names(vec!["!alpha".into()]);
    let mut query = query_for(&dir, criteria);
    let mut sink = SharedSink::default();

    query.run(&mut sink).await.unwrap();

    assert_eq!(sink.names(), ["beta"]);
}

#[tokio::test]
async fn list_limit_caps_the_output() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<String> = (0..50)
        .map(|i| format!("{:08x}|hostA|1 2|file{i:02}|  |00a|0.25|f|", 0x5f000000u32 + i))
        .collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_generation(dir.path(), 0, 0x5f000100, &refs);

    let criteria = Criteria::new()
        .with_end_time(0x5f000200)
        .with_list_limit(5);
    let mut query = query_for(&dir, criteria);
    let mut sink = SharedSink::default();

    let outcome = query.run(&mut sink).await.unwrap();

    assert_eq!(outcome, QueryOutcome::Done);
    assert_eq!(sink.row_count(), 5);
    assert!(
        sink.state()
            .statuses
            .iter()
            .any(|s| s == "List limit (5) reached!")
    );
}

#[tokio::test]
async fn rows_are_ordered_old_generation_first_then_by_offset() {
    let dir = TempDir::new().unwrap();
    write_generation(
        dir.path(),
        1,
        0x20,
        &[
            "00000010|hostA|1 2|one|  |1|0.10|f|",
            "00000020|hostA|1 2|two|  |1|0.10|f|",
        ],
    );
    write_generation(
        dir.path(),
        0,
        0x40,
        &[
            "00000030|hostA|1 2|three|  |1|0.10|f|",
            "00000040|hostA|1 2|four|  |1|0.10|f|",
        ],
    );

    let criteria = Criteria::new().with_end_time(0x100);
    let mut query = query_for(&dir, criteria);
    let mut sink = SharedSink::default();

    query.run(&mut sink).await.unwrap();

    assert_eq!(sink.names(), ["one", "two", "three", "four"]);

    let rows = sink.state().rows.clone();
    let generations: Vec<u32> = rows.iter().map(|r| r.generation).collect();
    assert_eq!(generations, [1, 1, 0, 0]);
    assert!(rows.windows(2).all(|w| {
        w[0].generation > w[1].generation || w[0].line_offset < w[1].line_offset
    }));
}

#[tokio::test]
async fn closed_window_subsets_one_generation() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<String> = (1..=5)
        .map(|i| format!("{:08x}|hostA|1 2|f{i}|  |1|0.10|f|", i * 0x10))
        .collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_generation(dir.path(), 0, 0x100, &refs);

    let criteria = Criteria::new().with_start_time(0x20).with_end_time(0x40);
    let mut query = query_for(&dir, criteria);
    let mut sink = SharedSink::default();

    query.run(&mut sink).await.unwrap();

    assert_eq!(sink.names(), ["f2", "f3", "f4"]);
}

#[tokio::test]
async fn closed_window_queries_are_idempotent() {
    let dir = TempDir::new().unwrap();
    simple_corpus(&dir);

    let criteria = Criteria::new().with_end_time(0x5f000015);
    let mut query = query_for(&dir, criteria);

    let mut sink = SharedSink::default();
    query.run(&mut sink).await.unwrap();
    let first_names = sink.names();
    let first_summary = sink.last_summary();

    // Rerunning the same query resets all state deterministically.
    query.run(&mut sink).await.unwrap();

    assert_eq!(sink.names(), first_names);
    assert_eq!(sink.last_summary(), first_summary);
    assert_eq!(sink.state().clears, 2);
}

#[tokio::test]
async fn line_offsets_point_back_at_the_source_records() {
    let dir = TempDir::new().unwrap();
    simple_corpus(&dir);

    let criteria = Criteria::new().with_end_time(0x5f000015);
    let mut query = query_for(&dir, criteria);
    let mut sink = SharedSink::default();

    query.run(&mut sink).await.unwrap();

    for row in sink.state().rows.iter() {
        let bytes = std::fs::read(generation_path(dir.path(), row.generation)).unwrap();
        let at = row.line_offset as usize;
        let stamp = std::str::from_utf8(&bytes[at..at + 8]).unwrap();
        assert_eq!(stamp, format!("{:08x}", row.timestamp));
    }

    // The line index kept by the query state agrees with the rows.
    let generations = query.state().generations();
    assert_eq!(generations.len(), 1);
    assert_eq!(generations[0].lines.len(), 2);
    assert_eq!(generations[0].lines.archived(0), Some(false));
    assert_eq!(generations[0].lines.archived(1), Some(true));
}

#[tokio::test]
async fn confirmation_view_renders_outcome_letters() {
    let dir = TempDir::new().unwrap();
    write_generation(
        dir.path(),
        0,
        0x5f000003,
        &[
            "5f000000|hostA|0|240|sent.txt||a|0.10|0|1|",
            "5f000001|hostA|2|240|conf-d||0|0.01|0|1|",
            "5f000002|hostA|5|240|conf-t||0|0.01|0|1|",
        ],
    );

    let criteria = Criteria::new()
        .with_end_time(0x5f000005)
        .with_view(ViewFlags::CONFIRMATION);
    let mut query = query_for(&dir, criteria);
    let mut sink = SharedSink::default();

    query.run(&mut sink).await.unwrap();

    let archives: Vec<char> = sink.state().rows.iter().map(|r| r.archive).collect();
    assert_eq!(archives, ['N', 'd', 't']);
}

#[tokio::test]
async fn user_filter_resolves_through_job_info() {
    let dir = TempDir::new().unwrap();
    write_generation(
        dir.path(),
        0,
        0x5f000001,
        &[
            "5f000000|hostA|1 2|ours|  |00a|0.25|f|",
            "5f000001|hostA|1 2|theirs|  |00a|0.25|10|",
        ],
    );

    let mut jobs = StaticJobInfo::default();
    jobs.insert(
        0xf,
        JobEntry {
            user: "afd".into(),
            mail_destination: String::new(),
            dir: "/incoming".into(),
            dir_id: 1,
        },
    );
    jobs.insert(
        0x10,
        JobEntry {
            user: "guest".into(),
            mail_destination: String::new(),
            dir: "/incoming".into(),
            dir_id: 1,
        },
    );

    let criteria = Criteria::new()
        .with_end_time(0x5f000005)
        .with_users(vec!["afd".into()]);
    let config = QueryConfig::new(dir.path());
    let mut query = Query::new(criteria, config)
        .with_clock(FixedClock(0x5f000002))
        .with_log_type(test_log_type())
        .with_job_info(jobs);
    let mut sink = SharedSink::default();

    query.run(&mut sink).await.unwrap();

    assert_eq!(sink.names(), ["ours"]);
}
