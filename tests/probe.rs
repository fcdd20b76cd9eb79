//! End-to-end probe runs over a seed file on disk.

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use pastee_lib::bootstrap::wiring::wire_with_clock;
use pastee_lib::cli::{run, Cli};
use pt_app::MutationOutcome;
use pt_core::Settings;
use pt_infra::FixedClock;
use tempfile::NamedTempFile;

const NOW: i64 = 1_760_443_200;

fn seed_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".json").unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

fn cli(args: &[&str]) -> Cli {
    Cli::parse_from(std::iter::once("pastee").chain(args.iter().copied()))
}

#[tokio::test]
async fn test_search_and_pin_reflected_in_report() {
    let seed = seed_file(
        r##"[
            {"kind": "text", "text": "first note", "ageSecs": 300},
            {"kind": "text", "text": "roadmap draft", "ageSecs": 200},
            {"kind": "color", "value": "#00FF00", "ageSecs": 100}
        ]"##,
    );
    let deps = wire_with_clock(&Settings::default(), Some(seed.path()), Arc::new(FixedClock::new(NOW))).unwrap();

    let report = run(&cli(&["--search", "roadmap"]), &deps.store).await.unwrap();
    assert_eq!(report.state.total_count, Some(1));
    assert_eq!(report.state.query.search_query, "roadmap");
    let items: Vec<_> = report.groups.iter().flat_map(|group| group.items.iter()).collect();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].clip.preview, "roadmap draft");

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["state"]["totalCount"], 1);
    assert_eq!(value["filters"][0]["label"], "All Types");
}

#[tokio::test]
async fn test_delete_and_clear_run_before_rendering() {
    let seed = seed_file(
        r##"[
            {"kind": "text", "text": "keep me", "ageSecs": 300, "pinned": true},
            {"kind": "text", "text": "drop me", "ageSecs": 200},
            {"kind": "text", "text": "scratch", "ageSecs": 100}
        ]"##,
    );
    let deps = wire_with_clock(&Settings::default(), Some(seed.path()), Arc::new(FixedClock::new(NOW))).unwrap();

    let report = run(&cli(&["--delete", "2", "--clear-unpinned"]), &deps.store).await.unwrap();
    assert_eq!(
        report.mutations,
        vec![MutationOutcome::Committed { affected: 1 }, MutationOutcome::Committed { affected: 1 }]
    );
    assert_eq!(report.state.total_count, Some(1));
    assert_eq!(deps.history.len(), 1);
}

#[test]
fn test_missing_seed_file_is_an_error() {
    let missing = std::path::Path::new("/no/such/seed.json");
    let err = wire_with_clock(&Settings::default(), Some(missing), Arc::new(FixedClock::new(NOW)))
        .err()
        .expect("missing seed must fail");
    assert!(format!("{:#}", err).contains("/no/such/seed.json"));
}
