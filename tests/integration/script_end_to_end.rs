#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use geodex::cli::runner::{RunSummary, ScriptRunner};
use geodex::{GeoPoint, GisDb, GisOptions, Locator};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Byte offset each data line of the fixture gets in a fresh store.
fn expected_offsets() -> Vec<(u64, String)> {
    let text = fs::read_to_string(fixture("highland_va.txt")).expect("fixture");
    let mut offset = 0u64;
    let mut out = Vec::new();
    for line in text.lines().skip(1) {
        out.push((offset, line.to_string()));
        offset += line.len() as u64 + 1;
    }
    out
}

fn script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("commands.txt");
    let import = fixture("highland_va.txt");
    let text = body.replace("{import}", &import.display().to_string());
    fs::write(&path, text).expect("write script");
    path
}

const SCRIPT: &str = "; Highland County, Virginia
world\t0800000W\t0790000W\t380000N\t390000N
import\t{import}
show\thash
what_is\tMonterey\tVA
what_is\tMonterey\tVA
what_is_at\t382443N\t0793443W
what_is_in\t382500N\t0793500W\t600\t900
what_is\tRichmond\tVA
show\tpool
show\tquad
quit
what_is\tBolar\tVA
";

fn run_script(options: GisOptions) -> (TempDir, GisDb, RunSummary, String) {
    let dir = TempDir::new().expect("tempdir");
    let script = script(dir.path(), SCRIPT);
    let mut db = GisDb::create(dir.path().join("db.txt"), options).expect("create db");
    let log_path = dir.path().join("log.txt");
    let summary = {
        let log = fs::File::create(&log_path).expect("log file");
        let mut runner = ScriptRunner::new(&mut db, log);
        runner.run_file(&script).expect("run script")
    };
    let log = fs::read_to_string(&log_path).expect("read log");
    (dir, db, summary, log)
}

#[test]
fn script_runs_until_quit() {
    let (_dir, _db, summary, log) = run_script(GisOptions::default());
    assert_eq!(
        summary,
        RunSummary {
            commands: 11,
            failed: 0,
            quit: true
        }
    );
    assert!(log.contains("Command 11:\tquit"));
    assert!(!log.contains("Bolar\tVA"));
}

#[test]
fn import_report_counts_records() {
    let (_dir, db, _, log) = run_script(GisOptions::default());
    assert!(log.contains("Imported features by name: 10\n"));
    assert!(log.contains("New name keys: 9\n"));
    assert!(log.contains("Imported locations: 8\n"));
    assert!(log.contains("Rejected outside world: 1\n"));
    assert!(log.contains("Missing coordinates: 1\n"));
    assert_eq!(db.names().len(), 9);
    let tree = db.spatial().expect("world set");
    assert_eq!(tree.len(), 7);
    assert_eq!(tree.locator_count(), 8);
}

#[test]
fn queries_report_store_offsets() {
    let (_dir, _db, _, log) = run_script(GisOptions::default());
    let offsets = expected_offsets();
    let (first, _) = &offsets[0];
    let (second, _) = &offsets[1];
    assert!(log.contains(&format!(
        "\t{first}:  Highland  (79d 34m 43s West, 38d 24m 43s North)\n\t{second}:  Highland  (79d 34m 43s West, 38d 24m 43s North)"
    )));
    assert!(log.contains(
        "\tThe following feature(s) were found at (79d 34m 43s West, 38d 24m 43s North):"
    ));
    assert!(log.contains(&format!("\t{first}:  Monterey  Highland  VA")));
    assert!(log.contains(
        "\tThe following 8 feature(s) were found in (79d 35m 0s West +/- 900, 38d 25m 0s North +/- 600):"
    ));
    let (richmond, _) = &offsets[9];
    assert!(log.contains(&format!(
        "\t{richmond}:  Richmond (city)  (77d 26m 11s West, 37d 32m 17s North)"
    )));
}

#[test]
fn pool_fronts_repeated_queries() {
    let (_dir, db, _, log) = run_script(GisOptions::default());
    let stats = db.stats().pool;
    assert_eq!(stats.hits, 6);
    assert_eq!(stats.misses, 9);
    assert_eq!(db.pool().len(), 9);
    let offsets = expected_offsets();
    let (richmond, richmond_line) = &offsets[9];
    assert_eq!(db.pool().get(0).map(|r| r.locator), Some(Locator(*richmond)));
    assert!(log.contains(&format!("MRU\n\t{richmond}: {richmond_line}\n")));
    assert!(log.contains("Buffer pool holds 9 of 15 records"));
}

#[test]
fn small_pool_and_buckets_give_same_answers() {
    let options = GisOptions {
        hash_slots: 2,
        load_limit: 0.5,
        bucket_capacity: 2,
        pool_capacity: 3,
    };
    let (_dir, mut db, summary, log) = run_script(options);
    assert_eq!(summary.failed, 0);
    assert!(log.contains("The following 8 feature(s) were found in"));
    assert!(db.names().slot_count() >= 32);
    assert_eq!(db.pool().len(), 3);
    let bolar = db
        .what_is_at(GeoPoint::new(
            -(79 * 3600 + 47 * 60 + 44),
            38 * 3600 + 16 * 60 + 54,
        ))
        .expect("query");
    assert_eq!(bolar.len(), 1);
    assert!(bolar[0].line.contains("|Bolar|"));
}

#[test]
fn show_commands_dump_structures() {
    let (_dir, _db, _, log) = run_script(GisOptions::default());
    assert!(log.contains("Number of elements: 9"));
    assert!(log.contains("Number of slots: 256"));
    assert!(log.contains("Command 10:\tshow\tquad"));
    let quad = log
        .split("Command 10:\tshow\tquad")
        .nth(1)
        .expect("quad dump");
    assert!(quad.contains('@'));
    assert!(quad.contains("[0, "));
}
