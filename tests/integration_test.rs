use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

use modplan::discovery::ModDiscoverer;
use modplan::locator::{LocatorConfig, ModsFolderLocator, SearchPathLocator};
use modplan::progress::NoopProgress;
use modplan::runtime::RealRuntime;

fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
    use zip::CompressionMethod;
    use zip::ZipWriter;
    use zip::write::FileOptions;

    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options: FileOptions<()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, content) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

fn mod_manifest(id: &str, version: &str, deps: &[(&str, &str)]) -> Vec<u8> {
    let deps = deps
        .iter()
        .map(|(id, range)| format!(r#"{{"id": "{id}", "range": "{range}"}}"#))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"{{"mods": [{{"id": "{id}", "version": "{version}", "dependencies": [{deps}]}}]}}"#
    )
    .into_bytes()
}

#[test]
fn test_plan_orders_by_dependencies() {
    let dir = tempdir().unwrap();
    write_zip(
        &dir.path().join("app.zip"),
        &[("modinfo.json", &mod_manifest("app", "1.0", &[("core", "[1.0,)")]))],
    );
    write_zip(
        &dir.path().join("core.zip"),
        &[("modinfo.json", &mod_manifest("core", "1.2", &[]))],
    );

    Command::cargo_bin("modplan")
        .unwrap()
        .args(["plan", "--mods-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Load plan (2 file(s))"))
        .stdout(predicate::str::is_match("(?s)core.*app").unwrap())
        .stdout(predicate::str::contains("0 error(s)"));
}

#[test]
fn test_check_fails_on_broken_manifest() {
    let dir = tempdir().unwrap();
    write_zip(&dir.path().join("broken.zip"), &[("modinfo.json", b"{ nope")]);

    Command::cargo_bin("modplan")
        .unwrap()
        .args(["check", "--mods-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 error(s)"));
}

#[test]
fn test_check_warns_about_foreign_package() {
    let dir = tempdir().unwrap();
    write_zip(&dir.path().join("other.zip"), &[("fabric.mod.json", b"{}")]);

    Command::cargo_bin("modplan")
        .unwrap()
        .args(["check", "--mods-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("brokenfile.fabric"))
        .stdout(predicate::str::contains("0 error(s)"));
}

#[test]
fn test_empty_mods_dir_is_success() {
    let dir = tempdir().unwrap();

    Command::cargo_bin("modplan")
        .unwrap()
        .args(["check", "--mods-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0 error(s)"));
}

#[test]
fn test_cycle_is_fatal() {
    let dir = tempdir().unwrap();
    write_zip(
        &dir.path().join("a.zip"),
        &[("modinfo.json", &mod_manifest("a", "1.0", &[("b", "[1.0,)")]))],
    );
    write_zip(
        &dir.path().join("b.zip"),
        &[("modinfo.json", &mod_manifest("b", "1.0", &[("c", "[1.0,)")]))],
    );
    write_zip(
        &dir.path().join("c.zip"),
        &[("modinfo.json", &mod_manifest("c", "1.0", &[("a", "[1.0,)")]))],
    );

    Command::cargo_bin("modplan")
        .unwrap()
        .args(["check", "--mods-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("dependency cycle between: a, b, c"));
}

#[test]
fn test_embedded_dependency_resolution() {
    let dir = tempdir().unwrap();

    let staging = tempdir().unwrap();
    let lib_path = staging.path().join("corelib.zip");
    write_zip(&lib_path, &[("libinfo.json", br#"{"type": "library"}"#)]);
    let lib_bytes = std::fs::read(&lib_path).unwrap();

    // Two hosts embed corelib with overlapping ranges; 1.8 satisfies both.
    for (name, id, range) in
        [("alpha.zip", "alpha", "[1.0,2.0)"), ("beta.zip", "beta", "[1.5,3.0)")]
    {
        let deps = format!(
            r#"{{"deps": [{{"identifier": "corelib", "range": "{range}",
                 "version": "1.8", "path": "embedded/corelib.zip"}}]}}"#
        );
        write_zip(
            &dir.path().join(name),
            &[
                ("modinfo.json", &mod_manifest(id, "1.0", &[])),
                ("embedded/deps.json", deps.as_bytes()),
                ("embedded/corelib.zip", &lib_bytes),
            ],
        );
    }

    Command::cargo_bin("modplan")
        .unwrap()
        .args(["plan", "--mods-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Load plan (3 file(s))"))
        .stdout(predicate::str::contains("1 library resource(s)"));
}

#[test]
fn test_embedded_dependency_conflict_cites_both_hosts() {
    let dir = tempdir().unwrap();

    let staging = tempdir().unwrap();
    let lib_path = staging.path().join("corelib.zip");
    write_zip(&lib_path, &[("code.bin", b"x")]);
    let lib_bytes = std::fs::read(&lib_path).unwrap();

    for (name, id, range, version) in [
        ("alpha.zip", "alpha", "[1.0,1.2)", "1.1"),
        ("beta.zip", "beta", "[1.5,2.0)", "1.8"),
    ] {
        let deps = format!(
            r#"{{"deps": [{{"identifier": "corelib", "range": "{range}",
                 "version": "{version}", "path": "embedded/corelib.zip"}}]}}"#
        );
        write_zip(
            &dir.path().join(name),
            &[
                ("modinfo.json", &mod_manifest(id, "1.0", &[])),
                ("embedded/deps.json", deps.as_bytes()),
                ("embedded/corelib.zip", &lib_bytes),
            ],
        );
    }

    Command::cargo_bin("modplan")
        .unwrap()
        .args(["check", "--mods-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("corelib"))
        .stdout(predicate::str::contains("alpha"))
        .stdout(predicate::str::contains("beta"));
}

#[test]
fn test_no_duplicate_identities_in_final_plan() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("alpha.zip");
    write_zip(&path, &[("modinfo.json", &mod_manifest("alpha", "1.0", &[]))]);

    // The same file surfaces through the mods folder and the dev search path.
    let plan = ModDiscoverer::new()
        .with_locator(Box::new(ModsFolderLocator::new(dir.path())))
        .with_locator(Box::new(SearchPathLocator::new(vec![path])))
        .with_config(LocatorConfig { launch_target: Some("clientdev".into()) })
        .discover_and_validate(&RealRuntime, &NoopProgress, |_| Ok(()));

    assert!(!plan.is_fatal());
    assert_eq!(plan.files().len(), 1);

    let mut identities: Vec<_> = plan.files().iter().map(|f| f.identity()).collect();
    identities.dedup();
    assert_eq!(identities.len(), plan.files().len());
}
