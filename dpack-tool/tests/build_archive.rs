use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use dpack_lib::Config;
use dpack_tool::packaging::{self, Compressor};
use tempfile::TempDir;
use zip::ZipArchive;

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn build(output: &Path, sources: &[String]) -> anyhow::Result<packaging::BuildSummary> {
    packaging::build(output, sources, &[], &Config::default(), Compressor::Deflate)
}

fn archive_names(output: &Path) -> BTreeSet<String> {
    let archive = ZipArchive::new(File::open(output).unwrap()).unwrap();
    archive.file_names().map(str::to_string).collect()
}

fn read_entry(output: &Path, name: &str) -> String {
    let mut archive = ZipArchive::new(File::open(output).unwrap()).unwrap();
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

#[test]
fn missing_sources_are_skipped_without_error() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out.zip");

    let summary = build(
        &out,
        &[tmp.path().join("missing.txt").to_string_lossy().to_string()],
    )
    .unwrap();

    assert_eq!(summary.added, 0);
    assert_eq!(summary.skipped, 1);
    assert!(archive_names(&out).is_empty());
}

#[test]
fn file_sources_are_named_by_base_name_only() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("a/b/c.txt");
    write_file(&file, "deep");
    let out = tmp.path().join("out.zip");

    build(&out, &[file.to_string_lossy().to_string()]).unwrap();

    let names = archive_names(&out);
    assert_eq!(names, BTreeSet::from(["c.txt".to_string()]));
    assert_eq!(read_entry(&out, "c.txt"), "deep");
}

#[test]
fn directory_sources_keep_their_own_name_as_prefix() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("a/b/dir");
    write_file(&dir.join("x/y.txt"), "nested");
    let out = tmp.path().join("out.zip");

    build(&out, &[dir.to_string_lossy().to_string()]).unwrap();

    assert_eq!(archive_names(&out), BTreeSet::from(["dir/x/y.txt".to_string()]));
}

#[test]
fn colliding_base_names_resolve_to_the_later_source() {
    let tmp = TempDir::new().unwrap();
    let first = tmp.path().join("one/dup.txt");
    let second = tmp.path().join("two/dup.txt");
    write_file(&first, "first");
    write_file(&second, "second");
    let out = tmp.path().join("out.zip");

    build(
        &out,
        &[
            first.to_string_lossy().to_string(),
            second.to_string_lossy().to_string(),
        ],
    )
    .unwrap();

    // The archive extracts to a single dup.txt holding the later content.
    assert_eq!(archive_names(&out), BTreeSet::from(["dup.txt".to_string()]));
    assert_eq!(read_entry(&out, "dup.txt"), "second");
}

#[test]
fn rebuilding_truncates_the_previous_archive() {
    let tmp = TempDir::new().unwrap();
    let keep = tmp.path().join("keep.txt");
    let stale = tmp.path().join("stale.txt");
    write_file(&keep, "k");
    write_file(&stale, "s");
    let out = tmp.path().join("out.zip");

    build(
        &out,
        &[
            keep.to_string_lossy().to_string(),
            stale.to_string_lossy().to_string(),
        ],
    )
    .unwrap();
    build(&out, &[keep.to_string_lossy().to_string()]).unwrap();

    assert_eq!(archive_names(&out), BTreeSet::from(["keep.txt".to_string()]));
}

#[test]
fn mixed_sources_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let readme = tmp.path().join("readme.md");
    write_file(&readme, "X");
    let assets = tmp.path().join("assets");
    write_file(&assets.join("img/a.png"), "png");
    write_file(&assets.join("b.txt"), "txt");
    let out = tmp.path().join("deploy.zip");

    let summary = build(
        &out,
        &[
            readme.to_string_lossy().to_string(),
            tmp.path().join("missing.txt").to_string_lossy().to_string(),
            assets.to_string_lossy().to_string(),
        ],
    )
    .unwrap();

    assert_eq!(summary.added, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(
        archive_names(&out),
        BTreeSet::from([
            "readme.md".to_string(),
            "assets/img/a.png".to_string(),
            "assets/b.txt".to_string(),
        ])
    );
    assert_eq!(read_entry(&out, "readme.md"), "X");
}

#[test]
fn unwritable_destination_fails_the_build() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("readme.md");
    write_file(&file, "X");
    let out = tmp.path().join("no_such_dir/out.zip");

    let result = build(&out, &[file.to_string_lossy().to_string()]);

    assert!(result.is_err());
    assert!(!out.exists());
}

#[test]
fn skip_patterns_exclude_matching_paths() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("srv");
    write_file(&dir.join("app.py"), "code");
    write_file(&dir.join("debug.log"), "noise");
    let out = tmp.path().join("out.zip");

    let patterns = dpack_tool::fs_utils::compile_skip_patterns(Some(&["*.log".to_string()])).unwrap();
    packaging::build(
        &out,
        &[dir.to_string_lossy().to_string()],
        &patterns,
        &Config::default(),
        Compressor::Deflate,
    )
    .unwrap();

    assert_eq!(archive_names(&out), BTreeSet::from(["srv/app.py".to_string()]));
}
