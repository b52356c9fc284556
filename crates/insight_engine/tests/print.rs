use std::fs;

use insight_engine::{ensure_print_dir, PrintError, PrintSettings, PrintWriter};

fn writer_in(dir: &std::path::Path) -> PrintWriter {
    PrintWriter::new(PrintSettings {
        output_dir: dir.to_path_buf(),
        open_viewer: false,
    })
}

#[test]
fn creates_missing_output_dir() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("nested").join("print");

    let path = writer_in(&dir).write("a.html", "<p>a</p>").unwrap();

    assert!(dir.is_dir());
    assert_eq!(fs::read_to_string(path).unwrap(), "<p>a</p>");
}

#[test]
fn rewrite_replaces_whole_document_and_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let writer = writer_in(dir.path());

    writer.write("report.html", "a much longer first document").unwrap();
    let path = writer.write("report.html", "short").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn output_path_that_is_a_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("print");
    fs::write(&blocker, "not a dir").unwrap();

    let err = ensure_print_dir(&blocker).unwrap_err();
    assert!(matches!(err, PrintError::OutputDir(_)));

    let err = writer_in(&blocker).print("a.html", "doc").unwrap_err();
    assert!(matches!(err, PrintError::OutputDir(_)));
}
