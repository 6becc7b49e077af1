//! Exercises the library entry point against a file written to a temp
//! directory, mirroring the CLI's read-compile-write path.

use std::fs;
use tempfile::tempdir;

#[test]
fn compiles_source_file_to_assembly_text() {
    let dir = tempdir().unwrap();
    let src_path = dir.path().join("hello.pas");
    fs::write(&src_path, "program Hello; begin writeln('hi') end.").unwrap();

    let source = fs::read_to_string(&src_path).unwrap();
    let asm = pascalc::compile(&source).unwrap();

    let out_path = src_path.with_extension("vm");
    fs::write(&out_path, &asm).unwrap();

    let written = fs::read_to_string(&out_path).unwrap();
    assert!(written.starts_with("START"));
    assert!(written.trim_end().ends_with("STOP"));
}
