mod common;

use common::*;
use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn sample_file() -> NamedTempFile {
	let mut file = NamedTempFile::new().unwrap();
	file.write_all(&sample()).unwrap();
	file.flush().unwrap();
	file
}

fn cfbfdump(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_cfbfdump")).args(args).output().unwrap()
}

#[test]
fn list_prints_ids_paths_and_sizes() {
	let file = sample_file();
	let output = cfbfdump(&["list", "-i", file.path().to_str().unwrap()]);
	assert!(output.status.success());
	assert_eq!(String::from_utf8(output.stdout).unwrap(), "\
0 /
2 /Small1 (50 bytes)
1 /Stream1 (600 bytes)
3 /Sub/
4 /Sub/Small2 (100 bytes)
");
}

#[test]
fn info_prints_geometry() {
	let file = sample_file();
	let output = cfbfdump(&["info", "-i", file.path().to_str().unwrap()]);
	assert!(output.status.success());
	let stdout = String::from_utf8(output.stdout).unwrap();
	assert!(stdout.contains("sector size:        512\n"));
	assert!(stdout.contains("mini sector size:   64\n"));
	assert!(stdout.contains("mini stream cutoff: 512\n"));
	assert!(stdout.contains("sectors:            8\n"));
	assert!(stdout.contains("mini stream:        1024 bytes\n"));
	assert!(stdout.contains("directory entries:  5\n"));
}

#[test]
fn dump_by_name_and_id_writes_stream_bytes() {
	let file = sample_file();
	let input = file.path().to_str().unwrap();

	let output = cfbfdump(&["dump", "--name", "Small1", "-i", input]);
	assert!(output.status.success());
	assert_eq!(output.stdout, pattern(2)[..50]);

	let target = NamedTempFile::new().unwrap();
	let output = cfbfdump(&["dump", "--id", "1", "-o", target.path().to_str().unwrap(), "-i", input]);
	assert!(output.status.success());
	let mut expected = pattern(5);
	expected.extend_from_slice(&pattern(6)[..88]);
	assert_eq!(std::fs::read(target.path()).unwrap(), expected);
}

#[test]
fn errors_exit_with_status_1() {
	let file = sample_file();
	let output = cfbfdump(&["dump", "--name", "Nope", "-i", file.path().to_str().unwrap()]);
	assert_eq!(output.status.code(), Some(1));
	assert!(String::from_utf8(output.stderr).unwrap().contains("ERROR: no such entry: Nope"));

	let mut garbage = NamedTempFile::new().unwrap();
	garbage.write_all(&[0u8; 1024]).unwrap();
	let output = cfbfdump(&["list", "-i", garbage.path().to_str().unwrap()]);
	assert_eq!(output.status.code(), Some(1));
	assert!(String::from_utf8(output.stderr).unwrap().starts_with("ERROR: not a valid compound file"));
}
