use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

// Build a sample worth compressing: repetitive text, larger than one window.
fn write_sample(temp_dir: &tempfile::TempDir) -> Result<PathBuf,Box<dyn std::error::Error>> {
    let verse = "I am Sam. Sam I am. I do not like this Sam I am.\r\n";
    let mut txt: Vec<u8> = Vec::new();
    while txt.len() < 20000 {
        txt.extend_from_slice(verse.as_bytes());
    }
    let path = temp_dir.path().join("sample.txt");
    std::fs::write(&path,txt)?;
    Ok(path)
}

#[test]
fn round_trip_through_binary() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = write_sample(&temp_dir)?;
    let packed_path = temp_dir.path().join("sample.lz");
    let out_path = temp_dir.path().join("restored.txt");
    let expanded_size = std::fs::metadata(&in_path)?.len();

    let mut cmd = Command::cargo_bin("packlz")?;
    cmd.arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&packed_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("compressed"));

    let packed_size = std::fs::metadata(&packed_path)?.len();
    assert!(packed_size < expanded_size);

    let mut cmd = Command::cargo_bin("packlz")?;
    cmd.arg("expand")
        .arg("-i").arg(&packed_path)
        .arg("-o").arg(&out_path)
        .arg("-s").arg(expanded_size.to_string())
        .assert()
        .success()
        .stderr(predicate::str::contains("expanded"));

    match (std::fs::read(&in_path),std::fs::read(&out_path)) {
        (Ok(v1),Ok(v2)) => {
            assert_eq!(v1,v2);
        },
        _ => panic!("unable to compare output with reference")
    }
    Ok(())
}

#[test]
fn oversized_request_stops_at_marker() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = write_sample(&temp_dir)?;
    let packed_path = temp_dir.path().join("sample.lz");
    let out_path = temp_dir.path().join("restored.txt");
    let expanded_size = std::fs::metadata(&in_path)?.len();

    let mut cmd = Command::cargo_bin("packlz")?;
    cmd.arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&packed_path)
        .assert()
        .success();

    // ask for more than was packed, the end marker truncates the result
    let mut cmd = Command::cargo_bin("packlz")?;
    cmd.arg("expand")
        .arg("-i").arg(&packed_path)
        .arg("-o").arg(&out_path)
        .arg("-s").arg((expanded_size + 1000).to_string())
        .assert()
        .success();

    assert_eq!(std::fs::metadata(&out_path)?.len(),expanded_size);
    Ok(())
}
