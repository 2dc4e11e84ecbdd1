#![cfg(feature = "cli")]

use std::process::Command;

fn headlink(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_headlink"))
        .args(["--log-level", "error"])
        .args(args)
        .env_remove("HEADLINK_PORT")
        .env_remove("HEADLINK_LOG")
        .output()
        .expect("headlink should run")
}

#[test]
fn encode_describe_matches_device_capture() {
    let output = headlink(&["--format", "raw", "encode", "--describe", ""]);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"~\x04\x83\x06\x01`\xf7~");
}

#[test]
fn encode_call_json() {
    let output = headlink(&[
        "--format",
        "json",
        "encode",
        "--addr",
        "17",
        "--id",
        "42",
        "do_something",
        "--args",
        "[123, \"abc\"]",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("\"frame_hex\":\"7e118408182a6c646f5f736f6d657468696e6782187b63616263097e\""),
        "{stdout}"
    );
}

#[test]
fn decode_prints_message_fields() {
    let output = headlink(&["--format", "json", "decode", "7e 04 83 06 01 60 f7 7e"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"address\":4"), "{stdout}");
    assert!(stdout.contains("\"code\":6"), "{stdout}");
    assert!(stdout.contains("\"fields\":[6,1,\"\"]"), "{stdout}");
}

#[test]
fn decode_bad_checksum_exits_60() {
    let output = headlink(&["--format", "json", "decode", "7e0483060160f67e"]);
    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("decode failed"), "{stderr}");
}

#[test]
fn bad_args_exit_64() {
    let output = headlink(&["encode", "enable", "--args", "{\"a\":1}"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn missing_port_is_usage_error() {
    let output = headlink(&["enable"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--port"), "{stderr}");
}

#[test]
fn version_prints_name() {
    let output = headlink(&["version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("headlink "));
}
