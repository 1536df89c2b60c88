#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chatrelay_server::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  port: 5000
  max_frame_byte: 123 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.port, 5000);
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.max_frame_bytes, 65535);
    assert_eq!(cfg.server.listen_addr(), "0.0.0.0:5000");
}

#[test]
fn port_is_configurable() {
    let cfg = config::load_from_str(
        r#"
version: 1
server:
  host: "127.0.0.1"
  port: 12345
  outbound_queue: 8
  write_timeout_ms: 500
"#,
    )
    .expect("must parse");
    assert_eq!(cfg.server.listen_addr(), "127.0.0.1:12345");
    assert_eq!(cfg.server.outbound_queue, 8);
    assert_eq!(cfg.server.write_timeout().as_millis(), 500);
}

#[test]
fn rejects_out_of_range_values() {
    let cases = [
        "version: 2\n",
        "version: 1\nserver:\n  max_frame_bytes: 0\n",
        "version: 1\nserver:\n  max_frame_bytes: 70000\n",
        "version: 1\nserver:\n  outbound_queue: 0\n",
        "version: 1\nserver:\n  write_timeout_ms: 10\n",
        "version: 1\nserver:\n  handshake_timeout_ms: 5\n",
        "version: 1\nserver:\n  host: \"  \"\n",
        "version: 1\nserver:\n  port: 70000\n",
    ];
    for yaml in cases {
        let err = config::load_from_str(yaml).expect_err(yaml);
        assert_eq!(err.code().as_str(), "BAD_CONFIG", "yaml={yaml}");
    }
}

#[test]
fn missing_file_is_config_error() {
    let err = config::load_from_file("does/not/exist.yaml").expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}
