use directory_core::{init_logging, init_stderr_logging, logging_status, LogTarget, LoggingError};

#[test]
fn stderr_logging_is_idempotent_and_blocks_file_logging() {
    init_stderr_logging("warn").unwrap();
    init_stderr_logging("WARN").unwrap();
    assert_eq!(logging_status(), Some(("warn", LogTarget::Stderr)));

    let level_err = init_stderr_logging("debug").unwrap_err();
    assert!(matches!(level_err, LoggingError::Conflict { .. }));

    let log_dir = std::env::temp_dir().join(format!("directory-stderr-{}", std::process::id()));
    let dir_err = init_logging("warn", log_dir.to_str().unwrap()).unwrap_err();
    assert_eq!(
        dir_err,
        LoggingError::Conflict {
            active: "stderr".to_string(),
            requested: log_dir.display().to_string(),
        }
    );
    assert!(!log_dir.exists());

    log::error!("event=stderr_logging_test module=tests status=ok");
}
