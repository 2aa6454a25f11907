//! Rotate hooks driven through the logger facade

use chrono::NaiveDateTime;
use hooklog::test_support::CaptureSink;
use hooklog::{JsonFormatter, Level, Logger, PrefixedFormatter};
use hooklog_file::{FileNaming, RotateHookExt, RotateOptions};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn only_file_with_prefix(dir: &Path, prefix: &str) -> String {
    let mut matches: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            let name = path.file_name().unwrap().to_str().unwrap();
            name.starts_with(prefix) && !path.is_symlink()
        })
        .collect();
    assert_eq!(matches.len(), 1, "{matches:?}");
    fs::read_to_string(matches.pop().unwrap()).unwrap()
}

#[test]
fn test_prefixed_layout_round_trip() {
    let dir = TempDir::new().unwrap();
    let logger = Logger::nop();
    logger
        .add_rotate_hook_by_day_with_formatter(
            dir.path().join("api.log"),
            7,
            1,
            Arc::new(PrefixedFormatter),
            Level::Info,
        )
        .unwrap();

    let line = line!() + 1;
    logger.info("request served");

    let contents = only_file_with_prefix(dir.path(), "api.log.info.");
    let (stamp, rest) = contents.split_at(19);
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").unwrap();
    assert_eq!(rest, format!(" [info][rotate.rs:{line}] request served\n"));
}

#[test]
fn test_threshold_controls_which_files_receive_records() {
    let dir = TempDir::new().unwrap();
    let logger = Logger::nop();
    logger
        .add_rotate_hook_with_options(
            RotateOptions::new(dir.path().join("svc.log"), Level::Warn)
                .formatter(Arc::new(PrefixedFormatter)),
        )
        .unwrap();

    for level in Level::ALL {
        logger.log(level, format!("at {level}"));
    }

    for level in [Level::Debug, Level::Info] {
        let prefix = format!("svc.log.{level}.");
        assert!(
            fs::read_dir(dir.path())
                .unwrap()
                .all(|e| !e.unwrap().file_name().to_str().unwrap().starts_with(&prefix))
        );
    }
    for level in [Level::Warn, Level::Error, Level::Fatal, Level::Panic] {
        let contents = only_file_with_prefix(dir.path(), &format!("svc.log.{level}."));
        assert_eq!(contents.lines().count(), 1, "{contents}");
        assert!(contents.ends_with(&format!("at {level}\n")));
    }
}

#[test]
fn test_shared_file_receives_every_covered_level() {
    let dir = TempDir::new().unwrap();
    let logger = Logger::nop().with("node", "n1");
    logger
        .add_rotate_hook_with_options(
            RotateOptions::new(dir.path().join("all.log"), Level::Info)
                .naming(FileNaming::Shared)
                .pattern("%Y%m%d%H")
                .rotation_time(Duration::from_secs(60 * 60))
                .formatter(Arc::new(JsonFormatter::new())),
        )
        .unwrap();

    logger.debug("skipped");
    logger.info("one");
    logger.error("two");

    let contents = only_file_with_prefix(dir.path(), "all.log.");
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["msg"], "one");
    assert_eq!(lines[1]["level"], "error");
    assert_eq!(lines[1]["node"], "n1");
}

#[test]
fn test_file_hook_coexists_with_other_sinks() {
    let dir = TempDir::new().unwrap();
    let logger = Logger::nop();
    let capture = Arc::new(CaptureSink::new());
    logger.register_sink(capture.clone(), Level::Debug);
    logger
        .add_rotate_hook_by_hour(dir.path().join("h.log"), 24, 1, Level::Error)
        .unwrap();

    logger.info("info only");
    logger.error("both");

    assert_eq!(capture.messages(), vec!["info only", "both"]);
    let contents = only_file_with_prefix(dir.path(), "h.log.error.");
    assert!(contents.contains("msg=both"));
    assert!(!contents.contains("info only"));
}
