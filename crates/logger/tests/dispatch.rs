//! Threshold dispatch and async delivery through the facade

mod common;

use common::SlowSink;
use hooklog::test_support::CaptureSink;
use hooklog::{AsyncOptions, Level, Logger, OverflowPolicy, expand};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn emit_every_level(logger: &Logger) {
    for level in Level::ALL {
        logger.log(level, level);
    }
}

fn any_level() -> impl Strategy<Value = Level> {
    (0..Level::COUNT).prop_map(|i| Level::ALL[i])
}

proptest! {
    #[test]
    fn sink_receives_exactly_its_expanded_levels(threshold in any_level()) {
        let logger = Logger::nop();
        let capture = Arc::new(CaptureSink::new());
        logger.register_sink(capture.clone(), threshold);

        emit_every_level(&logger);

        prop_assert_eq!(capture.levels(), expand(threshold));
    }

    #[test]
    fn record_reaches_union_of_matching_sinks(
        first in any_level(),
        second in any_level(),
        level in any_level(),
    ) {
        let logger = Logger::nop();
        let a = Arc::new(CaptureSink::new());
        let b = Arc::new(CaptureSink::new());
        logger.register_sink(a.clone(), first);
        logger.register_sink(b.clone(), second);

        logger.log(level, "routed");

        prop_assert_eq!(a.len(), usize::from(first.covers(level)));
        prop_assert_eq!(b.len(), usize::from(second.covers(level)));
    }
}

#[test]
fn test_registry_counts_follow_expansion() {
    let logger = Logger::nop();
    logger.register_sink(Arc::new(CaptureSink::new()), Level::Warn);
    logger.register_sink(Arc::new(CaptureSink::new()), Level::Fatal);

    let counts: Vec<usize> = Level::ALL
        .iter()
        .map(|level| logger.registry().len(*level))
        .collect();
    assert_eq!(counts, vec![0, 0, 1, 1, 2, 2]);
}

#[test]
fn test_broken_sink_does_not_affect_others() {
    let logger = Logger::nop();
    let broken = Arc::new(CaptureSink::new());
    broken.set_failing(true);
    let capture = Arc::new(CaptureSink::new());
    logger.register_sink(broken.clone(), Level::Debug);
    logger.register_sink(capture.clone(), Level::Debug);

    logger.error("still delivered");

    assert_eq!(broken.len(), 1);
    assert_eq!(capture.messages(), vec!["still delivered"]);
}

#[test]
fn test_with_is_non_destructive() {
    let logger = Logger::nop();
    let capture = Arc::new(CaptureSink::new());
    logger.register_sink(capture.clone(), Level::Debug);

    let tagged = logger.with("tenant", "acme");
    tagged.info("tagged");
    logger.info("plain");

    let records = capture.records();
    assert_eq!(
        records[0].field("tenant"),
        Some(&serde_json::Value::from("acme"))
    );
    assert_eq!(records[1].field("tenant"), None);
}

#[test]
fn test_async_sink_does_not_block_caller() {
    let logger = Logger::nop();
    let capture = SlowSink::new(Duration::from_millis(20));
    logger
        .register_async_sink(capture.clone(), AsyncOptions::default(), Level::Info)
        .unwrap();

    let started = Instant::now();
    for i in 0..10 {
        logger.info(format!("event {i}"));
    }
    assert!(started.elapsed() < Duration::from_millis(150));

    logger.flush().unwrap();
    let expected: Vec<String> = (0..10).map(|i| format!("event {i}")).collect();
    assert_eq!(capture.messages(), expected);
}

#[test]
fn test_flush_twice_returns_promptly() {
    let logger = Logger::nop();
    let capture = Arc::new(CaptureSink::new());
    logger
        .register_async_sink(capture.clone(), AsyncOptions::default(), Level::Debug)
        .unwrap();

    logger.warn("one");
    logger.flush().unwrap();
    assert_eq!(capture.len(), 1);

    let started = Instant::now();
    logger.flush().unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(capture.len(), 1);
}

#[test]
fn test_flush_from_another_thread_and_derived_handle() {
    let logger = Logger::nop();
    let capture = Arc::new(CaptureSink::new());
    logger
        .register_async_sink(capture.clone(), AsyncOptions::default(), Level::Debug)
        .unwrap();

    let child = logger.with("worker", 1);
    for i in 0..25 {
        child.debug(i);
    }

    std::thread::spawn(move || child.flush().unwrap())
        .join()
        .unwrap();

    assert_eq!(capture.len(), 25);
}

#[test]
fn test_overflow_is_counted_not_blocking() {
    let logger = Logger::nop();
    let capture = SlowSink::new(Duration::from_millis(50));
    let options = AsyncOptions::default()
        .capacity(2)
        .overflow(OverflowPolicy::Drop);
    let sink = logger
        .register_async_sink(capture.clone(), options, Level::Debug)
        .unwrap();

    let started = Instant::now();
    for i in 0..20 {
        logger.info(i);
    }
    assert!(started.elapsed() < Duration::from_millis(500));

    logger.flush().unwrap();
    let delivered = capture.len() as u64;
    assert_eq!(delivered + sink.dropped(), 20);
    assert!(sink.dropped() > 0);
    assert_eq!(logger.coordinator().dropped(), sink.dropped());
}

#[test]
fn test_concurrent_register_and_dispatch() {
    const REGISTRARS: usize = 8;
    const EMITTERS: usize = 4;

    let logger = Logger::nop();
    let captures: Vec<Arc<CaptureSink>> = (0..REGISTRARS)
        .map(|_| Arc::new(CaptureSink::new()))
        .collect();

    std::thread::scope(|scope| {
        for capture in &captures {
            let logger = &logger;
            scope.spawn(move || logger.register_sink(capture.clone(), Level::Warn));
        }
        for emitter in 0..EMITTERS {
            let logger = &logger;
            scope.spawn(move || {
                for i in 0..200 {
                    if i % 2 == 0 {
                        logger.info(format!("{emitter}-{i}"));
                    } else {
                        logger.error(format!("{emitter}-{i}"));
                    }
                }
            });
        }
    });

    assert_eq!(logger.registry().len(Level::Error), REGISTRARS);
    assert_eq!(logger.registry().len(Level::Warn), REGISTRARS);
    assert_eq!(logger.registry().len(Level::Info), 0);
    for capture in &captures {
        assert!(capture.levels().iter().all(|level| *level >= Level::Warn));
    }

    logger.error("after");
    assert!(captures.iter().all(|c| c.messages().last().map(String::as_str) == Some("after")));
}
