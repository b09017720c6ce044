use std::{
    future::Future,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    FakeLogger, HarnessError, LogLevel, Logger, Matcher, MockFailure, Surface, TestHarness, Times,
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
struct Event {
    id: u64,
    priority: u8,
    body: String,
}

trait Notifier: Send + Sync {
    fn send(&self, channel: &str, event: &Event) -> impl Future<Output = Result<()>> + Send;
}

trait AuditLog: Send + Sync {
    fn append(&self, entry: &str) -> Result<u64>;
}

struct NotifierDouble(Surface);

impl Notifier for NotifierDouble {
    fn send(&self, channel: &str, event: &Event) -> impl Future<Output = Result<()>> + Send {
        let result = self
            .0
            .call("send", (channel, event))
            .map_err(anyhow::Error::from);
        async move { result }
    }
}

struct AuditLogDouble(Surface);

impl AuditLog for AuditLogDouble {
    fn append(&self, entry: &str) -> Result<u64> {
        Ok(self.0.call("append", (entry,))?)
    }
}

const URGENT_PRIORITY: u8 = 8;

struct NotificationHandler<N, A, L> {
    notifier: N,
    audit: A,
    logger: L,
}

impl<N: Notifier, A: AuditLog, L: Logger> NotificationHandler<N, A, L> {
    async fn handle(&self, event: &Event) -> Result<()> {
        let position = self.audit.append(&format!("event {}", event.id))?;
        self.logger
            .debug(&format!("Audited event {} at {position}", event.id));

        if event.priority < URGENT_PRIORITY {
            return Ok(());
        }
        if let Err(e) = self.notifier.send("urgent", event).await {
            self.logger
                .warn(&format!("Could not notify about event {}: {e}", event.id));
        }
        Ok(())
    }
}

fn handler(harness: &TestHarness) -> NotificationHandler<NotifierDouble, AuditLogDouble, FakeLogger> {
    NotificationHandler {
        notifier: NotifierDouble(harness.surface("Notifier")),
        audit: AuditLogDouble(harness.surface("AuditLog")),
        logger: harness.logger("NotificationHandler"),
    }
}

fn event(id: u64, priority: u8) -> Event {
    Event {
        id,
        priority,
        body: format!("event body {id}"),
    }
}

#[tokio::test]
async fn test_low_priority_events_are_never_sent() {
    let harness = TestHarness::strict();
    harness
        .surface("AuditLog")
        .expect("append")
        .with(vec![Matcher::any()])
        .returns(1)
        .times(Times::AnyNumber)
        .register()
        .unwrap();
    harness
        .surface("Notifier")
        .expect("send")
        .with(vec![Matcher::any(), Matcher::any()])
        .times(Times::Never)
        .register()
        .unwrap();

    let subject = handler(&harness);
    for id in 0..3 {
        subject.handle(&event(id, 1)).await.unwrap();
    }

    assert_eq!(harness.surface("AuditLog").calls().len(), 3);
    harness.verify().unwrap();
}

#[tokio::test]
async fn test_forbidden_send_is_reported() {
    let harness = TestHarness::strict();
    harness
        .surface("AuditLog")
        .expect("append")
        .with(vec![Matcher::any()])
        .returns(1)
        .register()
        .unwrap();
    harness
        .surface("Notifier")
        .expect("send")
        .with(vec![Matcher::any(), Matcher::any()])
        .times(Times::Never)
        .register()
        .unwrap();

    handler(&harness).handle(&event(7, 9)).await.unwrap();

    assert_eq!(harness.snapshot().with_level(LogLevel::Warning).len(), 1);
    let err = harness.verify().unwrap_err();
    assert!(matches!(
        err,
        HarnessError::UnsatisfiedExpectation { expected: Times::Never, actual: 1, .. }
    ));
}

#[tokio::test]
async fn test_urgent_events_are_sent_and_captured() {
    let harness = TestHarness::strict();
    let sent = Arc::new(Mutex::new(Vec::new()));
    let positions = Arc::new(Mutex::new(0_u64));

    harness
        .surface("AuditLog")
        .expect("append")
        .with(vec![Matcher::any()])
        .calls(move |_| {
            let mut next = positions.lock().unwrap();
            *next += 1;
            Ok(json!(*next))
        })
        .times(Times::AtLeastOnce)
        .register()
        .unwrap();
    let sink = sent.clone();
    harness
        .surface("Notifier")
        .expect("send")
        .with(vec![
            Matcher::exact("urgent"),
            Matcher::satisfying("urgent event", |event: &Event| {
                event.priority >= URGENT_PRIORITY
            }),
        ])
        .calls(move |arguments| {
            sink.lock().unwrap().push(arguments[1].clone());
            Ok(Value::Null)
        })
        .times(Times::Exactly(2))
        .register()
        .unwrap();

    let subject = handler(&harness);
    subject.handle(&event(1, 9)).await.unwrap();
    subject.handle(&event(2, 3)).await.unwrap();
    subject.handle(&event(3, 10)).await.unwrap();

    let sent: Vec<Event> = sent
        .lock()
        .unwrap()
        .iter()
        .map(|value| serde_json::from_value(value.clone()).unwrap())
        .collect();
    assert_eq!(sent.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(
        harness.snapshot().latest().map(|r| r.message.as_str()),
        Some("Audited event 3 at 3")
    );
    harness.verify().unwrap();
}

#[tokio::test]
async fn test_notifier_failure_is_logged_not_propagated() {
    let harness = TestHarness::strict();
    harness
        .surface("AuditLog")
        .expect("append")
        .with(vec![Matcher::any()])
        .returns(1)
        .register()
        .unwrap();
    harness
        .surface("Notifier")
        .expect("send")
        .with(vec![Matcher::any(), Matcher::any()])
        .fails(MockFailure::msg("channel closed"))
        .register()
        .unwrap();

    handler(&harness).handle(&event(5, 9)).await.unwrap();

    let warnings = harness.snapshot().with_level(LogLevel::Warning);
    assert_eq!(warnings.messages(), vec!["Could not notify about event 5: channel closed"]);
    harness.verify().unwrap();
}

#[tokio::test]
async fn test_uncapped_expectation_blocks_later_overlap() {
    let harness = TestHarness::strict();
    let audit = harness.surface("AuditLog");
    audit
        .expect("append")
        .with(vec![Matcher::any()])
        .returns(1)
        .times(Times::AnyNumber)
        .register()
        .unwrap();

    let err = audit
        .expect("append")
        .with_args(("event 1",))
        .returns(2)
        .register()
        .unwrap_err();

    assert!(matches!(err, HarnessError::DuplicateAmbiguousExpectation { .. }));
    harness.verify().unwrap();
}
