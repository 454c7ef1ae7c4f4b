use super::*;
use dagflow_core::ItemName;

#[test]
fn publish_delivers_to_the_receiver() {
    let (logger, mut rx) = QueueLogger::channel();
    logger.log(&ItemName::new("step-1"), Some("abc"), "hello");

    let event = rx.try_recv().expect("event queued");
    match event {
        Event::EventMsg { item, filter_id, message } => {
            assert_eq!(item, ItemName::new("step-1"));
            assert_eq!(filter_id.as_deref(), Some("abc"));
            assert_eq!(message, "hello");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn clones_share_the_same_receiver() {
    let (logger, mut rx) = QueueLogger::channel();
    let clone = logger.clone();

    logger.log(&ItemName::new("a"), None, "one");
    clone.log(&ItemName::new("b"), None, "two");

    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
}

#[test]
fn publish_after_receiver_dropped_does_not_panic() {
    let (logger, rx) = QueueLogger::channel();
    drop(rx);
    logger.log(&ItemName::new("a"), None, "ignored");
}
