use std::{
    sync::mpsc::Receiver,
    thread,
    time::{Duration, Instant},
};

use periodic_alarms::{
    command,
    config::{Config, DispatcherConfig},
    AlarmCore, AlarmNumber, Event, EventKind,
};

fn start_with(event_buffer: usize, idle_wait_ms: u64) -> AlarmCore {
    let config = Config {
        event_buffer,
        dispatcher: DispatcherConfig { idle_wait_ms },
        ..Config::default()
    };
    AlarmCore::start(&config).unwrap()
}

fn start() -> AlarmCore {
    start_with(64, 50)
}

fn submit(core: &AlarmCore, line: &str) {
    let request = command::parse(line).unwrap().unwrap();
    core.intake.submit(request);
}

/// Waits for the next event about `number` with `kind`, skipping others.
fn wait_for(events: &Receiver<Event>, number: AlarmNumber, kind: EventKind) -> Event {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        let event = events
            .recv_timeout(left)
            .unwrap_or_else(|_| panic!("no {kind:?} for alarm {number}"));
        if event.alarm_number == number && event.kind == kind {
            return event;
        }
    }
}

#[test]
fn alarm_displays_until_cancelled() {
    let core = start();
    submit(&core, "2 Message(1) drink water");

    wait_for(&core.events, 1, EventKind::RequestReceived);
    wait_for(&core.events, 1, EventKind::RequestProcessed);
    let shown = wait_for(&core.events, 1, EventKind::Displayed);
    assert_eq!(shown.message, "drink water");

    submit(&core, "Cancel: Message(1)");
    wait_for(&core.events, 1, EventKind::RequestCancelled);
    wait_for(&core.events, 1, EventKind::RequestProcessed);
    let exiting = wait_for(&core.events, 1, EventKind::NotifierExiting);
    assert_eq!(exiting.message, "drink water");

    // one more full cycle with nothing further about alarm 1
    let quiet_until = Instant::now() + Duration::from_secs(3);
    while let Some(left) = quiet_until.checked_duration_since(Instant::now()) {
        if let Ok(event) = core.events.recv_timeout(left) {
            assert_ne!(event.alarm_number, 1, "unexpected {:?}", event.kind);
        }
    }
    assert!(core.registry().read().is_empty());
}

#[test]
fn replacement_is_announced_then_displayed() {
    let core = start();
    submit(&core, "1 Message(4) old text");
    wait_for(&core.events, 4, EventKind::Displayed);

    submit(&core, "1 Message(4) new text");
    wait_for(&core.events, 4, EventKind::RequestReplaced);
    let notice = wait_for(&core.events, 4, EventKind::ReplacedNotice);
    assert_eq!(notice.message, "new text");
    let again = wait_for(&core.events, 4, EventKind::ReplacementDisplayed);
    assert_eq!(again.message, "new text");
}

#[test]
fn rejected_cancellations_are_reported() {
    let core = start();
    submit(&core, "Cancel: Message(7)");
    wait_for(&core.events, 7, EventKind::CancelRejectedNotFound);
    assert!(core.registry().read().is_empty());
}

#[test]
fn independent_alarms_run_side_by_side() {
    let core = start();
    submit(&core, "1 Message(20) twenty");
    submit(&core, "1 Message(10) ten");

    wait_for(&core.events, 10, EventKind::Displayed);
    wait_for(&core.events, 20, EventKind::Displayed);

    submit(&core, "Cancel: Message(20)");
    wait_for(&core.events, 20, EventKind::NotifierExiting);
    // alarm 10 keeps going
    wait_for(&core.events, 10, EventKind::Displayed);
    assert_eq!(core.registry().read().numbers(), vec![10]);
}

#[test]
fn new_request_ends_the_idle_wait() {
    // far longer than the test may take, only the wake signal gets it going
    let core = start_with(64, 60_000);
    thread::sleep(Duration::from_millis(100));

    let started = Instant::now();
    submit(&core, "30 Message(2) prompt");
    let deadline = started + Duration::from_secs(5);
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        let event = core
            .events
            .recv_timeout(left)
            .expect("dispatcher stayed asleep after a new request");
        if event.kind == EventKind::RequestProcessed {
            assert_eq!(event.alarm_number, 2);
            break;
        }
    }
}
