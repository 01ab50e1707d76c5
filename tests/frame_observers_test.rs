use hamlet::flow::FrameObservers;
use instant::Duration;

#[test]
fn observers_run_in_registration_order() {
    let mut observers: FrameObservers<Vec<&'static str>> = FrameObservers::new();
    observers.add(|log, _| log.push("first"));
    observers.add(|log, _| log.push("second"));
    let mut log = Vec::new();

    observers.notify(&mut log, Duration::from_millis(16));

    assert_eq!(log, vec!["first", "second"]);
    assert_eq!(observers.len(), 2);
}

#[test]
fn observers_receive_the_frame_time() {
    let mut observers = FrameObservers::new();
    observers.add(|total: &mut Duration, dt| *total += dt);
    let mut total = Duration::ZERO;

    observers.notify(&mut total, Duration::from_millis(16));
    observers.notify(&mut total, Duration::from_millis(17));

    assert_eq!(total, Duration::from_millis(33));
}

#[test]
fn removed_observer_stops_firing() {
    let mut observers = FrameObservers::new();
    let counting = observers.add(|count: &mut u32, _| *count += 1);
    observers.add(|count: &mut u32, _| *count += 10);
    let mut count = 0;

    observers.notify(&mut count, Duration::ZERO);
    assert_eq!(count, 11);

    assert!(observers.remove(counting));
    observers.notify(&mut count, Duration::ZERO);
    assert_eq!(count, 21);
    assert_eq!(observers.len(), 1);
}

#[test]
fn removing_twice_reports_false() {
    let mut observers = FrameObservers::new();
    let handle = observers.add(|_: &mut (), _| {});

    assert!(observers.remove(handle));
    assert!(!observers.remove(handle));
    assert!(observers.is_empty());
}

#[test]
fn handles_are_not_reused() {
    let mut observers = FrameObservers::new();
    let first = observers.add(|_: &mut (), _| {});
    observers.remove(first);
    let second = observers.add(|_: &mut (), _| {});

    assert_ne!(first, second);
    assert!(!observers.remove(first));
    assert_eq!(observers.len(), 1);
}

#[test]
fn clear_drops_every_observer() {
    let mut observers = FrameObservers::default();
    observers.add(|count: &mut u32, _| *count += 1);
    observers.add(|count: &mut u32, _| *count += 1);
    observers.clear();
    let mut count = 0;

    observers.notify(&mut count, Duration::ZERO);

    assert_eq!(count, 0);
    assert!(observers.is_empty());
}
