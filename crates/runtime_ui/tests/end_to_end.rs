use std::sync::mpsc;
use std::time::Duration;

use bus::{BackgroundEvent, MainCommand, UiCommand, channels};
use core_types::{BatchSeq, Encoding, UniqueId};
use dom::{EncodedBatch, Operation};
use dom::snapshot::TreeSnapshot;
use element_api::{EventKind, FlushOptions};
use replay::{RawEvent, RawValue, ShadowTree};
use runtime_main::{MainRuntimeConfig, start_main_runtime};
use runtime_ui::start_ui_runtime;

const TIMEOUT: Duration = Duration::from_secs(5);

fn snapshot(ui_tx: &mpsc::Sender<UiCommand>) -> Vec<String> {
    let (reply, lines) = mpsc::channel();
    ui_tx.send(UiCommand::Snapshot { reply }).unwrap();
    lines.recv_timeout(TIMEOUT).unwrap()
}

#[test]
fn render_replay_and_event_round_trip() {
    for encoding in [Encoding::Binary, Encoding::ObjectLog] {
        let (bus, ends) = channels();
        let config = MainRuntimeConfig {
            encoding,
            ..MainRuntimeConfig::default()
        };
        let main = start_main_runtime(config, ends.main_rx, bus.ui_tx.clone(), ends.bg_tx);
        let ui = start_ui_runtime(ShadowTree::new(), ends.ui_rx, bus.main_tx.clone());

        let (uid_tx, uid_rx) = mpsc::channel();
        bus.main_tx
            .send(MainCommand::Render {
                job: Box::new(move |api| {
                    let page = api.create_page("page", 0)?;
                    let button = api.create_view(page)?;
                    api.set_id(button, Some("go"))?;
                    api.append_element(page, button)?;
                    api.add_event(button, EventKind::Catch, "tap", Some("onGo"))?;
                    api.add_event(page, EventKind::Bind, "tap", Some("onPage"))?;
                    uid_tx.send(button).unwrap();
                    Ok(())
                }),
                options: FlushOptions::default(),
            })
            .unwrap();
        let button = uid_rx.recv_timeout(TIMEOUT).unwrap();
        assert!(matches!(
            bus.bg_rx.recv_timeout(TIMEOUT).unwrap(),
            BackgroundEvent::Flushed { seq: BatchSeq(0), .. }
        ));

        let lines = snapshot(&bus.ui_tx);
        assert_eq!(lines.len(), 3, "{lines:#?}");
        assert_eq!(lines[0], "<#root>");
        assert!(lines[1].starts_with("  <page"), "{lines:#?}");
        assert!(lines[2].contains("id=\"go\""), "{lines:#?}");

        bus.ui_tx
            .send(UiCommand::NativeEvent {
                target: button,
                event: RawEvent::new("tap", true)
                    .with_property("detail", RawValue::Number(1.0))
                    .with_property("target", RawValue::Node(7)),
            })
            .unwrap();
        let BackgroundEvent::Published(published) = bus.bg_rx.recv_timeout(TIMEOUT).unwrap() else {
            panic!("expected a published handler call");
        };
        assert_eq!(published.handler, "onGo");
        assert_eq!(published.component_id, None);
        assert_eq!(
            serde_json::Value::Object(published.event.properties),
            serde_json::json!({"detail": 1.0})
        );
        // The catch handler stopped propagation before the page saw it.
        assert!(bus.bg_rx.recv_timeout(Duration::from_millis(100)).is_err());

        bus.main_tx.send(MainCommand::Shutdown).unwrap();
        main.join().unwrap();
        bus.ui_tx.send(UiCommand::Shutdown).unwrap();
        let tree = ui.join().unwrap();
        assert_eq!(TreeSnapshot::of(&tree).as_lines(), lines.as_slice());
    }
}

#[test]
fn replay_failures_reach_the_background() {
    let (bus, ends) = channels();
    let main = start_main_runtime(
        MainRuntimeConfig::default(),
        ends.main_rx,
        bus.ui_tx.clone(),
        ends.bg_tx,
    );
    let ui = start_ui_runtime(ShadowTree::new(), ends.ui_rx, bus.main_tx.clone());

    bus.ui_tx
        .send(UiCommand::ApplyBatch {
            seq: BatchSeq(4),
            batch: EncodedBatch::Log(Vec::new()),
        })
        .unwrap();
    let BackgroundEvent::ReplayFailed { seq, error } = bus.bg_rx.recv_timeout(TIMEOUT).unwrap()
    else {
        panic!("expected a replay failure");
    };
    assert_eq!(seq, BatchSeq(4));
    assert_eq!(error, "batch #4 arrived out of order (expected #0)");

    bus.ui_tx
        .send(UiCommand::NativeEvent {
            target: UniqueId(42),
            event: RawEvent::new("tap", true),
        })
        .unwrap();
    assert_eq!(snapshot(&bus.ui_tx), vec!["<#root>".to_string()]);

    bus.main_tx.send(MainCommand::Shutdown).unwrap();
    main.join().unwrap();
    bus.ui_tx.send(UiCommand::Shutdown).unwrap();
    ui.join().unwrap();
}

#[test]
fn batches_after_a_divergence_are_refused() {
    let (bus, ends) = channels();
    let main = start_main_runtime(
        MainRuntimeConfig::default(),
        ends.main_rx,
        bus.ui_tx.clone(),
        ends.bg_tx,
    );
    let ui = start_ui_runtime(ShadowTree::new(), ends.ui_rx, bus.main_tx.clone());

    let failures = [
        (
            BatchSeq(0),
            vec![Operation::Remove { uid: UniqueId(9) }],
            "cannot find element with uniqueId: 9",
        ),
        (
            BatchSeq(1),
            vec![
                Operation::CreateElement {
                    uid: UniqueId(2),
                    tag: "view".to_string(),
                },
                Operation::Append {
                    uid: UniqueId::ROOT,
                    children: vec![UniqueId(2)],
                },
            ],
            "replay stopped after batch #0 diverged",
        ),
    ];
    for (seq, ops, message) in failures {
        bus.ui_tx
            .send(UiCommand::ApplyBatch {
                seq,
                batch: EncodedBatch::Log(ops),
            })
            .unwrap();
        let BackgroundEvent::ReplayFailed { seq: failed, error } =
            bus.bg_rx.recv_timeout(TIMEOUT).unwrap()
        else {
            panic!("expected a replay failure for batch {seq}");
        };
        assert_eq!(failed, seq);
        assert_eq!(error, message);
    }
    assert_eq!(snapshot(&bus.ui_tx), vec!["<#root>".to_string()]);

    bus.main_tx.send(MainCommand::Shutdown).unwrap();
    main.join().unwrap();
    bus.ui_tx.send(UiCommand::Shutdown).unwrap();
    ui.join().unwrap();
}
