use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use bus::{MainCommand, UiCommand};
use dom::snapshot::{SnapshotTree, TreeSnapshot};
use replay::{Replayer, TargetTree};

/// Spawn the UI-thread loop over `tree`. Batches are applied in arrival
/// order and every failure is reported to the main thread. Once a batch fails
/// part way, later batches are refused and the tree stays as it was. The tree
/// is handed back when the loop ends.
pub fn start_ui_runtime<T>(
    tree: T,
    cmd_rx: Receiver<UiCommand>,
    main_tx: Sender<MainCommand>,
) -> JoinHandle<T>
where
    T: TargetTree + SnapshotTree + Send + 'static,
    <T as TargetTree>::Node: Send,
{
    thread::spawn(move || {
        let mut replayer = Replayer::new(tree);
        log::info!(target: "runtime.ui", "ui runtime started");

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                UiCommand::ApplyBatch { seq, batch } => {
                    if let Err(err) = replayer.apply_batch(seq, &batch) {
                        log::error!(target: "runtime.ui", "batch {seq}: {err}");
                        let _ = main_tx.send(MainCommand::ReplayFailed {
                            seq,
                            error: err.to_string(),
                        });
                    }
                }
                UiCommand::NativeEvent { target, event } => {
                    let Some(node) = replayer.node(target) else {
                        log::warn!(
                            target: "runtime.ui",
                            "{} on unknown element {target}",
                            event.event_type
                        );
                        continue;
                    };
                    if let Some(forwarded) = replayer.fire_native(node, &event)
                        && main_tx.send(MainCommand::Event(forwarded)).is_err()
                    {
                        break;
                    }
                }
                UiCommand::Snapshot { reply } => {
                    let lines = TreeSnapshot::of(replayer.tree()).as_lines().to_vec();
                    let _ = reply.send(lines);
                }
                UiCommand::Shutdown => break,
            }
        }
        log::info!(
            target: "runtime.ui",
            "ui runtime stopped after {} operations",
            replayer.applied_ops()
        );
        replayer.into_tree()
    })
}
