use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use bus::{BackgroundEvent, MainCommand, UiCommand};
use core_types::{BatchSeq, Encoding};
use dom::{BufferConfig, EncodingSink};
use element_api::{ElementApi, ElementApiConfig};
use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MainRuntimeConfig {
    pub encoding: Encoding,
    pub buffer: BufferConfig,
    pub elements: ElementApiConfig,
}

/// Spawn the main-thread loop. It owns the offscreen document: render jobs
/// mutate it through the element API, each job ends in a flush whose batch
/// goes to the UI thread, and events coming back are dispatched on it.
pub fn start_main_runtime(
    config: MainRuntimeConfig,
    cmd_rx: Receiver<MainCommand>,
    ui_tx: Sender<UiCommand>,
    bg_tx: Sender<BackgroundEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let sink = EncodingSink::new(config.encoding, config.buffer);
        let mut api = ElementApi::new(sink, config.elements);
        let mut seq = BatchSeq::INITIAL;
        log::info!(target: "runtime.main", "main runtime started ({:?})", config.encoding);

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                MainCommand::Render { job, options } => {
                    if let Err(err) = job(&mut api) {
                        log::warn!(target: "runtime.main", "render job failed: {err}");
                        let _ = bg_tx.send(BackgroundEvent::RenderFailed {
                            error: err.to_string(),
                        });
                    }
                    // Whatever the job recorded before failing is still
                    // flushed so both sides keep the same tree.
                    let flushed = match api.flush(options) {
                        Ok(flushed) => flushed,
                        Err(err) => {
                            log::error!(target: "runtime.main", "flush failed: {err}");
                            let _ = bg_tx.send(BackgroundEvent::RenderFailed {
                                error: err.to_string(),
                            });
                            continue;
                        }
                    };
                    if ui_tx
                        .send(UiCommand::ApplyBatch {
                            seq,
                            batch: flushed.batch,
                        })
                        .is_err()
                    {
                        log::info!(target: "runtime.main", "ui runtime gone, stopping");
                        break;
                    }
                    let _ = bg_tx.send(BackgroundEvent::Flushed {
                        seq,
                        pipeline_id: flushed.options.pipeline_id,
                        timing_flags: flushed.timing_flags,
                        exposure_changed: flushed.exposure_changed,
                    });
                    seq = seq.next();
                }
                MainCommand::Event(event) => {
                    for published in api.dispatch_event(&event) {
                        let _ = bg_tx.send(BackgroundEvent::Published(published));
                    }
                }
                MainCommand::ReplayFailed { seq, error } => {
                    log::error!(target: "runtime.main", "ui thread failed to replay batch {seq}: {error}");
                    let _ = bg_tx.send(BackgroundEvent::ReplayFailed { seq, error });
                }
                MainCommand::Shutdown => break,
            }
        }
        log::info!(target: "runtime.main", "main runtime stopped after {} batches", seq.0);
    })
}
