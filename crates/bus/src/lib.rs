use core_types::{BatchSeq, UniqueId};
use dom::{CrossThreadEvent, EncodedBatch, EncodingSink};
use element_api::{ApiError, ElementApi, FlushOptions, PublishedEvent};
use replay::RawEvent;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

/// A render pass run on the main thread against the element API.
pub type RenderJob = Box<dyn FnOnce(&mut ElementApi<EncodingSink>) -> Result<(), ApiError> + Send>;

pub enum MainCommand {
    // Background -> main
    Render {
        job: RenderJob,
        options: FlushOptions,
    },
    // UI -> main
    Event(CrossThreadEvent),
    ReplayFailed {
        seq: BatchSeq,
        error: String,
    },
    Shutdown,
}

impl fmt::Debug for MainCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainCommand::Render { options, .. } => f
                .debug_struct("Render")
                .field("options", options)
                .finish_non_exhaustive(),
            MainCommand::Event(event) => f.debug_tuple("Event").field(event).finish(),
            MainCommand::ReplayFailed { seq, error } => f
                .debug_struct("ReplayFailed")
                .field("seq", seq)
                .field("error", error)
                .finish(),
            MainCommand::Shutdown => f.write_str("Shutdown"),
        }
    }
}

#[derive(Debug)]
pub enum UiCommand {
    // Main -> UI
    ApplyBatch {
        seq: BatchSeq,
        batch: EncodedBatch,
    },
    // Host input -> UI
    NativeEvent {
        target: UniqueId,
        event: RawEvent,
    },
    Snapshot {
        reply: Sender<Vec<String>>,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum BackgroundEvent {
    Flushed {
        seq: BatchSeq,
        pipeline_id: Option<String>,
        timing_flags: Vec<String>,
        exposure_changed: Vec<UniqueId>,
    },
    Published(PublishedEvent),
    RenderFailed {
        error: String,
    },
    ReplayFailed {
        seq: BatchSeq,
        error: String,
    },
}

/// Channel ends held by whoever drives the runtimes.
pub struct Bus {
    pub main_tx: Sender<MainCommand>,
    pub ui_tx: Sender<UiCommand>,
    pub bg_rx: Receiver<BackgroundEvent>,
}

/// Channel ends handed to the runtime threads.
pub struct RuntimeChannels {
    pub main_rx: Receiver<MainCommand>,
    pub ui_rx: Receiver<UiCommand>,
    pub bg_tx: Sender<BackgroundEvent>,
}

pub fn channels() -> (Bus, RuntimeChannels) {
    let (main_tx, main_rx) = mpsc::channel();
    let (ui_tx, ui_rx) = mpsc::channel();
    let (bg_tx, bg_rx) = mpsc::channel();
    (
        Bus {
            main_tx,
            ui_tx,
            bg_rx,
        },
        RuntimeChannels {
            main_rx,
            ui_rx,
            bg_tx,
        },
    )
}
