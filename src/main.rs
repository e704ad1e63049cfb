use std::error::Error;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use bus::{BackgroundEvent, MainCommand, UiCommand};
use core_types::Encoding;
use element_api::{EventKind, FlushOptions, InlineStyles};
use replay::{RawEvent, RawValue, ShadowTree};
use runtime_main::{MainRuntimeConfig, start_main_runtime};
use runtime_ui::start_ui_runtime;
use serde::Deserialize;

const ENCODING_ENV: &str = "OFFSCREEN_ENCODING";
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AppConfig {
    #[serde(flatten)]
    runtime: MainRuntimeConfig,
}

impl AppConfig {
    fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let mut config = match path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => AppConfig::default(),
        };
        if let Ok(value) = std::env::var(ENCODING_ENV) {
            config.runtime.encoding = value.parse::<Encoding>()?;
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args_os().nth(1);
    let config = AppConfig::load(path.as_deref().map(Path::new))?;
    log::info!("encoding: {:?}", config.runtime.encoding);

    let (bus, ends) = bus::channels();
    let main = start_main_runtime(config.runtime, ends.main_rx, bus.ui_tx.clone(), ends.bg_tx);
    let ui = start_ui_runtime(ShadowTree::new(), ends.ui_rx, bus.main_tx.clone());

    let (button_tx, button_rx) = mpsc::channel();
    bus.main_tx.send(MainCommand::Render {
        job: Box::new(move |api| {
            let page = api.create_page("0", 0)?;
            let title = api.create_text(page)?;
            let label = api.create_raw_text("hello")?;
            api.append_element(title, label)?;
            let button = api.create_view(page)?;
            api.add_class(button, "primary")?;
            api.set_inline_styles(button, InlineStyles::Text("width: 120px; height: 40px"))?;
            api.add_event(button, EventKind::Bind, "tap", Some("onTap"))?;
            api.append_element(page, title)?;
            api.append_element(page, button)?;
            let _ = button_tx.send(button);
            Ok(())
        }),
        options: FlushOptions {
            pipeline_id: Some("first-screen".into()),
        },
    })?;
    let button = button_rx.recv_timeout(REPLY_TIMEOUT)?;

    bus.ui_tx.send(UiCommand::NativeEvent {
        target: button,
        event: RawEvent::new("tap", true)
            .with_property("x", RawValue::Number(12.0))
            .with_property("y", RawValue::Number(8.0)),
    })?;

    while let Ok(event) = bus.bg_rx.recv_timeout(REPLY_TIMEOUT) {
        match event {
            BackgroundEvent::Flushed { seq, .. } => log::info!("flushed batch {seq}"),
            BackgroundEvent::Published(published) => {
                log::info!(
                    "{} called for {} on {}",
                    published.handler,
                    published.event.event_type,
                    published.current_target
                );
                break;
            }
            BackgroundEvent::RenderFailed { error } => log::error!("render failed: {error}"),
            BackgroundEvent::ReplayFailed { seq, error } => {
                log::error!("batch {seq} failed on the ui thread: {error}")
            }
        }
    }

    let (reply, lines) = mpsc::channel();
    bus.ui_tx.send(UiCommand::Snapshot { reply })?;
    for line in lines.recv_timeout(REPLY_TIMEOUT)? {
        println!("{line}");
    }

    bus.main_tx.send(MainCommand::Shutdown)?;
    bus.ui_tx.send(UiCommand::Shutdown)?;
    main.join().map_err(|_| "main runtime panicked")?;
    ui.join().map_err(|_| "ui runtime panicked")?;
    Ok(())
}
