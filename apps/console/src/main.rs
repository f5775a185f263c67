use std::cell::RefCell;

use anyhow::Result;
use clap::Parser;
use relay_core::{ChannelSignal, InputEventRelay, ReleaseKind, Surface, WsChannel};
use shared::error::ChannelError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
struct Args {
    /// Override the channel endpoint, e.g. ws://192.168.1.20:6181
    #[arg(long)]
    server_url: Option<String>,
}

/// Console stand-in for the page surface: the pending input line plays
/// the text input element, stdout plays the scrollable display.
struct ConsoleSurface {
    pending_input: RefCell<String>,
}

impl ConsoleSurface {
    fn new() -> Self {
        Self {
            pending_input: RefCell::new(String::new()),
        }
    }

    fn set_input(&self, text: &str) {
        *self.pending_input.borrow_mut() = text.to_string();
    }
}

impl Surface for ConsoleSurface {
    fn input_text(&self) -> String {
        self.pending_input.borrow().clone()
    }

    fn render_display(&self, lines: &[String]) {
        println!("---- messages (newest first) ----");
        for line in lines {
            println!("{line}");
        }
        println!("---------------------------------");
    }

    fn alert(&self, message: &str) {
        eprintln!("[ALERT] {message}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let settings = load_settings();
    let server_url = args.server_url.unwrap_or_else(|| settings.server_url());

    let (channel, mut signals) = WsChannel::connect(&server_url).await?;
    info!(%server_url, "channel connected");

    let mut relay = InputEventRelay::new(settings.relay_config(), channel, ConsoleSurface::new());

    println!("commands: press | release | out | say <text> | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            signal = signals.recv() => match signal {
                Some(ChannelSignal::Message { channel, payload }) => {
                    relay.on_inbound_message(&channel, payload);
                }
                Some(ChannelSignal::Terminated { reason }) => {
                    relay.on_channel_terminated(&reason);
                    return Err(ChannelError::Terminated { reason }.into());
                }
                None => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "press" => relay.on_press(),
                    "release" => relay.on_release(ReleaseKind::Up),
                    "out" => relay.on_release(ReleaseKind::Out),
                    "quit" => break,
                    "" => {}
                    other => {
                        if let Some(text) = other.strip_prefix("say ") {
                            relay.surface().set_input(text);
                            relay.send_input_message();
                        } else {
                            println!("unknown command: {other}");
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
