//! # Stick
//!
//! A console host for the debug stick engine. One simulated player stands in a
//! flat in-memory world; console lines stand in for their input and prompts
//! are printed as text.
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    missing_docs,
    clippy::unwrap_used
)]
#![allow(
    clippy::single_call_fn,
    clippy::multiple_inherent_impl,
    clippy::shadow_unrelated,
    clippy::missing_errors_doc,
    clippy::struct_excessive_bools,
    clippy::needless_pass_by_value,
    clippy::cargo_common_metadata
)]
use std::io;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use stick_core::config::StickConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio::{select, spawn};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info_span};

use crate::console::Command;
use crate::session::SessionError;

/// Console commands and prompt rendering.
pub mod console;
/// Log output setup.
pub mod logger;
/// The simulated player session.
pub mod session;

pub use session::Session;

/// The console host.
pub struct StickServer {
    /// The cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
    /// The session shared by the tick loop and the console.
    pub session: Arc<Mutex<Session>>,
    tick_interval: Duration,
}

impl StickServer {
    /// Creates the host with a fresh demo world.
    pub fn new(config: StickConfig) -> Result<Self, SessionError> {
        log::info!("Starting debug stick host");

        let tick_interval = Duration::from_secs(1) / config.tick_rate.max(1);
        let session = Session::new(config)?;

        Ok(Self {
            cancel_token: CancellationToken::new(),
            session: Arc::new(Mutex::new(session)),
            tick_interval,
        })
    }

    /// Starts the tick loop.
    pub fn start(&self) -> JoinHandle<()> {
        let session = self.session.clone();
        let cancel_token = self.cancel_token.clone();
        let tick_interval = self.tick_interval;

        spawn(async move {
            let mut interval = time::interval(tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                select! {
                    () = cancel_token.cancelled() => {
                        break;
                    }
                    _ = interval.tick() => {
                        let lines = session.lock().tick();
                        print_lines(&lines);
                    }
                }
            }
            log::debug!("Tick loop stopped");
        }
        .instrument(info_span!("ticks")))
    }

    /// Reads commands from stdin until `stop`, end of input or shutdown.
    #[tracing::instrument(name = "console", skip_all)]
    pub async fn run_console(&self) -> io::Result<()> {
        log::info!("Ready, type `help` for commands");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let line = select! {
                () = self.cancel_token.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                log::info!("End of input");
                break;
            };

            match console::parse(&line) {
                Ok(None) => {}
                Ok(Some(Command::Stop)) => break,
                Ok(Some(command)) => match self.session.lock().execute(command) {
                    Ok(output) => print_lines(&output),
                    Err(err) => println!("{err}"),
                },
                Err(err) => println!("{err}"),
            }
        }

        self.stop();
        Ok(())
    }

    /// Stops the host.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
