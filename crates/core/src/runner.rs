//! Drives one tracking session: polling, the session state and the map.
//!
//! Everything is mutated from the single task running [`TrackingSession::run`],
//! between suspension points. Map clicks come back as [`Command`]s over a
//! channel, so the map holds nothing but a sender.

use std::sync::Arc;

use bustrack_map::{AcquireOutcome, MapSyncEngine, SelectionCallback, SurfaceProvider};
use bustrack_transit::identifiers::BusNumber;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::TelemetrySource;
use crate::config::TrackerConfig;
use crate::poller::TelemetryPoller;
use crate::session::SessionController;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Select(BusNumber),
    ClearSelection,
}

pub struct TrackingSession {
    controller: SessionController,
    engine: MapSyncEngine,
    poller: TelemetryPoller,
    commands: mpsc::UnboundedReceiver<Command>,
    sender: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
}

impl TrackingSession {
    /// Must be called within a Tokio runtime.
    pub fn new(config: &TrackerConfig, source: Arc<dyn TelemetrySource>) -> Self {
        let (sender, commands) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let clicks = sender.clone();
        let on_select: SelectionCallback = Arc::new(move |bus_no| {
            // Closed only once the session is gone.
            let _ = clicks.send(Command::Select(bus_no));
        });

        Self {
            controller: SessionController::new(config.route(), config.target_stop()),
            engine: MapSyncEngine::new(config.map.clone(), on_select),
            poller: TelemetryPoller::new(
                source,
                config.route(),
                config.target_stop(),
                config.poll_interval(),
                cancel.child_token(),
            ),
            commands,
            sender,
            cancel,
        }
    }

    pub fn commands(&self) -> mpsc::UnboundedSender<Command> {
        self.sender.clone()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Select(bus_no) => {
                if self.controller.select(bus_no) {
                    debug!(bus_no = ?self.controller.selected(), "Selected");
                }
            }
            Command::ClearSelection => self.controller.clear_selection(),
        }
    }

    fn redraw(&mut self) {
        self.engine.sync(&self.controller.snapshot());
    }

    /// Run until cancelled. `on_update` sees the session after every applied
    /// poll or command. The map is released before returning.
    pub async fn run(
        mut self,
        provider: &dyn SurfaceProvider,
        mut on_update: impl FnMut(&SessionController),
    ) -> SessionController {
        let container = self.engine.config().container.clone();
        let mut mount = Some(provider.mount(&container));

        info!(route = %self.controller.route().route_id, "Tracking started");

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                Some(mounted) = async {
                    match mount.as_mut() {
                        Some(pending) => Some(pending.await),
                        None => None,
                    }
                }, if mount.is_some() => {
                    mount = None;
                    if let Ok(AcquireOutcome::Ready) = self.engine.attach(mounted) {
                        self.redraw();
                    }
                }

                Some(command) = self.commands.recv() => {
                    self.handle(command);
                    self.redraw();
                    on_update(&self.controller);
                }

                batch = self.poller.next_batch() => {
                    let Some(batch) = batch else { break };
                    self.controller.apply_batch(batch);
                    self.redraw();
                    on_update(&self.controller);
                }
            }
        }

        // Abandons a mount that is still pending.
        drop(mount);
        self.poller.shutdown().await;
        self.engine.dispose();
        info!("Tracking stopped");

        self.controller
    }
}
