//! Async driver: feeds the engine from a channel and fires quiet-period deadlines

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{with_timeout, Instant};

use crate::engine::ScannerEngine;
use crate::handler::ScanHandler;
use crate::types::KeyEvent;

/// Commands accepted by [`detector_task`]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DetectorCommand {
    /// Raw key event, timestamped on receipt
    Key(KeyEvent),
    /// Attach the listener
    Start,
    /// Detach the listener, cancelling any pending evaluation
    Stop,
    /// Stop and return the engine and handler to the caller
    Shutdown,
}

/// Run the detector until [`DetectorCommand::Shutdown`]
///
/// Waits for the next command, bounded by the engine's pending deadline when
/// there is one. A command arriving first cancels that wait; its expiry
/// classifies the buffer. Dispositions are not reported back: hosts that need
/// to suppress their events call [`ScannerEngine::handle_key`] directly.
pub async fn detector_task<M: RawMutex, const Q: usize, const N: usize, H: ScanHandler>(
    commands: Receiver<'_, M, DetectorCommand, Q>,
    mut engine: ScannerEngine<N>,
    mut handler: H,
) -> (ScannerEngine<N>, H) {
    loop {
        let command = match engine.next_deadline() {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match with_timeout(remaining, commands.receive()).await {
                    Ok(command) => command,
                    Err(_) => {
                        let _outcome = engine.poll(Instant::now().max(deadline), &mut handler);

                        #[cfg(feature = "defmt")]
                        defmt::trace!("quiet period elapsed: {:?}", _outcome);
                        continue;
                    }
                }
            }
            None => commands.receive().await,
        };

        match command {
            DetectorCommand::Key(event) => {
                let _ = engine.handle_key(&event, Instant::now(), &mut handler);
            }
            DetectorCommand::Start => engine.start(),
            DetectorCommand::Stop => engine.stop(),
            DetectorCommand::Shutdown => {
                engine.stop();
                return (engine, handler);
            }
        }
    }
}
