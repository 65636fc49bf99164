//! Timeout wrapper for blocking actuator links
//!
//! The wrapped actuator runs on a dedicated worker thread. Each command is
//! sent over a channel and the caller waits for the acknowledgement with a
//! deadline. A command that misses its deadline keeps running on the worker;
//! until it finishes, further commands are rejected instead of queueing
//! behind it.

use crate::actuator::{Actuator, ActuatorCommand, DriveCommand, Maneuver, TurnCommand};
use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct Request {
    command: ActuatorCommand,
    reply: Sender<Result<()>>,
}

/// Command that missed its deadline and has not been acknowledged yet
struct Pending {
    command: ActuatorCommand,
    reply: Receiver<Result<()>>,
}

/// Actuator decorator adding a per-command acknowledgement timeout
pub struct TimeoutActuator {
    requests: Option<Sender<Request>>,
    worker: Option<JoinHandle<()>>,
    timeout: Duration,
    pending: Option<Pending>,
}

impl TimeoutActuator {
    /// Move `inner` onto a worker thread and wrap it
    pub fn spawn<A>(inner: A, timeout: Duration) -> Result<Self>
    where
        A: Actuator + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded::<Request>();

        let handle = thread::Builder::new()
            .name("actuator-link".to_string())
            .spawn(move || {
                let mut inner = inner;
                for request in rx.iter() {
                    let result = inner.execute(request.command);
                    // Caller may have stopped waiting
                    let _ = request.reply.send(result);
                }
                log::debug!("Actuator worker exiting");
            })
            .map_err(|e| Error::Other(format!("Failed to spawn actuator thread: {}", e)))?;

        Ok(Self {
            requests: Some(tx),
            worker: Some(handle),
            timeout,
            pending: None,
        })
    }

    /// Configured acknowledgement timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a timed-out command is still running on the worker
    pub fn is_stalled(&mut self) -> bool {
        self.poll_pending();
        self.pending.is_some()
    }

    fn poll_pending(&mut self) {
        let Some(pending) = &self.pending else {
            return;
        };
        match pending.reply.try_recv() {
            Ok(result) => {
                log::info!(
                    "Late acknowledgement for {}: {:?}",
                    pending.command.command_type(),
                    result.as_ref().map(|_| ())
                );
                self.pending = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                self.requests = None;
            }
        }
    }

    fn call(&mut self, command: ActuatorCommand) -> Result<()> {
        self.poll_pending();
        if let Some(pending) = &self.pending {
            return Err(Error::Disconnected(format!(
                "{} still waiting for acknowledgement",
                pending.command.command_type()
            )));
        }

        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| Error::Disconnected("actuator worker exited".to_string()))?;

        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        requests
            .send(Request {
                command,
                reply: reply_tx,
            })
            .map_err(|_| Error::Disconnected("actuator worker exited".to_string()))?;

        match reply_rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "{} not acknowledged within {:?}",
                    command.command_type(),
                    self.timeout
                );
                self.pending = Some(Pending {
                    command,
                    reply: reply_rx,
                });
                Err(Error::Timeout {
                    command: command.command_type().to_string(),
                    after: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.requests = None;
                Err(Error::Disconnected(format!(
                    "actuator worker exited during {}",
                    command.command_type()
                )))
            }
        }
    }
}

impl Actuator for TimeoutActuator {
    fn forward(&mut self, cmd: DriveCommand) -> Result<()> {
        self.call(ActuatorCommand::Forward(cmd))
    }

    fn reverse(&mut self, cmd: DriveCommand) -> Result<()> {
        self.call(ActuatorCommand::Reverse(cmd))
    }

    fn turn_left(&mut self, cmd: TurnCommand) -> Result<()> {
        self.call(ActuatorCommand::TurnLeft(cmd))
    }

    fn turn_right(&mut self, cmd: TurnCommand) -> Result<()> {
        self.call(ActuatorCommand::TurnRight(cmd))
    }

    fn maneuver(&mut self, maneuver: Maneuver) -> Result<()> {
        self.call(ActuatorCommand::Maneuver(maneuver))
    }

    fn stop(&mut self) -> Result<()> {
        self.call(ActuatorCommand::Stop)
    }
}

impl Drop for TimeoutActuator {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop
        self.requests = None;
        self.poll_pending();
        if self.pending.is_some() {
            // Worker is blocked inside the link; joining could hang forever
            log::warn!("Detaching stalled actuator worker");
            return;
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Actuator whose forward command takes `delay` to acknowledge
    struct SlowActuator {
        delay: Duration,
        completed: Arc<AtomicUsize>,
    }

    impl Actuator for SlowActuator {
        fn forward(&mut self, _cmd: DriveCommand) -> Result<()> {
            thread::sleep(self.delay);
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn reverse(&mut self, _cmd: DriveCommand) -> Result<()> {
            Err(Error::InvalidParameter("reverse disabled".to_string()))
        }
        fn turn_left(&mut self, _cmd: TurnCommand) -> Result<()> {
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn turn_right(&mut self, _cmd: TurnCommand) -> Result<()> {
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn maneuver(&mut self, _maneuver: Maneuver) -> Result<()> {
            Ok(())
        }
        fn stop(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn slow(delay_ms: u64) -> (SlowActuator, Arc<AtomicUsize>) {
        let completed = Arc::new(AtomicUsize::new(0));
        (
            SlowActuator {
                delay: Duration::from_millis(delay_ms),
                completed: Arc::clone(&completed),
            },
            completed,
        )
    }

    #[test]
    fn test_acknowledged_command_passes_through() {
        let (inner, completed) = slow(0);
        let mut link = TimeoutActuator::spawn(inner, Duration::from_secs(2)).unwrap();

        link.forward(DriveCommand::new(40.0, 1.0)).unwrap();
        link.turn_left(TurnCommand::new(90.0, 1.0)).unwrap();

        assert_eq!(completed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_inner_error_propagates() {
        let (inner, _) = slow(0);
        let mut link = TimeoutActuator::spawn(inner, Duration::from_secs(2)).unwrap();

        let err = link.reverse(DriveCommand::new(20.0, 1.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_unacknowledged_command_times_out() {
        let (inner, completed) = slow(300);
        let mut link = TimeoutActuator::spawn(inner, Duration::from_millis(20)).unwrap();

        let err = link.forward(DriveCommand::new(40.0, 1.0)).unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(link.is_stalled());

        // Rejected while the first command is still running
        let err = link.turn_right(TurnCommand::new(10.0, 1.0)).unwrap_err();
        assert!(matches!(err, Error::Disconnected(_)));

        // Late acknowledgement clears the stall
        thread::sleep(Duration::from_millis(500));
        assert!(!link.is_stalled());
        link.turn_right(TurnCommand::new(10.0, 1.0)).unwrap();
        assert_eq!(completed.load(Ordering::SeqCst), 2);
    }
}
