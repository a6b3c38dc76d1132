use std::future::Future;

use log::{debug, trace};
use tokio::task::JoinHandle;

/// Handle on a background event watch
///
/// The watching task is aborted on [`Subscription::unsubscribe`] or when the
/// handle is dropped, whichever comes first.
#[derive(Debug)]
pub struct Subscription {
    name: &'static str,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn spawn<F>(name: &'static str, future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        trace!("spawning subscription {}", name);
        Self {
            name,
            task: Some(tokio::spawn(future)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the watching task is still running
    pub fn is_active(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the watch, returns false if it was already stopped
    pub fn unsubscribe(&mut self) -> bool {
        trace!("unsubscribe {}", self.name);
        match self.task.take() {
            Some(handle) => {
                if handle.is_finished() {
                    debug!("Subscription {} is already finished", self.name);
                } else {
                    debug!("Subscription {} is running, stopping it", self.name);
                    handle.abort();
                }
                true
            }
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
