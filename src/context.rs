//! Cooperative cancellation across threads.
//!
//! Cloned handles share one flag; cancelling any of them wakes every waiter.

use std::{
    sync::{Arc, Condvar, Mutex},
    time::Duration,
};

#[derive(Clone, Debug, Default)]
pub struct Context {
    shared: Arc<(Mutex<bool>, Condvar)>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the context.
    pub fn cancel(&self) {
        let (cancelled, cv) = &*self.shared;
        *cancelled.lock().unwrap() = true;
        cv.notify_all();
    }

    /// Returns true iff the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.shared.0.lock().unwrap()
    }

    /// Sleep for `duration`, waking early if the context is cancelled.
    /// Returns true if the context has been cancelled.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (cancelled, cv) = &*self.shared;
        let g = cancelled.lock().unwrap();
        let (g, _) = cv.wait_timeout_while(g, duration, |c| !*c).unwrap();
        *g
    }

    /// A guard that cancels the context when dropped, including on unwind.
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop(self.clone())
    }
}

pub struct CancelOnDrop(Context);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}
