use tracing::info;

/// Waits for SIGTERM/SIGINT (Ctrl+C on non-Unix).
pub async fn setup_shutdown_signal() {
    use tokio::signal;

    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.unwrap();
        info!("received ctrl-c");
    }
}

type CleanupHook = Box<dyn FnOnce() + Send>;

/// Registers shutdown cleanup hooks and drains them in registration order
/// on shutdown. A single registry per process; registering twice for the
/// same resource is the caller's bug, not guarded against here.
#[derive(Default)]
pub struct CleanupRegistry {
    hooks: Vec<CleanupHook>,
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: impl FnOnce() + Send + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn drain(&mut self) {
        for hook in self.hooks.drain(..) {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn drains_hooks_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CleanupRegistry::new();

        let o1 = order.clone();
        registry.register(move || o1.lock().unwrap().push(1));
        let o2 = order.clone();
        registry.register(move || o2.lock().unwrap().push(2));

        registry.drain();
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }
}
