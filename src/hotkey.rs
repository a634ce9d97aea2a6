//! Global hotkey registration lifecycle.
//!
//! The combination is fixed: Ctrl+Alt+B under a single numeric id. The
//! platform layer owns the actual OS registration and the message loop
//! that observes presses; it reports presses as `()` sends on an unbounded
//! channel. This module owns the register/release bookkeeping, including
//! the rule that a failed registration degrades the app instead of
//! stopping it, and that releasing twice is a no-op.

use tokio::sync::mpsc;

/// Process-wide registration id. At most one live registration per id.
pub const HOTKEY_ID: i32 = 1;

/// Human-readable form of the fixed combination, for logs and the idle
/// overlay text.
pub const HOTKEY_LABEL: &str = "Ctrl+Alt+B";

#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("hotkey registration failed: {0}")]
    RegistrationFailed(String),
}

/// OS-level registration primitive.
///
/// `register`/`unregister` are keyed by id so the backend stays oblivious
/// to channel bookkeeping. Implementations must make `unregister` safe to
/// call for an id that is not currently registered.
pub trait HotkeyBackend: Send {
    fn register(&self, id: i32) -> Result<(), HotkeyError>;
    fn unregister(&self, id: i32);
}

/// Sender half handed to the platform message loop; one send per press.
pub type ToggleSender = mpsc::UnboundedSender<()>;

/// Receiver half consumed by the composition root, which forwards each
/// event to `CaptureOrchestrator::toggle`.
pub type ToggleReceiver = mpsc::UnboundedReceiver<()>;

pub fn toggle_channel() -> (ToggleSender, ToggleReceiver) {
    mpsc::unbounded_channel()
}

/// A registered (or knowingly unregistered) global hotkey.
pub struct HotkeyChannel {
    backend: Box<dyn HotkeyBackend>,
    registered: bool,
}

impl HotkeyChannel {
    /// Attempt registration. Failure is non-fatal: the system keeps
    /// running without a hotkey trigger, and the failure is warned once
    /// here (the Windows bootstrap additionally shows a blocking notice).
    pub fn register(backend: Box<dyn HotkeyBackend>) -> Self {
        let registered = match backend.register(HOTKEY_ID) {
            Ok(()) => {
                log::info!("[HOTKEY] {} registered (id {})", HOTKEY_LABEL, HOTKEY_ID);
                true
            }
            Err(e) => {
                log::warn!(
                    "[HOTKEY] {} — continuing without a hotkey trigger",
                    e
                );
                false
            }
        };
        Self {
            backend,
            registered,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Release the OS registration. Safe to call any number of times.
    pub fn release(&mut self) {
        if std::mem::take(&mut self.registered) {
            self.backend.unregister(HOTKEY_ID);
            log::info!("[HOTKEY] released (id {})", HOTKEY_ID);
        }
    }
}

impl Drop for HotkeyChannel {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingBackend {
        fail: bool,
        registers: Arc<AtomicUsize>,
        unregisters: Arc<AtomicUsize>,
    }

    impl HotkeyBackend for CountingBackend {
        fn register(&self, _id: i32) -> Result<(), HotkeyError> {
            self.registers.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(HotkeyError::RegistrationFailed("combo already in use".into()))
            } else {
                Ok(())
            }
        }

        fn unregister(&self, _id: i32) {
            self.unregisters.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn backend(fail: bool) -> (CountingBackend, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let registers = Arc::new(AtomicUsize::new(0));
        let unregisters = Arc::new(AtomicUsize::new(0));
        (
            CountingBackend {
                fail,
                registers: registers.clone(),
                unregisters: unregisters.clone(),
            },
            registers,
            unregisters,
        )
    }

    #[test]
    fn double_release_unregisters_once() {
        let (b, _, unregisters) = backend(false);
        let mut channel = HotkeyChannel::register(Box::new(b));
        assert!(channel.is_registered());

        channel.release();
        channel.release();
        assert_eq!(unregisters.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_registration() {
        let (b, _, unregisters) = backend(false);
        drop(HotkeyChannel::register(Box::new(b)));
        assert_eq!(unregisters.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_registration_is_non_fatal_and_never_unregisters() {
        let (b, registers, unregisters) = backend(true);
        let mut channel = HotkeyChannel::register(Box::new(b));

        assert!(!channel.is_registered());
        channel.release();
        drop(channel);

        assert_eq!(registers.load(Ordering::SeqCst), 1);
        assert_eq!(unregisters.load(Ordering::SeqCst), 0);
    }
}
