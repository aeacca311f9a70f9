//! Acknowledgement callbacks supplied by message senders.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

type AckFn = Box<dyn FnOnce(Vec<Value>) + Send>;

/// The optional trailing acknowledgement function of an incoming message.
///
/// Cloning shares the same underlying callback, so the reply can be sent at
/// most once no matter how many clones exist. A no-op sender accepts replies
/// and discards them, letting handlers call `send` unconditionally.
///
/// ## Example
///
/// ```
/// use socket_controllers::AckSender;
/// use serde_json::json;
///
/// let (tx, rx) = std::sync::mpsc::channel();
/// let ack = AckSender::new(move |args| tx.send(args).unwrap());
///
/// assert!(ack.send(vec![json!("ok")]));
/// assert!(!ack.send(vec![json!("again")]));
/// assert_eq!(rx.recv().unwrap(), vec![json!("ok")]);
/// ```
#[derive(Clone, Default)]
pub struct AckSender {
    callback: Option<Arc<Mutex<Option<AckFn>>>>,
}

impl AckSender {
    /// Wrap a reply function supplied by the transport.
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Vec<Value>) + Send + 'static,
    {
        Self {
            callback: Some(Arc::new(Mutex::new(Some(Box::new(callback))))),
        }
    }

    /// A sender that silently drops replies.
    pub fn noop() -> Self {
        Self::default()
    }

    /// Whether this sender discards replies.
    pub fn is_noop(&self) -> bool {
        self.callback.is_none()
    }

    /// Whether the reply has already been sent.
    pub fn is_sent(&self) -> bool {
        match &self.callback {
            Some(slot) => slot.lock().is_none(),
            None => false,
        }
    }

    /// Send the reply. Returns `false` if this is a no-op sender or a reply
    /// was already sent through any clone.
    pub fn send(&self, args: Vec<Value>) -> bool {
        let Some(slot) = &self.callback else {
            return false;
        };
        let callback = slot.lock().take();
        match callback {
            Some(callback) => {
                callback(args);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for AckSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AckSender")
            .field("noop", &self.is_noop())
            .field("sent", &self.is_sent())
            .finish()
    }
}
