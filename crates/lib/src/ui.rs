//! The interactive surface prompts are shown on.
//!
//! The core never renders anything. It asks whichever [`UiContext`] is
//! currently attached to [`ActiveContext`] to present a decision, and treats
//! "no context attached" as a silent skip. A context can be destroyed at any
//! time; pending prompts on it are then dismissed without a decision.

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use handle_trait::Handle;
use tokio::sync::watch;
use url::Url;
use uuid::Uuid;

use crate::{fingerprint::Fingerprint, identity::Identity};

/// A button offered on a trust prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustOption {
    /// Trust the certificate from now on
    Trust,
    /// Stay offline for this certificate (existing accounts only)
    RemainOffline,
    /// Log the account out (existing accounts only)
    Logout,
    /// Abandon the login (new accounts only)
    Cancel,
}

/// Which explanation the prompt should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptExplanation {
    /// An existing account whose server certificate changed
    ExpectedExisting,
    /// An existing account that never pinned a certificate
    UnexpectedExisting,
    /// A login to a server with an unrecognized certificate
    NewAccount,
}

/// Who the prompt is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSubject {
    Account(Identity),
    Homeserver(Url),
}

/// Content of a trust prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPrompt {
    pub fingerprint: Fingerprint,
    pub subject: PromptSubject,
    pub explanation: PromptExplanation,
    pub options: Vec<TrustOption>,
}

impl TrustPrompt {
    pub fn offers(&self, option: TrustOption) -> bool {
        self.options.contains(&option)
    }
}

/// Something able to show prompts to the user.
#[async_trait]
pub trait InteractiveSurface: Send + Sync {
    /// Show the prompt and resolve with the option the user picked.
    async fn ask_trust(&self, prompt: &TrustPrompt) -> TrustOption;

    /// Tell the user a new key-backup recovery method appeared for `identity`.
    fn show_new_recovery_method(&self, identity: &Identity);
}

struct UiContextInner {
    id: Uuid,
    surface: Arc<dyn InteractiveSurface>,
    destroyed: watch::Sender<bool>,
}

/// One live interactive host (a window, a screen, a terminal session).
#[derive(Clone, Handle)]
pub struct UiContext {
    inner: Arc<UiContextInner>,
}

impl fmt::Debug for UiContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiContext")
            .field("id", &self.inner.id)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl PartialEq for UiContext {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for UiContext {}

impl UiContext {
    pub fn new(surface: Arc<dyn InteractiveSurface>) -> Self {
        let (destroyed, _) = watch::channel(false);
        Self {
            inner: Arc::new(UiContextInner {
                id: Uuid::new_v4(),
                surface,
                destroyed,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn surface(&self) -> &Arc<dyn InteractiveSurface> {
        &self.inner.surface
    }

    pub fn is_destroyed(&self) -> bool {
        *self.inner.destroyed.borrow()
    }

    /// Mark the context destroyed, waking everything waiting in
    /// [`destroyed`](Self::destroyed).
    pub fn destroy(&self) {
        self.inner.destroyed.send_replace(true);
    }

    /// Resolves once the context has been destroyed.
    pub async fn destroyed(&self) {
        let mut rx = self.inner.destroyed.subscribe();
        // The sender lives in `inner`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|destroyed| *destroyed).await;
    }
}

/// Slot holding the context prompts should currently go to.
#[derive(Debug, Clone, Default, Handle)]
pub struct ActiveContext {
    current: Arc<Mutex<Option<UiContext>>>,
}

impl ActiveContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new context for `surface` and make it current.
    pub fn attach(&self, surface: Arc<dyn InteractiveSurface>) -> UiContext {
        let context = UiContext::new(surface);
        *self.current.lock().unwrap() = Some(context.handle());
        context
    }

    /// The current context, unless there is none or it was destroyed.
    pub fn current(&self) -> Option<UiContext> {
        self.current
            .lock()
            .unwrap()
            .as_ref()
            .filter(|ctx| !ctx.is_destroyed())
            .map(UiContext::handle)
    }

    /// Destroy `context`, detaching it if it is current.
    pub fn destroy(&self, context: &UiContext) {
        context.destroy();
        let mut current = self.current.lock().unwrap();
        if current.as_ref() == Some(context) {
            *current = None;
        }
    }
}
