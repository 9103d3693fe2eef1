//! Application state management
//!
//! Central state for the chat view: the message store, one speech
//! controller per speech-capable message, the source-attachment resolver,
//! and the injected collaborator callbacks (embedded viewer, URL opener).

use crate::messages::{Message, MessageKind, MessageStorage};
use crate::sources::{SourceAction, SourceResolver};
use crate::speech::{AudioBackend, SpeechController, SynthesisEngine};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Embedded-viewer collaborator: `(path, page, search_text)`.
pub type ViewerCallback = Box<dyn Fn(&str, Option<u32>, &str)>;

/// Collaborator that opens a URL (external preview, download).
pub type UrlCallback = Box<dyn Fn(&str)>;

/// Central application state
pub struct AppState {
    /// Message storage (thread-safe)
    pub messages: MessageStorage,

    /// Current text input
    pub input_text: String,

    /// Last error message
    pub last_error: Option<String>,

    resolver: SourceResolver,
    audio_backend: Arc<dyn AudioBackend>,
    synthesis: Arc<dyn SynthesisEngine>,

    /// One controller per message that has been toggled at least once.
    /// Created on first interaction, dropped when the message goes away.
    controllers: HashMap<Uuid, SpeechController>,

    viewer: Option<ViewerCallback>,
    url_opener: Option<UrlCallback>,
}

impl AppState {
    pub fn new(audio_backend: Arc<dyn AudioBackend>, synthesis: Arc<dyn SynthesisEngine>) -> Self {
        Self {
            messages: MessageStorage::new(),
            input_text: String::new(),
            last_error: None,
            resolver: SourceResolver::default(),
            audio_backend,
            synthesis,
            controllers: HashMap::new(),
            viewer: None,
            url_opener: None,
        }
    }

    /// Replace the resolver configuration (download endpoint). Viewer
    /// availability stays tied to the registered callback.
    pub fn with_resolver(mut self, resolver: SourceResolver) -> Self {
        self.resolver = resolver.with_viewer(self.viewer.is_some());
        self
    }

    pub fn resolver(&self) -> &SourceResolver {
        &self.resolver
    }

    /// Register the embedded viewer. PDF sources only get their open
    /// affordance once a viewer exists.
    pub fn set_viewer(&mut self, callback: ViewerCallback) {
        self.viewer = Some(callback);
        self.resolver = self.resolver.clone().with_viewer(true);
    }

    /// Register the URL opener used for previews and downloads.
    pub fn set_url_opener(&mut self, callback: UrlCallback) {
        self.url_opener = Some(callback);
    }

    /// Send the typed input as a user message
    pub fn send_message(&mut self) {
        let text = self.input_text.trim().to_string();
        if text.is_empty() {
            return;
        }

        self.messages.add(Message::new(MessageKind::User, text));
        self.input_text.clear();
    }

    /// Toggle speech playback for a message, creating its controller on
    /// first use. Messages without a speech affordance are ignored.
    pub fn toggle_speech(&mut self, message: &Message) {
        if let Some(controller) = self.controllers.get_mut(&message.id) {
            controller.toggle();
            return;
        }

        match SpeechController::for_message(
            message,
            Arc::clone(&self.audio_backend),
            Arc::clone(&self.synthesis),
        ) {
            Some(mut controller) => {
                controller.toggle();
                self.controllers.insert(message.id, controller);
            }
            None => debug!("Message {} has no speech affordance", message.id),
        }
    }

    /// Whether the given message is audibly playing right now.
    pub fn is_speaking(&self, id: Uuid) -> bool {
        self.controllers
            .get(&id)
            .map(SpeechController::is_playing)
            .unwrap_or(false)
    }

    /// Whether any message is audibly playing.
    pub fn any_speaking(&self) -> bool {
        self.controllers.values().any(SpeechController::is_playing)
    }

    /// Drain backend events into every controller's playing flag. Called
    /// once per frame.
    pub fn poll_events(&mut self) {
        for controller in self.controllers.values_mut() {
            controller.poll_events();
        }
    }

    /// Drop controllers whose message left the store. Dropping releases
    /// backend resources (unmount cleanup).
    pub fn prune_controllers(&mut self) {
        let messages = self.messages.clone();
        self.controllers.retain(|id, _| messages.contains(*id));
    }

    /// Hand a resolved source action to the matching collaborator.
    pub fn dispatch(&mut self, action: SourceAction) {
        match action {
            SourceAction::OpenViewer {
                path,
                page,
                search_text,
            } => match &self.viewer {
                Some(callback) => callback(&path, page, &search_text),
                None => debug!("No viewer registered for {}", path),
            },
            SourceAction::OpenPreview { url } | SourceAction::Download { url } => {
                match &self.url_opener {
                    Some(callback) => callback(&url),
                    None => debug!("No URL opener registered for {}", url),
                }
            }
        }
    }

    /// Clear the conversation and release every playback resource.
    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.controllers.clear();
    }

    /// Release every playback resource without touching the messages.
    /// Used on application exit.
    pub fn shutdown(&mut self) {
        self.controllers.clear();
    }
}
