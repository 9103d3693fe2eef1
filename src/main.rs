use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recite::messages::{Message, MessageKind, MessageStorage, SourceDocument, UploadedFile};
use recite::sources::{SourceResolver, DEFAULT_DOWNLOAD_BASE};
use recite::speech::{AudioBackend, SynthesisEngine};
use recite::ui::{AppState, ReciteApp};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recite=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recite document chat");

    let resolver = SourceResolver::new(
        std::env::var("RECITE_FILES_BASE").unwrap_or_else(|_| DEFAULT_DOWNLOAD_BASE.to_string()),
    );

    let mut state = AppState::new(audio_backend(), synthesis_engine()).with_resolver(resolver);
    state.set_url_opener(Box::new(|url| info!("Open URL: {}", url)));
    state.set_viewer(Box::new(|path, page, search_text| {
        info!(
            "Open viewer: {} page {:?} highlight {:?}",
            path, page, search_text
        );
    }));
    seed_demo_conversation(&state.messages);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 720.0])
            .with_min_inner_size([360.0, 480.0])
            .with_title("Recite"),
        ..Default::default()
    };

    eframe::run_native(
        "Recite",
        options,
        Box::new(|cc| Ok(Box::new(ReciteApp::new(cc, state)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))
}

#[cfg(feature = "audio-io")]
fn audio_backend() -> Arc<dyn AudioBackend> {
    Arc::new(recite::speech::WavAudioBackend::new())
}

#[cfg(not(feature = "audio-io"))]
fn audio_backend() -> Arc<dyn AudioBackend> {
    warn!("Built without audio-io, recorded audio playback disabled");
    Arc::new(recite::speech::DisabledAudioBackend)
}

fn synthesis_engine() -> Arc<dyn SynthesisEngine> {
    #[cfg(feature = "audio-io")]
    {
        let model = std::env::var("RECITE_VOICE_MODEL").ok();
        let tokens = std::env::var("RECITE_VOICE_TOKENS").ok();

        if let (Some(model), Some(tokens)) = (model, tokens) {
            let config = recite::speech::SynthesisConfig::new(model, tokens);
            match recite::speech::VitsSynthesis::spawn(config) {
                Ok(engine) => return Arc::new(engine),
                Err(e) => warn!("Could not start synthesis engine: {}", e),
            }
        } else {
            warn!("RECITE_VOICE_MODEL/RECITE_VOICE_TOKENS not set, synthesis disabled");
        }
    }

    Arc::new(recite::speech::DisabledSynthesis)
}

/// A short scripted exchange so the widgets have something to show.
fn seed_demo_conversation(messages: &MessageStorage) {
    messages.add(
        Message::new(MessageKind::User, "What did revenue look like in Q1?")
            .with_file(UploadedFile::new("Q1-report.pdf", 48_128, "application/pdf")),
    );

    let mut reply = Message::new(
        MessageKind::Bot,
        "Revenue grew **12%** quarter over quarter, driven by subscriptions.",
    )
    .with_sources(vec![
        SourceDocument::new(
            "reports/Q1-report.pdf",
            "Subscription revenue grew 12% against the prior quarter",
        )
        .with_page(3),
        SourceDocument::new("notes/board-notes.txt", "Q1 summary shared with the board"),
        SourceDocument::new("legal/contract.docx", "Renewal terms for the largest account"),
        SourceDocument::new("assets/revenue-chart.png", "Quarterly revenue chart"),
    ]);

    // Point RECITE_DEMO_AUDIO at a WAV file to exercise recorded playback.
    if let Ok(audio) = std::env::var("RECITE_DEMO_AUDIO") {
        reply = reply.with_recorded_audio(audio);
    }

    messages.add(reply);
}
