//! Runtime composition
//!
//! Resolution turns a profile into a fully bound [`ResolvedRuntime`];
//! composition wraps that runtime in an input channel and a conversation.

use super::binder::{
    bind_active_stt, bind_audio_engine, bind_passive_stt, bind_tts, bind_vad, EngineBinding,
};
use super::config::EngineSelection;
use crate::audio::vad::VoiceActivityDetector;
use crate::audio::{negotiate_input, negotiate_output, AudioEngine, InputDevice, OutputDevice};
use crate::brain::{load_speech_handlers, standard_phrases, Dispatcher};
use crate::conversation::Conversation;
use crate::mic::{BatchMic, InputChannelMode, LiveMic, MicMode, TextMic};
use crate::plugins::{builtin, PluginCatalog};
use crate::profile::Profile;
use crate::speech::{SpeechToText, TextToSpeech};
use crate::Result;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{info, warn};

/// Every role bound and every device negotiated, ready to be composed
pub struct ResolvedRuntime {
    pub selection: EngineSelection,
    pub profile: Profile,
    pub audio: EngineBinding<dyn AudioEngine>,
    pub input: InputDevice,
    pub output: OutputDevice,
    pub vad: EngineBinding<dyn VoiceActivityDetector>,
    pub dispatcher: Dispatcher,
    pub active_stt: EngineBinding<dyn SpeechToText>,
    pub passive_stt: EngineBinding<dyn SpeechToText>,
    pub tts: EngineBinding<dyn TextToSpeech>,
}

pub struct RuntimeComposer {
    catalog: Arc<dyn PluginCatalog>,
}

impl RuntimeComposer {
    pub fn new(catalog: Arc<dyn PluginCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &dyn PluginCatalog {
        self.catalog.as_ref()
    }

    /// Bind every role in order; the first failure stops resolution
    pub fn resolve(&self, profile: Profile, force_print_transcript: bool) -> Result<ResolvedRuntime> {
        let catalog = self.catalog.as_ref();
        let selection = EngineSelection::resolve(&profile, force_print_transcript);

        let audio = bind_audio_engine(catalog, &selection.audio_engine, &profile)?;
        let input = negotiate_input(audio.instance.as_ref(), &profile)?;
        let output = negotiate_output(audio.instance.as_ref(), &profile)?;
        let vad = bind_vad(catalog, &selection.vad, &input, &profile)?;

        let mut dispatcher = Dispatcher::new(standard_phrases(&profile, &selection.language));
        load_speech_handlers(catalog, &profile, &mut dispatcher)?;

        let active_stt = bind_active_stt(
            catalog,
            &selection.active_stt,
            &dispatcher.plugin_phrases(),
            &profile,
        )?;

        let mut keyword_phrases = dispatcher.standard_phrases().to_vec();
        keyword_phrases.push(selection.keyword.clone());
        let passive_stt = bind_passive_stt(
            catalog,
            &selection.passive_stt,
            &active_stt,
            &keyword_phrases,
            &profile,
        )?;

        let tts = bind_tts(catalog, &selection.tts, &profile)?;

        Ok(ResolvedRuntime {
            selection,
            profile,
            audio,
            input,
            output,
            vad,
            dispatcher,
            active_stt,
            passive_stt,
            tts,
        })
    }

    /// Build the input channel and conversation for a resolved runtime
    pub fn compose(&self, runtime: ResolvedRuntime, mode: &MicMode) -> Result<Assistant> {
        self.compose_with_output(runtime, mode, Box::new(io::stdout()))
    }

    /// Like [`compose`](Self::compose), with text and batch output sent to `transcript`
    pub fn compose_with_output(
        &self,
        runtime: ResolvedRuntime,
        mode: &MicMode,
        transcript: Box<dyn Write>,
    ) -> Result<Assistant> {
        let ResolvedRuntime {
            selection,
            profile,
            audio,
            input,
            output,
            vad,
            dispatcher,
            active_stt,
            passive_stt,
            tts,
        } = runtime;
        let silent_capture = audio.slug() == builtin::NULL_AUDIO_SLUG;
        let engine: Arc<dyn AudioEngine> = Arc::from(audio.instance);

        let mic = match mode {
            MicMode::Text => {
                info!("Using local text input and output");
                InputChannelMode::TextSimulated(TextMic::from_stdin(transcript, &selection.keyword))
            }
            MicMode::Batch(path) => {
                info!("Using batch mode with {}", path.display());
                InputChannelMode::BatchReplay(BatchMic::open(
                    path,
                    passive_stt.instance,
                    active_stt.instance,
                    &selection.keyword,
                    transcript,
                )?)
            }
            MicMode::Live => {
                if silent_capture {
                    warn!(
                        "Audio engine '{}' only captures silence, live mode will never hear a command",
                        builtin::NULL_AUDIO_SLUG
                    );
                }
                info!(
                    "Using live audio: input '{}', output '{}'",
                    input.slug(),
                    output.slug()
                );
                InputChannelMode::Live(
                    LiveMic::new(
                        Arc::clone(&engine),
                        input,
                        output,
                        vad.instance,
                        passive_stt.instance,
                        active_stt.instance,
                        tts.instance,
                        &selection.keyword,
                    )
                    .with_phrases(selection.reply.clone(), selection.response.clone())
                    .with_print_transcript(selection.print_transcript),
                )
            }
        };

        let conversation = Conversation::new(
            mic,
            dispatcher,
            &selection.keyword,
            profile.get_str(&["first_name"]),
        );
        Ok(Assistant {
            conversation,
            engine,
            catalog: Arc::clone(&self.catalog),
        })
    }
}

/// A composed assistant
pub struct Assistant {
    conversation: Conversation<InputChannelMode>,
    engine: Arc<dyn AudioEngine>,
    catalog: Arc<dyn PluginCatalog>,
}

impl Assistant {
    pub fn mode(&self) -> &'static str {
        self.conversation.mic().name()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        self.conversation.dispatcher()
    }

    pub fn run(&mut self) -> Result<()> {
        info!("Starting {} conversation", self.mode());
        self.conversation.greet()?;
        self.conversation.handle_forever()
    }

    /// `name (vVERSION) - description` for every plugin, in aligned columns
    pub fn plugin_listing(&self) -> Vec<String> {
        plugin_listing(self.catalog.as_ref())
    }

    pub fn list_plugins(&self) {
        for line in self.plugin_listing() {
            println!("{}", line);
        }
    }

    pub fn device_listing(&self) -> Result<Vec<String>> {
        Ok(self
            .engine
            .all_devices()?
            .iter()
            .map(|d| d.describe())
            .collect())
    }

    pub fn list_audio_devices(&self) -> Result<()> {
        for line in self.device_listing()? {
            println!("{}", line);
        }
        Ok(())
    }
}

pub fn plugin_listing(catalog: &dyn PluginCatalog) -> Vec<String> {
    let plugins = catalog.all();
    let name_width = plugins.iter().map(|p| p.info.name.len()).max().unwrap_or(0);
    let version_width = plugins
        .iter()
        .map(|p| p.info.version.len() + 3)
        .max()
        .unwrap_or(0);
    plugins
        .iter()
        .map(|p| {
            format!(
                "{:name_width$} {:version_width$} - {}",
                p.info.name,
                format!("(v{})", p.info.version),
                p.info.description,
            )
        })
        .collect()
}
