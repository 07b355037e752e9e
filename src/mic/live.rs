use super::{mentions_keyword, InputChannel};
use crate::audio::vad::VoiceActivityDetector;
use crate::audio::{resample_audio, AudioEngine, AudioSource, InputDevice, OutputDevice};
use crate::speech::{SpeechToText, TextToSpeech};
use crate::{ParleyError, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Utterance segmentation limits, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureSettings {
    /// Trailing silence that ends an utterance
    pub silence_timeout: f32,
    /// Longest utterance kept
    pub max_utterance: f32,
    /// How long a follow-up answer may take to start
    pub answer_timeout: f32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            silence_timeout: 0.8,
            max_utterance: 10.0,
            answer_timeout: 5.0,
        }
    }
}

/// Everything the live channel drives
pub struct LiveMic {
    engine: Arc<dyn AudioEngine>,
    input: InputDevice,
    output: OutputDevice,
    vad: Box<dyn VoiceActivityDetector>,
    passive: Box<dyn SpeechToText>,
    active: Box<dyn SpeechToText>,
    tts: Box<dyn TextToSpeech>,
    keyword: String,
    reply: Option<String>,
    response: Option<String>,
    print_transcript: bool,
    settings: CaptureSettings,
    source: Option<Box<dyn AudioSource>>,
}

impl LiveMic {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: Arc<dyn AudioEngine>,
        input: InputDevice,
        output: OutputDevice,
        vad: Box<dyn VoiceActivityDetector>,
        passive: Box<dyn SpeechToText>,
        active: Box<dyn SpeechToText>,
        tts: Box<dyn TextToSpeech>,
        keyword: &str,
    ) -> Self {
        Self {
            engine,
            input,
            output,
            vad,
            passive,
            active,
            tts,
            keyword: keyword.to_uppercase(),
            reply: None,
            response: None,
            print_transcript: false,
            settings: CaptureSettings::default(),
            source: None,
        }
    }

    pub fn with_phrases(mut self, reply: Option<String>, response: Option<String>) -> Self {
        self.reply = reply;
        self.response = response;
        self
    }

    pub fn with_print_transcript(mut self, enabled: bool) -> Self {
        self.print_transcript = enabled;
        self
    }

    pub fn with_settings(mut self, settings: CaptureSettings) -> Self {
        self.settings = settings;
        self
    }

    fn chunks_for(&self, seconds: f32) -> usize {
        let params = self.input.params;
        let per_second = params.sample_rate as f32 / params.chunk_size.max(1) as f32;
        ((seconds * per_second).ceil() as usize).max(1)
    }

    fn next_chunk(&mut self) -> Result<Vec<f32>> {
        if self.source.is_none() {
            self.source = Some(self.engine.open_input(&self.input)?);
        }
        match self.source.as_mut() {
            Some(source) => source.next_chunk(),
            None => Err(ParleyError::AudioDevice("Capture not open".into())),
        }
    }

    /// Record one VAD-delimited utterance
    ///
    /// With a start limit, gives up and returns nothing if no speech begins
    /// within that many seconds.
    fn capture_utterance(&mut self, start_limit: Option<f32>) -> Result<Vec<f32>> {
        let wait_chunks = start_limit.map(|s| self.chunks_for(s));
        let silence_chunks = self.chunks_for(self.settings.silence_timeout);
        let max_chunks = self.chunks_for(self.settings.max_utterance);

        self.vad.reset();
        let mut waited = 0;
        let mut recorded = Vec::new();
        let mut speech_chunks = 0;
        let mut silent_run = 0;

        loop {
            let chunk = self.next_chunk()?;
            let speech = self.vad.is_speech(&chunk)?;

            if speech_chunks == 0 {
                if !speech {
                    waited += 1;
                    if wait_chunks.is_some_and(|limit| waited >= limit) {
                        return Ok(Vec::new());
                    }
                    continue;
                }
                debug!("Speech started");
            }

            recorded.extend_from_slice(&chunk);
            speech_chunks += 1;
            silent_run = if speech { 0 } else { silent_run + 1 };

            if silent_run >= silence_chunks || speech_chunks >= max_chunks {
                debug!("Captured {} chunks", speech_chunks);
                return Ok(recorded);
            }
        }
    }

    fn transcribe(stt: &mut dyn SpeechToText, audio: &[f32], rate: u32) -> Result<Vec<String>> {
        if audio.is_empty() {
            return Ok(Vec::new());
        }
        let audio = resample_audio(audio, rate, stt.sample_rate())?;
        stt.transcribe(&audio)
    }

    fn print(&self, label: &str, texts: &[String]) {
        if self.print_transcript {
            println!("{}: {}", label, texts.join(" | "));
        }
    }

    fn wait_for_keyword(&mut self) -> Result<()> {
        let rate = self.input.params.sample_rate;
        loop {
            let audio = self.capture_utterance(None)?;
            let heard = Self::transcribe(self.passive.as_mut(), &audio, rate)?;
            debug!("Passive transcription: {:?}", heard);
            if mentions_keyword(&heard, &self.keyword) {
                self.print("KEYWORD", &heard);
                return Ok(());
            }
        }
    }
}

impl InputChannel for LiveMic {
    fn listen(&mut self) -> Result<Option<Vec<String>>> {
        match self.wait_for_keyword() {
            Ok(()) => {}
            Err(ParleyError::Channel(reason)) => {
                info!("Capture ended: {}", reason);
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
        if let Some(reply) = self.reply.clone() {
            self.say(&reply)?;
        }
        let command = self.active_listen()?;
        if let Some(response) = self.response.clone() {
            self.say(&response)?;
        }
        Ok(Some(command))
    }

    fn active_listen(&mut self) -> Result<Vec<String>> {
        let rate = self.input.params.sample_rate;
        let audio = match self.capture_utterance(Some(self.settings.answer_timeout)) {
            Ok(audio) => audio,
            Err(ParleyError::Channel(reason)) => {
                info!("Capture ended: {}", reason);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        let texts = Self::transcribe(self.active.as_mut(), &audio, rate)?;
        self.print("YOU", &texts);
        Ok(texts)
    }

    fn say(&mut self, text: &str) -> Result<()> {
        self.print(&self.keyword, &[text.to_string()]);
        let audio = self.tts.synthesize(text)?;
        self.engine.play(&self.output, &audio.samples, audio.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{
        Device, DeviceCapability, InputParams, NegotiatedDevice, OutputParams, SnrVad,
        StaticAudioEngine,
    };
    use crate::speech::SynthesizedAudio;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<Vec<String>>);

    impl SpeechToText for Scripted {
        fn transcribe(&mut self, _samples: &[f32]) -> Result<Vec<String>> {
            Ok(self.0.pop_front().unwrap_or_default())
        }

        fn sample_rate(&self) -> u32 {
            16000
        }

        fn set_sample_rate(&mut self, _rate: u32) {}

        fn set_volume_normalization(&mut self, _level: f32) {}
    }

    struct Beep;

    impl TextToSpeech for Beep {
        fn synthesize(&mut self, _text: &str) -> Result<SynthesizedAudio> {
            Ok(SynthesizedAudio {
                samples: vec![0.25; 8],
                sample_rate: 16000,
            })
        }
    }

    fn scripted(results: &[&str]) -> Box<dyn SpeechToText> {
        Box::new(Scripted(
            results.iter().map(|r| vec![r.to_string()]).collect(),
        ))
    }

    fn utterance() -> Vec<Vec<f32>> {
        let loud: Vec<f32> = (0..1024).map(|i| (i as f32 * 0.3).sin() * 0.5).collect();
        let mut chunks = vec![vec![0.0; 1024]; 2];
        chunks.extend(std::iter::repeat(loud).take(3));
        chunks.extend(std::iter::repeat(vec![0.0; 1024]).take(2));
        chunks
    }

    fn mic(engine: StaticAudioEngine) -> LiveMic {
        let device = Device::new(
            "null",
            "Null",
            &[DeviceCapability::Input, DeviceCapability::Output],
        );
        LiveMic::new(
            Arc::new(engine),
            NegotiatedDevice {
                base: device.clone(),
                params: InputParams::default(),
            },
            NegotiatedDevice {
                base: device,
                params: OutputParams::default(),
            },
            Box::new(SnrVad::new(15.0, 0.01)),
            scripted(&["hey naomi"]),
            scripted(&["what time is it"]),
            Box::new(Beep),
            "naomi",
        )
        .with_settings(CaptureSettings {
            silence_timeout: 0.1,
            max_utterance: 2.0,
            answer_timeout: 1.0,
        })
    }

    #[test]
    fn test_keyword_then_command() {
        let mut capture = utterance();
        capture.extend(utterance());
        let engine = StaticAudioEngine::null().with_capture(capture);
        let played = engine.played();

        let mut mic = mic(engine).with_phrases(Some("Yes?".into()), None);
        assert_eq!(
            mic.listen().unwrap(),
            Some(vec!["what time is it".to_string()])
        );
        // The reply was spoken
        assert_eq!(played.lock().len(), 8);
    }

    #[test]
    fn test_capture_end_finishes_session() {
        let engine = StaticAudioEngine::null().with_capture(Vec::new());
        let mut mic = mic(engine);
        assert_eq!(mic.listen().unwrap(), None);
    }
}
