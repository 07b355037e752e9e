use super::{mentions_keyword, InputChannel};
use crate::audio::{read_wav_mono, resample_audio};
use crate::speech::SpeechToText;
use crate::{ParleyError, Result};
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One line of a batch file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEntry {
    /// A recording to run through both recognizers
    Audio(PathBuf),
    /// A command taken as already transcribed
    Text(String),
}

/// Parse batch file contents
///
/// Everything after `#` is dropped. A line naming an existing `.wav` file,
/// relative to `base_dir`, becomes an audio entry.
pub fn parse_batch(contents: &str, base_dir: &Path) -> Vec<BatchEntry> {
    contents
        .lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                return None;
            }
            let candidate = base_dir.join(line);
            let is_wav = candidate
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
            if is_wav && candidate.is_file() {
                Some(BatchEntry::Audio(candidate))
            } else {
                Some(BatchEntry::Text(line.to_string()))
            }
        })
        .collect()
}

/// Replays commands from a file
pub struct BatchMic {
    entries: VecDeque<BatchEntry>,
    passive: Box<dyn SpeechToText>,
    active: Box<dyn SpeechToText>,
    keyword: String,
    output: Box<dyn Write>,
}

impl BatchMic {
    pub fn open(
        path: &Path,
        passive: Box<dyn SpeechToText>,
        active: Box<dyn SpeechToText>,
        keyword: &str,
        output: Box<dyn Write>,
    ) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ParleyError::Io(format!("Cannot read batch file {}: {}", path.display(), e))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let entries = parse_batch(&contents, base_dir);
        info!("Loaded {} batch commands from {}", entries.len(), path.display());
        Ok(Self::new(entries, passive, active, keyword, output))
    }

    pub fn new(
        entries: Vec<BatchEntry>,
        passive: Box<dyn SpeechToText>,
        active: Box<dyn SpeechToText>,
        keyword: &str,
        output: Box<dyn Write>,
    ) -> Self {
        Self {
            entries: entries.into(),
            passive,
            active,
            keyword: keyword.to_uppercase(),
            output,
        }
    }

    pub fn remaining(&self) -> usize {
        self.entries.len()
    }

    fn transcribe_file(&mut self, path: &Path) -> Result<Vec<String>> {
        let (samples, rate) = read_wav_mono(path)?;
        debug!("Replaying {} ({} samples at {} Hz)", path.display(), samples.len(), rate);

        let passive_audio = resample_audio(&samples, rate, self.passive.sample_rate())?;
        let heard = self.passive.transcribe(&passive_audio)?;
        if !mentions_keyword(&heard, &self.keyword) {
            warn!(
                "Keyword '{}' not detected in {} (heard {:?})",
                self.keyword,
                path.display(),
                heard
            );
        }

        let active_audio = resample_audio(&samples, rate, self.active.sample_rate())?;
        self.active.transcribe(&active_audio)
    }

    fn next_command(&mut self) -> Result<Option<Vec<String>>> {
        let Some(entry) = self.entries.pop_front() else {
            return Ok(None);
        };
        let texts = match entry {
            BatchEntry::Text(text) => vec![text],
            BatchEntry::Audio(path) => self.transcribe_file(&path)?,
        };
        writeln!(self.output, "YOU: {}", texts.join(" | "))?;
        Ok(Some(texts))
    }
}

impl InputChannel for BatchMic {
    fn listen(&mut self) -> Result<Option<Vec<String>>> {
        self.next_command()
    }

    fn active_listen(&mut self) -> Result<Vec<String>> {
        Ok(self.next_command()?.unwrap_or_default())
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}: {}", self.keyword, text)?;
        Ok(())
    }
}
