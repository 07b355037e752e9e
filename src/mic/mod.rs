//! Input channels
//!
//! An input channel hears commands and speaks answers. The live channel is
//! wired to audio devices and speech engines; the text and batch channels
//! stand in for it from a terminal or a script.

mod batch;
mod live;
mod text;

pub use batch::{BatchEntry, BatchMic};
pub use live::{CaptureSettings, LiveMic};
pub use text::TextMic;

use crate::Result;
use std::path::PathBuf;

pub trait InputChannel {
    /// Wait for the wake word and capture one command
    ///
    /// `None` means the input is exhausted.
    fn listen(&mut self) -> Result<Option<Vec<String>>>;

    /// Capture a follow-up answer without waiting for the wake word
    fn active_listen(&mut self) -> Result<Vec<String>>;

    fn say(&mut self, text: &str) -> Result<()>;
}

/// How the assistant should take its input, as requested on the command line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MicMode {
    #[default]
    Live,
    Text,
    Batch(PathBuf),
}

/// The input channel a conversation runs on, fixed at composition
pub enum InputChannelMode {
    Live(LiveMic),
    TextSimulated(TextMic),
    BatchReplay(BatchMic),
}

impl InputChannelMode {
    pub fn name(&self) -> &'static str {
        match self {
            InputChannelMode::Live(_) => "live",
            InputChannelMode::TextSimulated(_) => "text",
            InputChannelMode::BatchReplay(_) => "batch",
        }
    }

    fn channel(&mut self) -> &mut dyn InputChannel {
        match self {
            InputChannelMode::Live(mic) => mic,
            InputChannelMode::TextSimulated(mic) => mic,
            InputChannelMode::BatchReplay(mic) => mic,
        }
    }
}

impl InputChannel for InputChannelMode {
    fn listen(&mut self) -> Result<Option<Vec<String>>> {
        self.channel().listen()
    }

    fn active_listen(&mut self) -> Result<Vec<String>> {
        self.channel().active_listen()
    }

    fn say(&mut self, text: &str) -> Result<()> {
        self.channel().say(text)
    }
}

/// Whether any transcription mentions the wake word
pub(crate) fn mentions_keyword(texts: &[String], keyword: &str) -> bool {
    let keyword = keyword.to_uppercase();
    texts.iter().any(|t| t.to_uppercase().contains(&keyword))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_mode_delegates() {
        let mut mode = InputChannelMode::TextSimulated(TextMic::new(
            Box::new(Cursor::new("what time is it\n")),
            Box::new(Vec::new()),
            "NAOMI",
        ));
        assert_eq!(mode.name(), "text");
        assert_eq!(
            mode.listen().unwrap(),
            Some(vec!["what time is it".to_string()])
        );
        assert_eq!(mode.listen().unwrap(), None);
    }

    #[test]
    fn test_mentions_keyword() {
        assert!(mentions_keyword(&["hey naomi".to_string()], "NAOMI"));
        assert!(!mentions_keyword(&["hello".to_string()], "NAOMI"));
        assert!(!mentions_keyword(&[], "NAOMI"));
    }
}
