use super::populate::{write_profile, PopulateAnswers};
use super::Profile;
use crate::Result;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::info;

/// What to do about a missing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryChoice {
    Regenerate,
    Abort,
}

/// Decides how a missing profile gets repaired
pub trait RecoveryPolicy {
    /// Called each time the profile cannot be read
    fn on_missing(&mut self, path: &Path) -> Result<RecoveryChoice>;

    /// Write a fresh profile to `path`, seeded from `existing` when repopulating
    fn regenerate(&mut self, path: &Path, existing: Option<&Profile>) -> Result<()>;
}

/// Terminal questionnaire used by the binary
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print a question and read one answer; `None` on end of input
    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{} ", question)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn ask_with_default(&mut self, question: &str, default: &str) -> Result<String> {
        let answer = self.ask(&format!("{} [{}]", question, default))?;
        Ok(answer
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }
}

impl<R: BufRead, W: Write> RecoveryPolicy for ConsolePrompt<R, W> {
    fn on_missing(&mut self, _path: &Path) -> Result<RecoveryChoice> {
        writeln!(self.output, "Your config file does not exist.")?;
        let answer =
            self.ask("Would you like to answer a few questions to create a new one?")?;
        match answer {
            Some(a) if a.starts_with(['y', 'Y']) => Ok(RecoveryChoice::Regenerate),
            _ => {
                writeln!(self.output, "Cannot continue. Exiting.")?;
                Ok(RecoveryChoice::Abort)
            }
        }
    }

    fn regenerate(&mut self, path: &Path, existing: Option<&Profile>) -> Result<()> {
        let mut answers = existing
            .map(PopulateAnswers::from_profile)
            .unwrap_or_default();

        let first_name = answers.first_name.clone().unwrap_or_default();
        let name = self.ask_with_default("What is your first name?", &first_name)?;
        answers.first_name = Some(name).filter(|n| !n.is_empty());
        answers.keyword = self.ask_with_default("Which wake word should I listen for?", &answers.keyword)?;
        answers.language = self.ask_with_default("Which language do you speak?", &answers.language)?;

        write_profile(path, &answers, existing)?;
        info!("Wrote new profile to {}", path.display());
        writeln!(self.output, "Profile written to {}", path.display())?;
        Ok(())
    }
}
