//! Profile loading with interactive recovery
//!
//! Loading runs as a small state machine so a missing profile can be
//! regenerated by a [`RecoveryPolicy`] without looping on real console I/O:
//!
//! ```text
//! Loading ─┬─> Loaded
//!          └─> MissingConfig ─> AwaitingUserChoice ─┬─> Regenerate ─> Loading
//!                                                   └─> Abort
//! ```

use super::recovery::{RecoveryChoice, RecoveryPolicy};
use super::Profile;
use crate::{ParleyError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// States of the profile loading loop
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    MissingConfig,
    AwaitingUserChoice,
    Regenerate,
    Abort,
    Loaded(Profile),
}

pub struct ProfileLoader {
    path: PathBuf,
}

impl ProfileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the profile once, without recovery
    pub fn read(&self) -> Result<Profile> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| ParleyError::ConfigUnreadable {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        Profile::from_toml_str(&content).map_err(|e| {
            let (line, column) = e
                .span()
                .map(|span| line_column(&content, span.start))
                .unwrap_or((0, 0));
            ParleyError::ConfigMalformed {
                path: self.path.clone(),
                line,
                column,
                message: e.message().trim().to_string(),
            }
        })
    }

    /// Load the profile, asking the policy for help while it is missing
    pub fn load(&self, policy: &mut dyn RecoveryPolicy) -> Result<Profile> {
        let mut state = LoadState::Loading;
        loop {
            state = match state {
                LoadState::Loading => match self.read() {
                    Ok(profile) => LoadState::Loaded(profile),
                    Err(ParleyError::ConfigUnreadable { path, reason }) => {
                        debug!("Can't open config file '{}': {}", path.display(), reason);
                        LoadState::MissingConfig
                    }
                    Err(e) => {
                        error!("Unable to parse config file: {}", e);
                        return Err(e);
                    }
                },
                LoadState::MissingConfig => LoadState::AwaitingUserChoice,
                LoadState::AwaitingUserChoice => match policy.on_missing(&self.path)? {
                    RecoveryChoice::Regenerate => LoadState::Regenerate,
                    RecoveryChoice::Abort => LoadState::Abort,
                },
                LoadState::Regenerate => {
                    policy.regenerate(&self.path, None)?;
                    LoadState::Loading
                }
                LoadState::Abort => return Err(ParleyError::Aborted),
                LoadState::Loaded(profile) => {
                    info!("Loaded profile from {}", self.path.display());
                    return Ok(profile);
                }
            };
        }
    }

    /// Load, then optionally rerun the questionnaire over the loaded values
    pub fn load_with_repopulate(
        &self,
        policy: &mut dyn RecoveryPolicy,
        repopulate: bool,
    ) -> Result<Profile> {
        let profile = self.load(policy)?;
        if !repopulate {
            return Ok(profile);
        }
        policy.regenerate(&self.path, Some(&profile))?;
        self.read()
    }
}

fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset.min(content.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|nl| before.len() - nl)
        .unwrap_or(before.len() + 1);
    (line, column)
}
