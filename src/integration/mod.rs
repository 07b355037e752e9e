//! Startup: from support directory to a running assistant
//!
//! [`bootstrap`] runs the whole sequence: support directories, profile with
//! recovery, engine selection, plugin binding, device negotiation, handler
//! loading and finally composition of the input channel and conversation.

pub mod binder;
pub mod composer;
pub mod config;

pub use binder::{EngineBinding, EngineRole, SttOverrides};
pub use composer::{plugin_listing, Assistant, ResolvedRuntime, RuntimeComposer};
pub use config::EngineSelection;

use crate::mic::MicMode;
use crate::paths::SupportDirs;
use crate::plugins::PluginCatalog;
use crate::profile::{Profile, ProfileLoader, RecoveryPolicy};
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Command line choices that shape startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapOptions {
    /// Support directory; `$PARLEY_HOME` or the platform config dir when unset
    pub config_dir: Option<PathBuf>,
    pub mic_mode: MicMode,
    /// Rerun the questionnaire even when a profile exists
    pub repopulate: bool,
    pub print_transcript: bool,
}

/// Prepare the support directory and load the profile
pub fn load_profile(
    options: &BootstrapOptions,
    policy: &mut dyn RecoveryPolicy,
) -> Result<Profile> {
    let dirs = SupportDirs::resolve(options.config_dir.clone())?;
    debug!("Support directory: {}", dirs.root().display());
    dirs.ensure()?;
    ProfileLoader::new(dirs.profile_path()).load_with_repopulate(policy, options.repopulate)
}

/// Build a ready-to-run assistant
pub fn bootstrap(
    options: &BootstrapOptions,
    catalog: Arc<dyn PluginCatalog>,
    policy: &mut dyn RecoveryPolicy,
) -> Result<Assistant> {
    let profile = load_profile(options, policy)?;
    let composer = RuntimeComposer::new(catalog);
    let runtime = composer.resolve(profile, options.print_transcript)?;
    composer.compose(runtime, &options.mic_mode)
}
