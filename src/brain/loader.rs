use super::Dispatcher;
use crate::plugins::{PluginCatalog, PluginCategory};
use crate::profile::Profile;
use crate::{ParleyError, Result};
use tracing::{debug, info, warn};

/// Instantiate every speech handler in the catalog into `dispatcher`
///
/// A handler that fails to construct is skipped; the command surface is only
/// checked once every handler has been tried.
pub fn load_speech_handlers(
    catalog: &dyn PluginCatalog,
    profile: &Profile,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    for descriptor in catalog.list(PluginCategory::SpeechHandler) {
        match descriptor.create_handler(profile) {
            Ok(handler) => {
                debug!(
                    "Loaded speech handler '{}' with {} phrases",
                    descriptor.slug(),
                    handler.phrases().len()
                );
                dispatcher.add_handler(handler);
            }
            Err(e) => {
                let skipped = ParleyError::HandlerInstantiation {
                    name: descriptor.name().to_string(),
                    reason: e.to_string(),
                };
                warn!("{}, skipping", skipped);
                debug!("Handler '{}' failed: {:?}", descriptor.slug(), e);
            }
        }
    }

    validate_command_surface(dispatcher)?;
    info!(
        "Loaded {} speech handlers ({} phrases)",
        dispatcher.len(),
        dispatcher.plugin_phrases().len()
    );
    Ok(())
}

/// Fail when nothing could answer a command
pub fn validate_command_surface(dispatcher: &Dispatcher) -> Result<()> {
    if dispatcher.is_empty() {
        return Err(ParleyError::NoHandlers);
    }
    if dispatcher.plugin_phrases().is_empty() {
        return Err(ParleyError::NoPhrases);
    }
    Ok(())
}
