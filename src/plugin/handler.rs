/// Plugin trait
///
/// Every hook has a no-op default, so a plugin only writes the methods it
/// needs and lists them in `hooks()`. Hooks that are not listed are never
/// invoked, even if implemented.
use crate::context::SessionContext;
use crate::error::PluginError;

use super::hooks::HookSet;

/// Synthetic key input a plugin can inject through `on_frame_next`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(pub u32);

impl Key {
    pub fn from_char(c: char) -> Self {
        Key(c as u32)
    }

    pub fn as_char(&self) -> Option<char> {
        char::from_u32(self.0)
    }
}

pub trait Plugin: Send {
    /// Plugin name (for logging)
    fn name(&self) -> &str;

    /// Hooks this plugin wants to receive
    fn hooks(&self) -> HookSet;

    fn on_frame_read(&mut self, _ctx: &SessionContext) -> Result<(), PluginError> {
        Ok(())
    }

    fn on_game_start(&mut self, _ctx: &SessionContext) -> Result<(), PluginError> {
        Ok(())
    }

    fn on_game_individual_result_analyze(
        &mut self,
        _ctx: &SessionContext,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    fn on_game_individual_result(&mut self, _ctx: &SessionContext) -> Result<(), PluginError> {
        Ok(())
    }

    fn on_game_reset(&mut self, _ctx: &SessionContext) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called at the end of each iteration; may return a key to inject
    fn on_frame_next(&mut self, _ctx: &SessionContext) -> Result<Option<Key>, PluginError> {
        Ok(None)
    }

    fn on_key_press(
        &mut self,
        _ctx: &SessionContext,
        _key: Option<Key>,
    ) -> Result<(), PluginError> {
        Ok(())
    }
}
