/// Plugin module
///
/// Output handlers observe the engine through named lifecycle hooks.
///
/// ## Dispatch
///
/// ```text
/// FrameEngine
///   └── PluginRegistry::dispatch(hook, &ctx)
///         ├── plugin 1  (skipped unless hook declared)
///         ├── plugin 2  (failure: isolated per HookPolicy)
///         └── plugin N
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// use inklog::plugin::{Hook, HookSet, Plugin, PluginRegistry};
///
/// struct Announcer;
///
/// impl Plugin for Announcer {
///     fn name(&self) -> &str { "announcer" }
///     fn hooks(&self) -> HookSet { HookSet::GAME_START }
///     fn on_game_start(&mut self, ctx: &SessionContext) -> Result<(), PluginError> {
///         println!("Match on {:?}", ctx.game.map);
///         Ok(())
///     }
/// }
///
/// let mut registry = PluginRegistry::default();
/// registry.register(Box::new(Announcer));
/// ```

pub mod handler;
pub mod hooks;
pub mod registry;

// Re-export commonly used types
pub use handler::{Key, Plugin};
pub use hooks::{Hook, HookPolicy, HookSet};
pub use registry::{DispatchReport, PluginRegistry};
