/// Plugin registry and dispatch
///
/// Fans one hook out to every plugin that declared it, in registration
/// order, applying the hook's failure policy.
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use super::handler::{Key, Plugin};
use super::hooks::{Hook, HookPolicy, HookSet};
use crate::context::SessionContext;
use crate::error::PluginError;

struct Registered {
    plugin: Box<dyn Plugin>,
    name: String,
    hooks: HookSet,
}

/// Outcome of one dispatch round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub hook: Hook,
    /// Plugins whose hook ran
    pub invoked: usize,
    /// Invocations that failed and were isolated
    pub failed: usize,
}

impl DispatchReport {
    fn new(hook: Hook) -> Self {
        Self {
            hook,
            invoked: 0,
            failed: 0,
        }
    }
}

pub struct PluginRegistry {
    plugins: Vec<Registered>,
    policy: HookPolicy,
}

impl PluginRegistry {
    pub fn new(policy: HookPolicy) -> Self {
        Self {
            plugins: Vec::new(),
            policy,
        }
    }

    /// Append a plugin; its hook set is read once, here
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> &mut Self {
        let name = plugin.name().to_string();
        let hooks = plugin.hooks();
        tracing::info!("Registered plugin {} (hooks: {:?})", name, hooks);
        self.plugins.push(Registered {
            plugin,
            name,
            hooks,
        });
        self
    }

    pub fn with(mut self, plugin: Box<dyn Plugin>) -> Self {
        self.register(plugin);
        self
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name.as_str()).collect()
    }

    /// Number of plugins that declared `hook`
    pub fn implementing(&self, hook: Hook) -> usize {
        self.plugins.iter().filter(|p| p.hooks.has(hook)).count()
    }

    pub fn policy(&self) -> &HookPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: HookPolicy) {
        self.policy = policy;
    }

    /// Dispatch a hook that returns nothing
    ///
    /// `OnFrameNext` keys are discarded and `OnKeyPress` receives no key;
    /// use the dedicated methods for those.
    pub fn dispatch(
        &mut self,
        hook: Hook,
        ctx: &SessionContext,
    ) -> Result<DispatchReport, PluginError> {
        self.fan_out(hook, |plugin| call_hook(plugin, hook, ctx, None))
            .map(|(report, _)| report)
    }

    /// Dispatch `OnFrameNext`; the first key returned wins
    pub fn dispatch_frame_next(
        &mut self,
        ctx: &SessionContext,
    ) -> Result<(Option<Key>, DispatchReport), PluginError> {
        self.fan_out(Hook::OnFrameNext, |plugin| plugin.on_frame_next(ctx))
            .map(|(report, key)| (key, report))
    }

    pub fn dispatch_key_press(
        &mut self,
        ctx: &SessionContext,
        key: Option<Key>,
    ) -> Result<DispatchReport, PluginError> {
        self.fan_out(Hook::OnKeyPress, |plugin| {
            plugin.on_key_press(ctx, key).map(|_| None)
        })
        .map(|(report, _)| report)
    }

    fn fan_out<F>(
        &mut self,
        hook: Hook,
        mut call: F,
    ) -> Result<(DispatchReport, Option<Key>), PluginError>
    where
        F: FnMut(&mut dyn Plugin) -> Result<Option<Key>, PluginError>,
    {
        let isolate = self.policy.isolates(hook);
        let mut report = DispatchReport::new(hook);
        let mut first_key = None;

        for entry in self.plugins.iter_mut().filter(|p| p.hooks.has(hook)) {
            report.invoked += 1;

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| call(entry.plugin.as_mut())))
                .unwrap_or_else(|payload| {
                    Err(PluginError::Panicked {
                        plugin: entry.name.clone(),
                        hook,
                        message: panic_message(payload.as_ref()),
                    })
                });

            match outcome {
                Ok(key) => {
                    if first_key.is_none() {
                        first_key = key;
                    }
                }
                Err(e) if isolate => {
                    report.failed += 1;
                    tracing::warn!("Plugin {} failed in {}: {}", entry.name, hook, e);
                }
                Err(e) => {
                    tracing::error!(
                        "Plugin {} failed in {} (not isolated): {}",
                        entry.name,
                        hook,
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok((report, first_key))
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new(HookPolicy::default())
    }
}

fn call_hook(
    plugin: &mut dyn Plugin,
    hook: Hook,
    ctx: &SessionContext,
    key: Option<Key>,
) -> Result<Option<Key>, PluginError> {
    match hook {
        Hook::OnFrameRead => plugin.on_frame_read(ctx)?,
        Hook::OnGameStart => plugin.on_game_start(ctx)?,
        Hook::OnGameIndividualResultAnalyze => plugin.on_game_individual_result_analyze(ctx)?,
        Hook::OnGameIndividualResult => plugin.on_game_individual_result(ctx)?,
        Hook::OnGameReset => plugin.on_game_reset(ctx)?,
        Hook::OnFrameNext => {
            plugin.on_frame_next(ctx)?;
        }
        Hook::OnKeyPress => plugin.on_key_press(ctx, key)?,
    }
    Ok(None)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Probe {
        name: &'static str,
        hooks: HookSet,
        log: Log,
        fail: bool,
        panic: bool,
        key: Option<Key>,
    }

    impl Probe {
        fn new(name: &'static str, hooks: HookSet, log: &Log) -> Self {
            Self {
                name,
                hooks,
                log: Arc::clone(log),
                fail: false,
                panic: false,
                key: None,
            }
        }

        fn record(&self, hook: Hook) -> Result<(), PluginError> {
            if self.panic {
                panic!("{} exploded", self.name);
            }
            self.log.lock().push(format!("{}:{}", self.name, hook));
            if self.fail {
                return Err(PluginError::hook(self.name, hook, "scripted failure"));
            }
            Ok(())
        }
    }

    impl Plugin for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn hooks(&self) -> HookSet {
            self.hooks
        }

        fn on_game_start(&mut self, _ctx: &SessionContext) -> Result<(), PluginError> {
            self.record(Hook::OnGameStart)
        }

        fn on_game_reset(&mut self, _ctx: &SessionContext) -> Result<(), PluginError> {
            self.record(Hook::OnGameReset)
        }

        fn on_frame_next(&mut self, _ctx: &SessionContext) -> Result<Option<Key>, PluginError> {
            self.record(Hook::OnFrameNext)?;
            Ok(self.key)
        }

        fn on_key_press(
            &mut self,
            _ctx: &SessionContext,
            key: Option<Key>,
        ) -> Result<(), PluginError> {
            self.log
                .lock()
                .push(format!("{}:key={:?}", self.name, key.and_then(|k| k.as_char())));
            Ok(())
        }
    }

    fn new_log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn test_only_declared_hooks_run() {
        let log = new_log();
        let mut registry = PluginRegistry::default();
        registry.register(Box::new(Probe::new("a", HookSet::GAME_RESET, &log)));
        registry.register(Box::new(Probe::new("b", HookSet::GAME_START, &log)));

        let ctx = SessionContext::new();
        let report = registry.dispatch(Hook::OnGameReset, &ctx).unwrap();

        assert_eq!(report.invoked, 1);
        assert_eq!(*log.lock(), vec!["a:onGameReset".to_string()]);
        assert_eq!(registry.implementing(Hook::OnGameStart), 1);
        assert_eq!(registry.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_isolated_failure_does_not_stop_others() {
        let log = new_log();
        let mut failing = Probe::new("a", HookSet::GAME_RESET, &log);
        failing.fail = true;

        let mut registry = PluginRegistry::default()
            .with(Box::new(failing))
            .with(Box::new(Probe::new("b", HookSet::GAME_RESET, &log)))
            .with(Box::new(Probe::new("c", HookSet::GAME_RESET, &log)));

        let report = registry
            .dispatch(Hook::OnGameReset, &SessionContext::new())
            .unwrap();

        assert_eq!(report.invoked, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(
            *log.lock(),
            vec!["a:onGameReset", "b:onGameReset", "c:onGameReset"]
        );
    }

    #[test]
    fn test_panic_is_isolated() {
        let log = new_log();
        let mut exploding = Probe::new("a", HookSet::GAME_RESET, &log);
        exploding.panic = true;

        let mut registry = PluginRegistry::default()
            .with(Box::new(exploding))
            .with(Box::new(Probe::new("b", HookSet::GAME_RESET, &log)));

        let report = registry
            .dispatch(Hook::OnGameReset, &SessionContext::new())
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(*log.lock(), vec!["b:onGameReset"]);
    }

    #[test]
    fn test_game_start_failure_propagates_by_default() {
        let log = new_log();
        let mut failing = Probe::new("a", HookSet::GAME_START, &log);
        failing.fail = true;

        let mut registry = PluginRegistry::default()
            .with(Box::new(failing))
            .with(Box::new(Probe::new("b", HookSet::GAME_START, &log)));

        let err = registry
            .dispatch(Hook::OnGameStart, &SessionContext::new())
            .unwrap_err();

        assert!(matches!(err, PluginError::HookFailed { hook: Hook::OnGameStart, .. }));
        // Dispatch stopped at the failing plugin
        assert_eq!(*log.lock(), vec!["a:onGameStart"]);
    }

    #[test]
    fn test_game_start_failure_isolated_when_configured() {
        let log = new_log();
        let mut failing = Probe::new("a", HookSet::GAME_START, &log);
        failing.fail = true;

        let mut registry = PluginRegistry::new(HookPolicy::all_isolated())
            .with(Box::new(failing))
            .with(Box::new(Probe::new("b", HookSet::GAME_START, &log)));

        let report = registry
            .dispatch(Hook::OnGameStart, &SessionContext::new())
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(*log.lock(), vec!["a:onGameStart", "b:onGameStart"]);
    }

    #[test]
    fn test_first_key_wins_and_reaches_key_press() {
        let log = new_log();
        let hooks = HookSet::FRAME_NEXT | HookSet::KEY_PRESS;

        let silent = Probe::new("a", hooks, &log);
        let mut first = Probe::new("b", hooks, &log);
        first.key = Some(Key::from_char('p'));
        let mut second = Probe::new("c", hooks, &log);
        second.key = Some(Key::from_char('q'));

        let mut registry = PluginRegistry::default()
            .with(Box::new(silent))
            .with(Box::new(first))
            .with(Box::new(second));

        let ctx = SessionContext::new();
        let (key, report) = registry.dispatch_frame_next(&ctx).unwrap();
        assert_eq!(key, Some(Key::from_char('p')));
        assert_eq!(report.invoked, 3);

        registry.dispatch_key_press(&ctx, key).unwrap();
        let log = log.lock();
        assert!(log.contains(&"a:key=Some('p')".to_string()));
        assert!(log.contains(&"c:key=Some('p')".to_string()));
    }

    #[test]
    fn test_empty_registry() {
        let mut registry = PluginRegistry::default();
        assert!(registry.is_empty());
        let report = registry
            .dispatch(Hook::OnFrameRead, &SessionContext::new())
            .unwrap();
        assert_eq!(report.invoked, 0);
    }
}
