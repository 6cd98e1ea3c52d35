/// Bridges plugin hooks onto the event bus
///
/// Each lifecycle hook publishes an owned snapshot; subscribers never see
/// the live context or the frame buffer.
use std::sync::Arc;

use crate::context::{ContextSnapshot, SessionContext};
use crate::error::PluginError;
use crate::messaging::{EngineEvent, EventBus};
use crate::plugin::{Hook, HookSet, Key, Plugin};

pub struct EventBusPlugin {
    bus: EventBus,
}

impl EventBusPlugin {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    fn publish_snapshot(&self, ctx: &SessionContext, wrap: fn(Arc<ContextSnapshot>) -> EngineEvent) {
        let delivered = self.bus.publish(wrap(Arc::new(ContextSnapshot::capture(ctx))));
        tracing::trace!("Snapshot delivered to {} subscriber(s)", delivered);
    }
}

impl Plugin for EventBusPlugin {
    fn name(&self) -> &str {
        "event-bus"
    }

    fn hooks(&self) -> HookSet {
        [
            Hook::OnGameStart,
            Hook::OnGameIndividualResultAnalyze,
            Hook::OnGameIndividualResult,
            Hook::OnGameReset,
            Hook::OnKeyPress,
        ]
        .into_iter()
        .collect()
    }

    fn on_game_start(&mut self, ctx: &SessionContext) -> Result<(), PluginError> {
        self.publish_snapshot(ctx, EngineEvent::GameStarted);
        Ok(())
    }

    fn on_game_individual_result_analyze(&mut self, ctx: &SessionContext) -> Result<(), PluginError> {
        self.publish_snapshot(ctx, EngineEvent::ResultAnalyzed);
        Ok(())
    }

    fn on_game_individual_result(&mut self, ctx: &SessionContext) -> Result<(), PluginError> {
        self.publish_snapshot(ctx, EngineEvent::ResultReady);
        Ok(())
    }

    fn on_game_reset(&mut self, ctx: &SessionContext) -> Result<(), PluginError> {
        self.publish_snapshot(ctx, EngineEvent::GameReset);
        Ok(())
    }

    fn on_key_press(&mut self, ctx: &SessionContext, key: Option<Key>) -> Result<(), PluginError> {
        if let Some(key) = key {
            self.bus.publish(EngineEvent::KeyPressed {
                key,
                frame_sequence: ctx.engine.frame().map(|f| f.sequence),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MapId;

    #[test]
    fn test_snapshot_is_published_and_detached() {
        let bus = EventBus::new();
        let (rx, _) = bus.subscribe();
        let mut plugin = EventBusPlugin::new(bus);

        let mut ctx = SessionContext::new();
        ctx.game.map = Some(MapId::new("arowana"));
        plugin.on_game_start(&ctx).unwrap();
        ctx.game.map = None;

        let event = rx.try_recv().unwrap();
        assert_eq!(event.hook(), Some(Hook::OnGameStart));
        let snapshot = event.snapshot().unwrap();
        assert_eq!(snapshot.game.map, Some(MapId::new("arowana")));
    }

    #[test]
    fn test_key_press_without_key_is_silent() {
        let bus = EventBus::new();
        let (rx, _) = bus.subscribe();
        let mut plugin = EventBusPlugin::new(bus);
        let ctx = SessionContext::new();

        plugin.on_key_press(&ctx, None).unwrap();
        assert!(rx.try_recv().is_err());

        plugin.on_key_press(&ctx, Some(Key::from_char('s'))).unwrap();
        assert!(matches!(
            rx.try_recv(),
            Ok(EngineEvent::KeyPressed { key, frame_sequence: None }) if key == Key::from_char('s')
        ));
    }
}
