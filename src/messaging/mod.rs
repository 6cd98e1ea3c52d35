/// Messaging module
///
/// Broadcasts engine events to consumers outside the engine thread.
///
/// ## Architecture
///
/// ```text
/// ┌─────────────┐  &SessionContext  ┌────────────────┐  EngineEvent  ┌───────────┐
/// │ FrameEngine │ ────────────────> │ EventBusPlugin │ ────────────> │ Event Bus │
/// └─────────────┘                   └────────────────┘  (snapshots)  └───────────┘
///                                                                          │
///                                                                          │ Publishes
///                                                                          ▼
///                                                                   ┌─────────────┐
///                                                                   │ Subscribers │
///                                                                   │ (any thread)│
///                                                                   └─────────────┘
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let bus = EventBus::new();
/// let (rx, _id) = bus.subscribe();
///
/// registry.register(Box::new(EventBusPlugin::new(bus.clone())));
///
/// std::thread::spawn(move || {
///     while let Ok(event) = rx.recv() {
///         if let EngineEvent::ResultReady(snapshot) = event {
///             println!("{:?}", snapshot.game.won);
///         }
///     }
/// });
/// ```

pub mod bus;
pub mod events;

// Re-export commonly used types
pub use bus::{EventBus, SubscriberId};
pub use events::EngineEvent;
