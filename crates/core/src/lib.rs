pub mod content;
pub mod event;
pub mod policy;
pub mod record;
pub mod types;

pub use content::{Component, ContentKind};
pub use event::{InboundMessage, Origin, PlatformEvent, RecallNotice, RecallScope};
pub use policy::{KindToggles, MonitorPolicy, RecallActorPolicy};
pub use record::{ShadowPayload, ShadowRecord};
pub use types::{MessageId, OriginId, UserId};
