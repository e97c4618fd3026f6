//! Sprite collection, composition and injection.

mod compose;
mod coordinator;
mod inject;
mod registry;
mod symbol_id;

pub use compose::{ComposeError, SpriteComposer, SymbolSpriteComposer};
pub use coordinator::{EmissionCoordinator, SharedSpriteState, SpriteState};
pub use inject::{DEFAULT_MARKER, inject_sprite, inject_sprite_at};
pub use registry::AssetRegistry;
pub use symbol_id::{GenerateSymbolId, SymbolIdGenerator};
