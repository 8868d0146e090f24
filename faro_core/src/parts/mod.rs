pub mod origin;
pub mod params;
pub mod part;
pub mod state_slot;

pub use origin::Origin;
pub use params::PartParams;
pub use part::{InteractionState, Part};
pub use state_slot::{SlotContent, StateSlot};
