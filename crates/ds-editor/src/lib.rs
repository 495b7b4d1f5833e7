pub mod commands;
pub mod domain;
pub mod intent;
pub mod inventory;
pub mod patch;
pub mod registry;
pub mod session;

pub use commands::{Command, CommandStack, Edit};
pub use intent::{EditIntent, apply_intents};
pub use inventory::{InventoryEntry, build_inventory};
pub use patch::{
    PatchOp, PatchResult, RejectClass, RejectReason, RejectedOp, RevisionScope, ValueClamp,
    apply_patch,
};
pub use registry::{LockRegistry, Selection};
pub use session::{EditSession, SessionConfig};
