//! Batch lifecycle shared by accrual and distribution batches.
//!
//! A batch moves Draft → Printed → Posted. Printing may be undone while the
//! batch is not yet posted; posting is final.
//!
//! ```text
//!          print            post
//!  Draft ─────────► Printed ─────► Posted
//!    ▲                 │
//!    └─────────────────┘
//!        undo_print
//! ```

mod state;

#[cfg(test)]
mod state_props;

pub use state::{BatchState, CorruptLifecycle, Lifecycle, StateConflict};
