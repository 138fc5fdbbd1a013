//! Lazy, fallible, exactly-once resource construction.
//!
//! # Data Flow
//! ```text
//! caller A ─┐                       ┌─▶ factory() ─▶ Ready(T) | Failed(E)
//! caller B ─┼─▶ claim slot ─ won ───┘                  │
//! caller C ─┘        │                                 │ notify
//!                    └─ lost ─▶ wait for change ◀──────┘
//!                                  │
//!                                  └─▶ clone of the terminal outcome
//! ```
//!
//! # Slot States
//! ```text
//! Empty → Constructing → Ready
//!                      → Failed
//! ```
//!
//! # Design Decisions
//! - Slots are owned values, never package-level globals
//! - The claim is a single atomic compare-and-set on the watch channel
//! - Waiters sleep on change notifications; nothing polls
//! - Failures are terminal: no retry within the lifetime of the slot
//! - Panics and abandoned initializers resolve the slot to Failed

pub mod lazy;

pub use lazy::{ConstructionPanic, LazySingleton, SlotState};
