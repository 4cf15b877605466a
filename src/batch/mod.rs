//! 请求合并模块：时间窗口收集与分组策略。
//!
//! # Request Consolidation Module
//!
//! Requests opted into consolidation wait in a per-client [`BatchWindow`]
//! for at most one window length. When the window flushes, [`group`] splits
//! the drained requests by (destination, batch tag) into [`Batch`] units:
//!
//! | Unit | Dispatched as |
//! |------|---------------|
//! | [`Batch::Single`] | an ordinary GET or POST |
//! | [`Batch::Grouped`] | one multiplexed POST envelope |
//!
//! ## Example
//!
//! ```rust
//! use fetchr_rs::batch::BatchWindow;
//! use std::time::Duration;
//!
//! // A zero-length window delivers every push immediately.
//! let window: BatchWindow<u32, u32> = BatchWindow::new(
//!     "docs",
//!     Duration::ZERO,
//!     |items| items,
//!     |n| println!("delivered {n}"),
//! );
//! window.push(7);
//! assert_eq!(window.pending_len(), 0);
//! ```

mod grouper;
mod window;

pub use grouper::{group, partition_by, Batch, GroupKey};
pub use window::BatchWindow;
