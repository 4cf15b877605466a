//! Caller-facing CRUD client.
//!
//! Keep the public surface small and predictable: [`Fetcher`] and its
//! builders. Dispatch and demultiplexing live in private submodules under
//! `src/client/`.

pub mod builder;
pub mod core;
mod demux;
mod dispatch;
pub mod resource;

pub use builder::FetcherBuilder;
pub use self::core::Fetcher;
pub use resource::ResourceRequestBuilder;
