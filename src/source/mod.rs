//! Object sources
//!
//! An [`ObjectSource`] yields the objects of one logical source (a local
//! directory tree or one blob container) as a lazy stream. The Azure
//! implementation lives in [`crate::blob`].

pub mod local;
pub mod memory;

pub use local::LocalSource;
pub use memory::VecSource;

use crate::analysis::StorageObject;
use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

pub type ObjectStream<'a> = Pin<Box<dyn Stream<Item = Result<StorageObject>> + Send + 'a>>;

/// A finite, restartable listing of objects.
///
/// Each call to [`objects`](Self::objects) starts a fresh enumeration.
/// Implementations skip bad subtrees where they can; an `Err` item ends the
/// listing of that source.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Identifier of the source (container name or root path)
    fn name(&self) -> &str;

    /// Start enumerating the source
    async fn objects(&self) -> Result<ObjectStream<'_>>;
}
