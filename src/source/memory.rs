//! In-memory source

use crate::analysis::StorageObject;
use crate::error::{BlobTierError, Result};
use crate::source::{ObjectSource, ObjectStream};
use async_trait::async_trait;

/// Source backed by a vector of objects, optionally failing part-way through
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    name: String,
    objects: Vec<StorageObject>,
    failure: Option<(usize, String)>,
}

impl VecSource {
    pub fn new<S: Into<String>>(name: S, objects: Vec<StorageObject>) -> Self {
        Self {
            name: name.into(),
            objects,
            failure: None,
        }
    }

    /// Yield an error after the first `after` objects instead of the rest
    pub fn failing_after<S: Into<String>>(mut self, after: usize, message: S) -> Self {
        self.failure = Some((after, message.into()));
        self
    }
}

#[async_trait]
impl ObjectSource for VecSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn objects(&self) -> Result<ObjectStream<'_>> {
        let mut items: Vec<Result<StorageObject>> = Vec::new();
        for (index, object) in self.objects.iter().enumerate() {
            if let Some((after, message)) = &self.failure {
                if index == *after {
                    items.push(Err(BlobTierError::source(&self.name, message.clone())));
                    break;
                }
            }
            items.push(Ok(object.clone()));
        }
        if let Some((after, message)) = &self.failure {
            if *after >= self.objects.len() {
                items.push(Err(BlobTierError::source(&self.name, message.clone())));
            }
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }
}
