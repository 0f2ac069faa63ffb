//! In-memory collection the decoded values end up in.
//!
//! Stands in for whatever a real deployment persists to. It is the only
//! shared mutable state around the decoder.
use std::sync::{PoisonError, RwLock};

use crate::decode::Decoder;
use crate::error::ErrorReport;
use crate::form::FlatForm;
use crate::typed::Typed;

#[derive(Debug, Default)]
pub struct Store<T> {
    items: RwLock<Vec<T>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("no entry at index {index} (have {len})")]
    NotFound { index: usize, len: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("submission rejected: {0}")]
    Invalid(#[from] ErrorReport),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl<T: Clone> Store<T> {
    pub fn new() -> Self {
        Self { items: RwLock::new(Vec::new()) }
    }

    pub fn append(&self, value: T) -> usize {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.push(value);
        let index = items.len() - 1;
        tracing::debug!(index, "stored new entry");
        index
    }

    pub fn get(&self, index: usize) -> Result<T, StoreError> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        items.get(index).cloned().ok_or(StoreError::NotFound { index, len: items.len() })
    }

    pub fn set(&self, index: usize, value: T) -> Result<(), StoreError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let len = items.len();
        let slot = items.get_mut(index).ok_or(StoreError::NotFound { index, len })?;
        *slot = value;
        tracing::debug!(index, "replaced entry");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn snapshot(&self) -> Vec<T> {
        self.items.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Store<Typed> {
    /// Decode a submitted form and create (`index == None`) or replace an
    /// entry. Nothing is written unless the whole form is valid.
    pub fn submit(&self, decoder: &Decoder, form: &FlatForm, index: Option<usize>) -> Result<usize, SubmitError> {
        let value = decoder.decode(form).inspect_err(|report| {
            tracing::info!(errors = report.len(), ?index, "rejected submission");
        })?;
        match index {
            None => Ok(self.append(value)),
            Some(i) => {
                self.set(i, value)?;
                Ok(i)
            }
        }
    }
}
