//! # Matrix Handles
//!
//! [`MatrixObject`] is the shared, lockable handle through which collections
//! hold their matrices. Readers take a [`ReadPin`], a scoped read-only
//! snapshot that is released when the guard is dropped, on every exit path.
//!
//! ## Usage
//! ```rust
//! use paramserv_rpc::core::handle::MatrixObject;
//! use paramserv_rpc::core::matrix::MatrixBlock;
//!
//! let obj = MatrixObject::new(MatrixBlock::zeros(2, 2).unwrap());
//! {
//!     let pin = obj.acquire_read().unwrap();
//!     assert_eq!(pin.rows(), 2);
//!     assert_eq!(obj.pin_count(), 1);
//! }
//! assert_eq!(obj.pin_count(), 0);
//! ```

use crate::core::matrix::MatrixBlock;
use crate::error::{Result, RpcError};
use crate::utils::metrics::global_metrics;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};

struct Shared {
    block: RwLock<MatrixBlock>,
    pins: AtomicUsize,
}

/// Shared handle to a matrix block
#[derive(Clone)]
pub struct MatrixObject {
    inner: Arc<Shared>,
}

/// A read-only snapshot of a matrix, held until dropped
pub struct ReadPin<'a> {
    guard: RwLockReadGuard<'a, MatrixBlock>,
    pins: &'a AtomicUsize,
}

impl MatrixObject {
    pub fn new(block: MatrixBlock) -> Self {
        Self {
            inner: Arc::new(Shared {
                block: RwLock::new(block),
                pins: AtomicUsize::new(0),
            }),
        }
    }

    /// Pin a stable read-only snapshot of the block
    pub fn acquire_read(&self) -> Result<ReadPin<'_>> {
        let guard = self
            .inner
            .block
            .read()
            .map_err(|_| RpcError::LockPoisoned)?;
        self.inner.pins.fetch_add(1, Ordering::AcqRel);
        global_metrics().matrix_pinned();

        Ok(ReadPin {
            guard,
            pins: &self.inner.pins,
        })
    }

    /// Mutate the block under the write lock
    pub fn update<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut MatrixBlock) -> T,
    {
        let mut guard = self
            .inner
            .block
            .write()
            .map_err(|_| RpcError::LockPoisoned)?;
        Ok(f(&mut guard))
    }

    /// Owned copy of the current block
    pub fn snapshot(&self) -> Result<MatrixBlock> {
        Ok(self.acquire_read()?.clone())
    }

    /// Number of live read pins
    pub fn pin_count(&self) -> usize {
        self.inner.pins.load(Ordering::Acquire)
    }

    /// Whether a writer panicked while holding the block
    pub fn is_poisoned(&self) -> bool {
        self.inner.block.is_poisoned()
    }

    /// Whether both handles share the same block
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<MatrixBlock> for MatrixObject {
    fn from(block: MatrixBlock) -> Self {
        Self::new(block)
    }
}

impl PartialEq for MatrixObject {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.acquire_read(), other.acquire_read()) {
            (Ok(a), Ok(b)) => *a == *b,
            _ => false,
        }
    }
}

impl fmt::Debug for MatrixObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.block.try_read() {
            Ok(block) => f
                .debug_struct("MatrixObject")
                .field("rows", &block.rows())
                .field("cols", &block.cols())
                .field("nnz", &block.non_zeros())
                .finish(),
            Err(_) => f.write_str("MatrixObject(<locked>)"),
        }
    }
}

impl Deref for ReadPin<'_> {
    type Target = MatrixBlock;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl Drop for ReadPin<'_> {
    fn drop(&mut self) {
        self.pins.fetch_sub(1, Ordering::AcqRel);
    }
}
