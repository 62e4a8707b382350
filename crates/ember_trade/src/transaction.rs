//! # Atomic Transactions
//!
//! An ordered list of paired execute/rollback operations over some context,
//! committed all-or-nothing. Generic over the context so the unwinding
//! logic can be tested against a plain recorder instead of a full world.

use ember_core::CoreError;
use thiserror::Error;

/// Why a commit did not complete cleanly.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The transaction was already committed; it can be neither extended
    /// nor re-run.
    #[error("transaction already committed")]
    AlreadyCommitted,

    /// An operation failed; everything before it was rolled back.
    #[error("operation {index} failed: {source}")]
    Operation {
        /// Position of the failing operation in append order.
        index: usize,
        /// The underlying failure.
        source: CoreError,
    },

    /// An operation failed and a rollback step failed too, leaving the
    /// context in an inconsistent state. This should never happen when
    /// rollbacks are exact inverses.
    #[error("rollback of operation {index} failed after operation {failed}: {source}")]
    Rollback {
        /// Position of the failing rollback step.
        index: usize,
        /// Position of the operation whose failure triggered the unwind.
        failed: usize,
        /// The underlying rollback failure.
        source: CoreError,
    },
}

type Op<C> = Box<dyn FnMut(&mut C) -> Result<(), CoreError> + Send>;

struct Operation<C> {
    execute: Op<C>,
    rollback: Op<C>,
}

/// An all-or-nothing sequence of operations over a context `C`.
pub struct AtomicTransaction<C> {
    operations: Vec<Operation<C>>,
    committed: bool,
}

impl<C> Default for AtomicTransaction<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> AtomicTransaction<C> {
    /// Creates an empty transaction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            committed: false,
        }
    }

    /// True once [`AtomicTransaction::commit`] has succeeded.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Number of appended operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// True if no operations have been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Appends an execute/rollback pair. The rollback must be the exact
    /// inverse of the execute.
    ///
    /// # Errors
    ///
    /// Returns [`CommitError::AlreadyCommitted`] once committed.
    pub fn push(
        &mut self,
        execute: impl FnMut(&mut C) -> Result<(), CoreError> + Send + 'static,
        rollback: impl FnMut(&mut C) -> Result<(), CoreError> + Send + 'static,
    ) -> Result<(), CommitError> {
        if self.committed {
            return Err(CommitError::AlreadyCommitted);
        }
        self.operations.push(Operation {
            execute: Box::new(execute),
            rollback: Box::new(rollback),
        });
        Ok(())
    }

    /// Executes every operation in append order. The first failure halts
    /// execution and rolls back the already-executed prefix in strict
    /// reverse order before reporting the error.
    ///
    /// # Errors
    ///
    /// Returns [`CommitError::Operation`] after a clean unwind,
    /// [`CommitError::Rollback`] if the unwind itself failed, and
    /// [`CommitError::AlreadyCommitted`] on a second commit attempt.
    pub fn commit(&mut self, ctx: &mut C) -> Result<(), CommitError> {
        if self.committed {
            return Err(CommitError::AlreadyCommitted);
        }
        for index in 0..self.operations.len() {
            if let Err(source) = (self.operations[index].execute)(ctx) {
                for back in (0..index).rev() {
                    if let Err(rollback_err) = (self.operations[back].rollback)(ctx) {
                        return Err(CommitError::Rollback {
                            index: back,
                            failed: index,
                            source: rollback_err,
                        });
                    }
                }
                return Err(CommitError::Operation { index, source });
            }
        }
        self.committed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fail() -> CoreError {
        CoreError::EntityNotFound(0)
    }

    #[test]
    fn test_commit_executes_in_append_order() {
        let mut txn: AtomicTransaction<Vec<&'static str>> = AtomicTransaction::new();
        txn.push(|log| { log.push("a"); Ok(()) }, |log| { log.push("-a"); Ok(()) })
            .unwrap();
        txn.push(|log| { log.push("b"); Ok(()) }, |log| { log.push("-b"); Ok(()) })
            .unwrap();

        let mut log = Vec::new();
        txn.commit(&mut log).unwrap();
        assert_eq!(log, vec!["a", "b"]);
        assert!(txn.is_committed());
    }

    #[test]
    fn test_failure_rolls_back_in_reverse_order() {
        let mut txn: AtomicTransaction<Vec<&'static str>> = AtomicTransaction::new();
        txn.push(|log| { log.push("a"); Ok(()) }, |log| { log.push("-a"); Ok(()) })
            .unwrap();
        txn.push(|log| { log.push("b"); Ok(()) }, |log| { log.push("-b"); Ok(()) })
            .unwrap();
        txn.push(|_| Err(fail()), |log| { log.push("-c"); Ok(()) })
            .unwrap();
        txn.push(|log| { log.push("d"); Ok(()) }, |log| { log.push("-d"); Ok(()) })
            .unwrap();

        let mut log = Vec::new();
        let err = txn.commit(&mut log).unwrap_err();
        assert!(matches!(err, CommitError::Operation { index: 2, .. }));
        // The failing op and the never-reached op leave no rollback trace.
        assert_eq!(log, vec!["a", "b", "-b", "-a"]);
        assert!(!txn.is_committed());
    }

    #[test]
    fn test_committed_transaction_is_sealed() {
        let mut txn: AtomicTransaction<u32> = AtomicTransaction::new();
        txn.push(|n| { *n += 1; Ok(()) }, |n| { *n -= 1; Ok(()) })
            .unwrap();
        let mut ctx = 0;
        txn.commit(&mut ctx).unwrap();
        assert_eq!(ctx, 1);

        assert!(matches!(
            txn.push(|_| Ok(()), |_| Ok(())),
            Err(CommitError::AlreadyCommitted)
        ));
        assert!(matches!(
            txn.commit(&mut ctx),
            Err(CommitError::AlreadyCommitted)
        ));
        assert_eq!(ctx, 1);
    }

    #[test]
    fn test_failed_rollback_is_reported() {
        let mut txn: AtomicTransaction<u32> = AtomicTransaction::new();
        txn.push(|n| { *n += 1; Ok(()) }, |_| Err(fail())).unwrap();
        txn.push(|_| Err(fail()), |_| Ok(())).unwrap();

        let mut ctx = 0;
        let err = txn.commit(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            CommitError::Rollback {
                index: 0,
                failed: 1,
                ..
            }
        ));
    }
}
