//! In-memory transaction source for testing and embedding

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory source holding already-parsed transactions
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    transactions: Arc<RwLock<Vec<Transaction>>>,
}

impl MemorySource {
    /// Create a new memory source
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions: Arc::new(RwLock::new(transactions)),
        }
    }

    /// Append a transaction
    pub fn push(&self, transaction: Transaction) {
        match self.transactions.write() {
            Ok(mut transactions) => transactions.push(transaction),
            Err(poisoned) => poisoned.into_inner().push(transaction),
        }
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Vec<Transaction> {
        match self.transactions.read() {
            Ok(transactions) => transactions.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TransactionSource for MemorySource {
    async fn load(&self) -> ReconciliationResult<LoadedRecords> {
        let transactions = self.snapshot();

        if transactions.is_empty() {
            return Err(ReconciliationError::EmptyDataset(self.describe()));
        }

        Ok(LoadedRecords {
            transactions,
            rejected: Vec::new(),
        })
    }

    fn describe(&self) -> String {
        "in-memory transactions".to_string()
    }
}
