use alloy_primitives::Address;

use crate::models::datasets::operations::{
    AccountIdentifier, Amount, LedgerOperation, OperationIdentifier, OperationStatus,
    OperationType,
};

/// Assembles the operations of one transaction. Indices are assigned in push
/// order starting at 0, so an operation can only relate to earlier ones.
#[derive(Debug, Default)]
pub struct OperationBuilder {
    operations: Vec<LedgerOperation>,
}

impl OperationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            operations: Vec::with_capacity(capacity),
        }
    }

    /// Appends a successful operation and returns its index.
    pub fn push(
        &mut self,
        op_type: OperationType,
        account: Address,
        amount: Amount,
        related: Option<u64>,
    ) -> u64 {
        let index = self.operations.len() as u64;
        debug_assert!(related.is_none_or(|related| related < index));

        self.operations.push(LedgerOperation {
            operation_identifier: OperationIdentifier { index },
            related_operations: related
                .map(|index| vec![OperationIdentifier { index }])
                .unwrap_or_default(),
            op_type,
            status: OperationStatus::Success,
            account: AccountIdentifier {
                address: account.to_checksum(None),
            },
            amount,
        });

        index
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn build(self) -> Vec<LedgerOperation> {
        self.operations
    }
}
