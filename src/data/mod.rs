//! Data structures for print jobs.
//!
//! This module contains the inputs the application hands to the printer:
//! the transaction being receipted and the store configuration.

pub mod store;
pub mod transaction;

pub use store::{PaperWidth, StoreConfig};
pub use transaction::{LineItem, PaymentMethod, Transaction};

/// A single receipt to print. Never persisted; scoped to one print call.
#[derive(Debug, Clone, Copy)]
pub struct PrintJob<'a> {
    /// The sale being receipted.
    pub transaction: &'a Transaction,
    /// Store header/footer settings.
    pub store: &'a StoreConfig,
}

impl<'a> PrintJob<'a> {
    /// Bundle a transaction with its store configuration.
    pub fn new(transaction: &'a Transaction, store: &'a StoreConfig) -> Self {
        Self { transaction, store }
    }
}
