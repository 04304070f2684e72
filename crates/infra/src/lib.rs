//! Infrastructure layer: persistence for users, calculations, and reminders.

pub mod memory;
pub mod records;
pub mod store;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryTaxStore;
pub use records::{CalculationRecord, ReminderPatch, ReminderRecord, UserRecord};
pub use store::{StoreError, TaxStore};

#[cfg(feature = "postgres")]
pub use postgres::PostgresTaxStore;
