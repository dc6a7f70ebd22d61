//! Cart engine: local mirror, display join, aggregates and selection.

mod aggregate;
mod catalog;
mod command;
mod selection;
mod synchronizer;
mod view;

pub use aggregate::AggregateState;
pub use catalog::{CatalogEntry, CatalogError, CatalogSnapshot, ProductCatalogIndex};
pub use command::{CartCommand, RollbackPolicy};
pub use selection::SelectionSetManager;
pub use synchronizer::CartSynchronizer;
pub(crate) use synchronizer::detached;
pub use view::{CartView, join};
