//! Business logic services for the kitchen inventory ledgers

pub mod batch_stock;
pub mod catalog;
pub mod ingredient_ledger;
pub mod ingredient_stock;
pub mod ledger;
pub mod product_stock;

pub use batch_stock::BatchStockService;
pub use catalog::CatalogService;
pub use ingredient_ledger::IngredientLedgerService;
pub use ingredient_stock::IngredientStockService;
pub use ledger::{IngredientLedger, LedgerKind, LedgerStore, ProductLedger};
pub use product_stock::ProductStockService;
