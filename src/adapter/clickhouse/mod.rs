pub mod row;
pub mod store;

pub use row::DocumentRow;
pub use store::ClickHouseStore;
