pub mod products;
pub mod table;

pub use products::{ProductRecord, ProductsDao, SqlProductsDao};
pub use table::{fill_struct, Table, TableError};
