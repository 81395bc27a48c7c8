pub mod errors;
pub mod list_query;
pub mod pagination;

pub use errors::*;
pub use list_query::*;
pub use pagination::*;
