pub mod query;
pub mod xpath;

pub use query::{ensure_attached, UniquenessCheck, DOM_QUERY_WARNING};
pub use xpath::XPathExpr;
