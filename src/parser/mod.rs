pub mod common;
pub mod filter;
pub mod lexer;
pub mod logic;
pub mod order;
pub mod property;

pub use common::{key, key_operator, operator, split_path};
pub use filter::{parse_filter, parse_filter_term};
pub use lexer::{split_terms, Term};
pub use logic::{group_filter, group_sort};
pub use order::{parse_order, parse_order_term};
pub use property::PropertyResolver;
