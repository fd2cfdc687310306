pub mod expression;
pub mod logic;
pub mod parameter;
pub mod property;
pub mod schema;
pub mod value;

pub use expression::{FilterExpression, SortExpression};
pub use logic::{Expression, Link, LogicCondition, LogicOperator, LogicTree};
pub use parameter::{
    Combinator, ComparisonKind, FilterParameter, Operator, Parameter, SortDirection,
    SortParameter,
};
pub use property::PropertyInfo;
pub use schema::{FieldSchema, TypeSchema, TypeTag};
pub use value::{format_number, Value};
