pub mod deferred;
pub mod expr;
pub mod operator;
