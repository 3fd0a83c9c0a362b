pub mod aggregate;
pub mod assign;
pub mod export;
pub mod expr_eval;
pub mod filter;
pub(crate) mod grouping;
pub mod join;
pub mod limit;
pub mod operator;
pub mod project;
pub mod scan;
pub mod sort;
pub mod table;
pub mod unique;
pub mod value_cmp;

#[cfg(test)]
pub(crate) mod test_util;
