pub mod expr;
pub mod free_vars;
pub mod matcher;
pub mod print;
pub mod replace;
