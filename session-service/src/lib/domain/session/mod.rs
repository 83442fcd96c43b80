pub mod assembler;
pub mod models;
