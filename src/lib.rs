pub mod ast;
pub mod ast_printer;
pub mod error;
pub mod expression;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod token_buffer;
pub mod token_range;
