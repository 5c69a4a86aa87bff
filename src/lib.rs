pub mod boundary;
pub mod config;
pub mod driver;
pub mod environment;
pub mod formatter;
pub mod interpreter;
pub mod lexer;
pub mod pacer;
pub mod parser;
pub mod resolver;
pub mod session;
pub mod store;
pub mod string;
pub mod value;
