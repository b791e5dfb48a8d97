mod parser;


pub use parser::Parser;
