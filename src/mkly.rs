//! Main module for mkly library functionality

pub mod ast;
pub mod compile;
pub mod config;
pub mod error;
pub mod kit;
pub mod lexing;
pub mod parsing;
pub mod style;
pub mod testing;
pub mod token;
