//! `libscript` is the library that powers the `script` interpreter.
//!
//! The pipeline has three stages, each living in its own module under
//! [`core`]:
//! - the `Lexer` turns source text into a lazy stream of `Token`s
//! - the `Parser` is a Pratt parser that turns tokens into a `Program` plus a
//!   list of syntax errors (it never stops at the first bad statement)
//! - the `Interpreter` walks the `Program` against an `Environment` and
//!   produces an `Object`
//!
//! Runtime failures are not Rust errors. They are ordinary `Object::Error`
//! values that every evaluation step checks for and hands back unchanged, so
//! a REPL can print them like any other result.
#![warn(clippy::pedantic)]

pub mod core;
