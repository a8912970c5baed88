//! # Filter Expression Language - Abstract Syntax Tree
//!
//! This module defines the tokens and the tree for filter expressions, the
//! small language recipes use to decide whether they apply to a client.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, lookups, operators, filters, transforms)
//!
//! ## Quick Start
//!
//! ```text
//! normandy.channel in ["beta", "nightly"] && normandy.userId|stableSample(0.1)
//! ```
//!
//! This matches beta and nightly clients, sampling a stable 10% of them.
//!
//! ## Core Concepts
//!
//! ### Mutable Grammar
//!
//! Operators are not keywords of the grammar. Every operator symbol and its
//! precedence live in a [`crate::Registry`]; the lexer recognises whatever
//! symbols are registered and the parser groups them by their weights. The
//! tree keeps only the symbol, and the evaluator resolves it again when it
//! runs.
//!
//! ### Lookups
//!
//! ```text
//! normandy.telemetry.main.environment.settings.locale
//! normandy.addons["uBlock0@raymondhill.net"].isActive
//! normandy.experiments[0]
//! ```
//!
//! Missing keys and lookups through `null` yield `null` instead of failing.
//!
//! ### Array Filters
//!
//! A bracket whose expression uses a relative identifier (`.name`) filters
//! the subject:
//!
//! ```text
//! normandy.addons[.type == "extension"]
//! ```
//!
//! ### Transforms
//!
//! A pipe applies a named transform to the operand right before it:
//!
//! ```text
//! normandy.telemetry.main.creationDate|date < "2017-01-01"|date
//! [normandy.userId, normandy.recipe.id]|bucketSample(0, 10, 100)
//! ```
pub mod expressions;
pub mod tokens;

pub use expressions::Expr;
pub use tokens::{Token, TokenKind};
