//! Grammar productions, implemented as extensions of `Parser`.
//!
//! Split by area the way the language reference splits its chapters:
//! expressions, data types, statements, declarations, hierarchy items,
//! primitives, assertion declarations, and randsequence.

mod assertions;
mod decls;
mod exprs;
mod items;
mod randseq;
mod stmts;
mod types;
mod udp;
