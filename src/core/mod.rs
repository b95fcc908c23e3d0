//! Core XML primitives
//!
//! The building blocks of the pull engine and the serializers:
//! - Scanner: delimiter detection using memchr
//! - Tokenizer: state machine for XML token extraction
//! - Entities: entity decoding and escaping with Cow (zero-copy when possible)
//! - Attributes: attribute parsing and extraction
//! - Encoding: encoding detection and conversion to and from UTF-8
//! - Namespace: prefix scopes shared by the pull reader and the writers

pub mod attributes;
pub mod encoding;
pub mod entities;
pub mod namespace;
pub mod scanner;
pub mod tokenizer;
