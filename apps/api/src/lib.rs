//! Résumé parser service: turns extracted résumé text into a structured record.
//!
//! The engine lives in [`parser`] and is a pure function of its input text.
//! Everything else is the HTTP surface around it.

pub mod config;
pub mod documents;
pub mod errors;
pub mod models;
pub mod parser;
pub mod render;
pub mod routes;
pub mod state;

pub use models::resume::ResumeRecord;
pub use parser::{parse_resume, ParseError};
