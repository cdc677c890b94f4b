//! Lifts parsed type declarations into a typed intermediate representation,
//! rewriting them with a pipeline of transforms on the way.
pub mod ast;
pub mod cli;
pub mod config;
mod engine;
pub mod error;
pub mod file;
pub mod imports;
pub mod ir;
pub mod jq_exec;
pub mod lower;
pub mod path_de;
pub mod transform;

pub use ast::SourceFile;
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use ir::{Field, File, Import, Type};
pub use transform::{Matcher, Transform};
