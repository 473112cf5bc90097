//! Views over parsed Workflow Description Language (WDL) documents.
//!
//! This crate renders parse results for humans and machines, summarizes
//! documents, and draws workflows as Mermaid flowcharts. Every view is a pure
//! function of a [ParseResult](wdlparse_grammar::ParseResult).
//!
//! # Examples
//!
//! ```rust
//! use wdlparse_analysis::build_diagram;
//! use wdlparse_grammar::ParseOptions;
//! use wdlparse_grammar::parse;
//!
//! let result = parse(
//!     "version 1.1\ntask t { command <<< >>> }\nworkflow w { call t }",
//!     ParseOptions::default(),
//! );
//! let diagram = build_diagram(&result);
//! assert!(diagram.contains("call_t ==> task_t"));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod diagram;
pub mod info;
pub mod render;

pub use diagram::Edge;
pub use diagram::EdgeKind;
pub use diagram::Node;
pub use diagram::NodeKind;
pub use diagram::WorkflowGraph;
pub use diagram::build_diagram;
pub use info::DocumentInfo;
pub use render::DiagnosticCounts;
pub use render::OutputFormat;
pub use render::ParseReport;
pub use render::RenderOptions;
pub use render::render;
pub use render::render_with;
