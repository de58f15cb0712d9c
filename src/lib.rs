//! Core library for the vinventory command line application.
//!
//! The library turns an RVTools `vInfo` export into a cleaned server list plus
//! a formula-backed summary sheet. Responsibilities are kept narrow: column
//! resolution lives in [`tools::resolve`], unit conversion in
//! [`tools::units`], the canonical inventory in [`tools::transform`], the
//! summary layout under [`tools::summary`], spreadsheet adapters under
//! [`tools::io`], and the end-to-end orchestration in [`tools::pipeline`].

pub mod tools;

pub use tools::{
    Result, ToolError, config, error, io, model, pipeline, resolve, summary, transform, units,
};
