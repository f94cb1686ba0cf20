//! Cavern Core Types and Definitions
//!
//! This crate provides the foundational types for the Cavern map format:
//!
//! - **Document model**: sections and their parsed bodies ([`document`])
//! - **Grids**: rectangular tile layers ([`grid`], [`tile`])
//! - **Objects**: building/vehicle/creature/miner records ([`objects`]),
//!   canonical type names and aliases ([`catalog`])
//! - **Entities**: generational arena for instance bindings ([`arena`])
//! - **Script model**: variables, triggers, chains, commands ([`script`]),
//!   symbol table ([`symbol`]), macro registry ([`macros`])
//! - **Spans**: source locations and line/column resolution ([`span`])

pub mod arena;
pub mod catalog;
pub mod document;
pub mod grid;
pub mod macros;
pub mod objects;
pub mod script;
pub mod span;
pub mod symbol;
pub mod tile;
