//! # Core Module / 核心模块
//!
//! This module contains the core pipeline of Coverage Matrix: session grouping,
//! granularity projection, matrix accumulation and the run orchestration that
//! ties them together.
//!
//! 此模块包含 Coverage Matrix 的核心管道：会话分组、粒度投影、
//! 矩阵累积，以及将它们串联起来的运行编排。

pub mod accumulator;
pub mod config;
pub mod coverage;
pub mod matrix;
pub mod models;
pub mod pipeline;
pub mod projection;
pub mod session;

// Re-exports
pub use accumulator::MatrixAccumulator;
pub use config::MatrixConfig;
pub use models::{Granularity, Outcome};
pub use pipeline::Pipeline;
pub use projection::project;
pub use session::SessionVisitor;
