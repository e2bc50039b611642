//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for Coverage Matrix,
//! including execution data decoding, probe-map analysis, matrix persistence,
//! file system helpers, logging and i18n support.
//!
//! 此模块为 Coverage Matrix 提供基础设施服务，
//! 包括执行数据解码、探针映射分析、矩阵持久化、文件系统辅助、日志和国际化支持。

pub mod analysis;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod persistence;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
