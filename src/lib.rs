//! Pastee probe library
//!
//! 剪贴板历史同步引擎的命令行入口

pub mod bootstrap;
pub mod cli;
