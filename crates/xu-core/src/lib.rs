//! # xu-core
//!
//! Xu 重排引擎核心库, 提供错误类型、有理数与显示时间戳游标.
//!
//! 上层的 `xu-dpb` 只依赖这里的类型, 不涉及任何像素数据.

pub mod error;
pub mod rational;
pub mod timestamp;

// 重导出常用类型
pub use error::{XuError, XuResult};
pub use rational::Rational;
pub use timestamp::{PtsDate, TICK_0};
