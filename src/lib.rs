//! # Xu (序)
//!
//! 纯 Rust 实现的解码图像缓冲 (DPB) 重排引擎.
//!
//! 解码器按解码顺序交出帧/场, Xu 把它们缓存起来, 按输出序号 (FOC/POC)
//! 以显示顺序交给显示管线, 同时处理单场配对、缓冲深度与序列刷新.
//!
//! # 快速开始
//!
//! ```rust
//! use xu::core::{PtsDate, Rational};
//! use xu::dpb::{Dpb, DpbConfig, FrameInfo};
//!
//! let mut dpb = Dpb::new(DpbConfig::default()).unwrap();
//! let mut date = PtsDate::new(Rational::new(50, 1)).unwrap();
//!
//! dpb.push(FrameInfo::frame(0, 0, "I").with_flush(true), &mut date);
//! dpb.push(FrameInfo::frame(4, 4, "P"), &mut date);
//! dpb.push(FrameInfo::frame(2, 2, "B"), &mut date);
//!
//! let shown: Vec<&str> = dpb
//!     .drain(&mut date)
//!     .into_iter()
//!     .map(|out| out.into_picture())
//!     .collect();
//! assert_eq!(shown, vec!["I", "B", "P"]);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `xu-core` | 错误类型、有理数、时间戳游标 |
//! | `xu-dpb` | DPB 重排引擎 |

/// 核心类型与工具
pub use xu_core as core;

/// DPB 重排引擎
pub use xu_dpb as dpb;

/// 获取 Xu 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
