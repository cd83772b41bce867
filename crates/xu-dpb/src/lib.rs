//! # xu-dpb
//!
//! 解码图像缓冲 (DPB) 输出重排.
//!
//! 解码器按解码顺序产出帧/场, 隔行、B 帧或按场编码的码流中解码顺序与显示顺序不同.
//! [`Dpb`] 缓存解码图像及其排序元数据 ([`FrameInfo`]), 按输出序号把图像
//! 以显示顺序交给后续的显示管线, 并处理单场配对与缓冲深度限制.
//!
//! ## 使用示例
//!
//! ```rust
//! use xu_core::{PtsDate, Rational};
//! use xu_dpb::{Dpb, DpbConfig, FrameInfo};
//!
//! let mut dpb = Dpb::new(DpbConfig::default()).unwrap();
//! let mut date = PtsDate::new(Rational::new(60000, 1001)).unwrap();
//!
//! // 解码顺序 I0 P4 B2, 深度 4
//! for foc in [0, 4, 2] {
//!     let info = FrameInfo::frame(foc, foc, format!("pic{foc}"))
//!         .with_max_pics_buffering(4)
//!         .with_flush(foc == 0);
//!     assert!(dpb.push(info, &mut date).is_empty());
//! }
//!
//! let order: Vec<i32> = dpb.drain(&mut date).iter().map(|p| p.foc).collect();
//! assert_eq!(order, vec![0, 2, 4]);
//! assert_eq!(dpb.size(), 0);
//! ```

pub mod config;
pub mod dpb;
pub mod frame_info;
pub mod output;

// 重导出常用类型
pub use config::{DPB_MAX_PICS, DpbConfig};
pub use dpb::{Dpb, DpbStats};
pub use frame_info::FrameInfo;
pub use output::OutputPicture;
