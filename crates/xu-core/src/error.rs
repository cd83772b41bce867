//! 统一错误类型定义.
//!
//! 只覆盖可恢复的配置类错误. DPB 容量溢出等协议违例属于调用方 bug,
//! 直接以断言终止, 不经过这里.

use thiserror::Error;

/// Xu 统一错误类型
#[derive(Debug, Error)]
pub enum XuError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 无效数据 (轨迹文件损坏、输出与预期不符等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// Xu 统一 Result 类型
pub type XuResult<T> = Result<T, XuError>;
