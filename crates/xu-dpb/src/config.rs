//! DPB 配置.

use xu_core::{XuError, XuResult};

/// DPB 可容纳的图像缓冲上限 (硬容量)
pub const DPB_MAX_PICS: usize = 16;

/// DPB 重排配置
///
/// `fields_per_buffer` 由解码后端决定: 有的后端每个输出缓冲只装一场,
/// 有的把两场合并在同一个缓冲里.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DpbConfig {
    /// 每个图像缓冲容纳的场数 (1 或 2)
    pub fields_per_buffer: u8,
    /// 严格按序号输出, 不做提前释放
    pub strict_reorder: bool,
    /// 以 POC 作为主排序键 (FOC 作为次键), 否则只用 FOC
    pub poc_based_reorder: bool,
    /// 初始缓冲深度, 每次 push 时会被 `max_pics_buffering` 覆盖
    pub max_pics: usize,
}

impl Default for DpbConfig {
    fn default() -> Self {
        Self {
            fields_per_buffer: 2,
            strict_reorder: true,
            poc_based_reorder: true,
            max_pics: DPB_MAX_PICS,
        }
    }
}

impl DpbConfig {
    /// 校验配置
    pub fn validate(&self) -> XuResult<()> {
        validate_fields_per_buffer(self.fields_per_buffer)?;
        if self.max_pics == 0 || self.max_pics > DPB_MAX_PICS {
            return Err(XuError::InvalidArgument(format!(
                "缓冲深度必须在 1..={DPB_MAX_PICS} 之间: {}",
                self.max_pics
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_fields_per_buffer(fields_per_buffer: u8) -> XuResult<()> {
    match fields_per_buffer {
        1 | 2 => Ok(()),
        n => Err(XuError::InvalidArgument(format!(
            "每缓冲场数只能为 1 或 2: {n}"
        ))),
    }
}
