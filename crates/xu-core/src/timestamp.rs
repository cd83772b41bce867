//! 显示时间戳游标.
//!
//! DPB 输出时用它给图像打上显示时间戳. 游标以场率为步进单位,
//! 每输出一个单元推进若干个 tick. 时间单位统一为微秒.

use log::trace;

use crate::error::{XuError, XuResult};
use crate::rational::Rational;

/// 第一个有效时间戳 (微秒), 0 保留给"尚未开始"
pub const TICK_0: i64 = 1;

const MICROS_PER_SECOND: i128 = 1_000_000;

/// 以固定速率步进的时间戳游标
///
/// 当前值 = origin + count * 1_000_000 * den / num.
/// 每次都从 origin 重新计算, 长时间步进不会累积舍入误差.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtsDate {
    rate: Rational,
    origin: i64,
    count: u64,
}

impl PtsDate {
    /// 以给定速率 (tick/秒) 创建游标, 起点为 [`TICK_0`]
    pub fn new(rate: Rational) -> XuResult<Self> {
        if !rate.is_positive() {
            return Err(XuError::InvalidArgument(format!(
                "时间戳游标速率必须为正数: {rate}"
            )));
        }
        Ok(Self {
            rate: rate.reduce(),
            origin: TICK_0,
            count: 0,
        })
    }

    /// 速率 (已约分)
    pub fn rate(&self) -> Rational {
        self.rate
    }

    /// 重置起点, 步进计数清零
    pub fn set(&mut self, origin: i64) {
        trace!("PtsDate: 重置起点 {} -> {}", self.get(), origin);
        self.origin = origin;
        self.count = 0;
    }

    /// 当前时间戳 (微秒)
    pub fn get(&self) -> i64 {
        let elapsed = i128::from(self.count) * MICROS_PER_SECOND * i128::from(self.rate.den)
            / i128::from(self.rate.num);
        self.origin
            .saturating_add(i64::try_from(elapsed).unwrap_or(i64::MAX))
    }

    /// 前进 `ticks` 步, 返回前进后的时间戳
    pub fn increment(&mut self, ticks: u32) -> i64 {
        self.count = self.count.saturating_add(u64::from(ticks));
        self.get()
    }
}
