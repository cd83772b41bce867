//! 解码单元的排序元数据.
//!
//! 每个解码出的帧或场都附带一份 [`FrameInfo`], 随图像一起送入 DPB.

use xu_core::Rational;

use crate::config::DPB_MAX_PICS;

/// 一个解码单元 (帧或单场) 的元数据, 并持有其解码图像
///
/// 所有字段对任何码流类型都有意义, 因此是一个普通结构体而非按事件区分的枚举.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo<P> {
    /// 帧/场输出序号 (FOC)
    pub foc: i32,
    /// 图像序号 (POC)
    pub poc: i32,
    /// 是否为单场
    pub field: bool,
    /// 顶场优先
    pub top_field_first: bool,
    /// 逐行扫描
    pub progressive: bool,
    /// 携带的时间戳个数, 原样透传给输出
    pub num_ts: u8,
    /// 目标缓冲深度, 每次 push 都会重新读取
    pub max_pics_buffering: u8,
    /// 插入前先清空 DPB (新 GOP / 不连续点)
    pub flush: bool,
    /// 场率
    pub field_rate: Rational,
    /// 解码器给出的显示时间戳 (微秒), 存在时输出直接使用并重置游标
    pub pts: Option<i64>,
    /// 解码图像; 续场 (数据在配对场的缓冲里) 为 `None`
    pub picture: Option<P>,
}

impl<P> FrameInfo<P> {
    fn with_layout(foc: i32, poc: i32, field: bool, picture: Option<P>) -> Self {
        Self {
            foc,
            poc,
            field,
            top_field_first: true,
            progressive: !field,
            num_ts: if field { 1 } else { 2 },
            max_pics_buffering: DPB_MAX_PICS as u8,
            flush: false,
            field_rate: Rational::UNDEFINED,
            pts: None,
            picture,
        }
    }

    /// 完整帧
    pub fn frame(foc: i32, poc: i32, picture: P) -> Self {
        Self::with_layout(foc, poc, false, Some(picture))
    }

    /// 单场
    pub fn field(foc: i32, poc: i32, picture: P) -> Self {
        Self::with_layout(foc, poc, true, Some(picture))
    }

    /// 不带图像的续场
    pub fn continuation(foc: i32, poc: i32) -> Self {
        Self::with_layout(foc, poc, true, None)
    }

    pub fn with_flush(mut self, flush: bool) -> Self {
        self.flush = flush;
        self
    }

    pub fn with_max_pics_buffering(mut self, max_pics_buffering: u8) -> Self {
        self.max_pics_buffering = max_pics_buffering;
        self
    }

    pub fn with_pts(mut self, pts: i64) -> Self {
        self.pts = Some(pts);
        self
    }

    pub fn with_field_rate(mut self, field_rate: Rational) -> Self {
        self.field_rate = field_rate;
        self
    }

    pub fn with_top_field_first(mut self, top_field_first: bool) -> Self {
        self.top_field_first = top_field_first;
        self
    }

    pub fn with_progressive(mut self, progressive: bool) -> Self {
        self.progressive = progressive;
        self
    }

    pub fn with_num_ts(mut self, num_ts: u8) -> Self {
        self.num_ts = num_ts;
        self
    }

    /// 占用的场数: 帧为 2, 单场为 1
    pub fn field_units(&self) -> u8 {
        if self.field { 1 } else { 2 }
    }
}
