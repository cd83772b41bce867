//! 解码图像缓冲 (DPB) 重排.
//!
//! 解码器按解码顺序送入帧/场, DPB 按输出序号重排后再按显示顺序交出.
//! 缓冲深度由调用方通过 `max_pics_buffering` 逐次指定, DPB 在插入前
//! 输出足够多的图像使占用降到深度以下.
//!
//! 占用按"图像缓冲"计数: 每缓冲一场时每个条目占一个缓冲;
//! 每缓冲两场时两场共用一个缓冲, 先到的单场等待后到的场配对.

mod output;

use log::{debug, trace, warn};
use xu_core::{XuError, XuResult};

use crate::config::{DPB_MAX_PICS, DpbConfig, validate_fields_per_buffer};
use crate::frame_info::FrameInfo;

// ============================================================
// 内部条目
// ============================================================

#[derive(Debug)]
struct Entry<P> {
    info: FrameInfo<P>,
    /// 插入序号, 排序键相同时先进先出
    seq: u64,
    /// 序列纪元, 每次 flush 插入加一; 旧纪元的图像总是先输出
    epoch: u64,
}

/// 排序键: (纪元, 主键, FOC, 插入序号)
type OrderKey = (u64, i32, i32, u64);

/// 最近一次输出的位置, 供非严格模式判断连续性
#[derive(Debug, Clone, Copy)]
struct OutputPosition {
    epoch: u64,
    foc: i32,
    poc: i32,
}

/// DPB 运行统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DpbStats {
    /// 插入的单元数 (含续场)
    pub inserted: u64,
    /// 输出的图像数
    pub output: u64,
    /// 其中由非严格模式提前释放的图像数
    pub early_released: u64,
    /// 消耗掉的无图像续场数
    pub continuations: u64,
    /// `clear` 丢弃的图像数
    pub dropped: u64,
    /// flush 插入次数
    pub flushes: u64,
}

// ============================================================
// DPB
// ============================================================

/// 解码图像缓冲, 按输出序号重排图像
///
/// 所有操作都在调用线程上同步完成, 需要 `&mut self`; 跨线程使用时由调用方加锁.
#[derive(Debug)]
pub struct Dpb<P> {
    /// 按排序键升序存放
    entries: Vec<Entry<P>>,
    config: DpbConfig,
    max_pics: usize,
    /// 占用的图像缓冲数
    size: usize,
    /// 存放的场数
    stored_fields: usize,
    next_seq: u64,
    epoch: u64,
    last_output: Option<OutputPosition>,
    stats: DpbStats,
}

impl<P> Dpb<P> {
    /// 按配置创建空 DPB
    pub fn new(config: DpbConfig) -> XuResult<Self> {
        config.validate()?;
        debug!(
            "DPB: 创建, fields_per_buffer={}, strict={}, poc_based={}, max_pics={}",
            config.fields_per_buffer,
            config.strict_reorder,
            config.poc_based_reorder,
            config.max_pics,
        );
        Ok(Self {
            entries: Vec::with_capacity(DPB_MAX_PICS),
            max_pics: config.max_pics,
            config,
            size: 0,
            stored_fields: 0,
            next_seq: 0,
            epoch: 0,
            last_output: None,
            stats: DpbStats::default(),
        })
    }

    /// 插入一个解码单元, 不产生输出
    ///
    /// # Panics
    /// DPB 已满 (`size() == DPB_MAX_PICS`) 时插入属于调用方协议错误, 直接终止.
    pub fn insert(&mut self, info: FrameInfo<P>) {
        assert!(
            self.size < DPB_MAX_PICS,
            "DPB 已满 (size={}), 插入前必须先输出",
            self.size
        );

        if info.flush {
            self.epoch += 1;
            self.stats.flushes += 1;
            debug!("DPB: flush 插入, 进入纪元 {}, foc={}", self.epoch, info.foc);
        }

        let entry = Entry {
            info,
            seq: self.next_seq,
            epoch: self.epoch,
        };
        self.next_seq = self.next_seq.wrapping_add(1);

        let poc_based = self.config.poc_based_reorder;
        let key = order_key(poc_based, &entry);
        let insert_pos = self
            .entries
            .partition_point(|cur| order_key(poc_based, cur) < key);

        self.stored_fields += usize::from(entry.info.field_units());
        trace!(
            "DPB: 插入 foc={} poc={} field={} 位置={}",
            entry.info.foc, entry.info.poc, entry.info.field, insert_pos
        );
        self.entries.insert(insert_pos, entry);
        self.update_size();
        self.stats.inserted += 1;

        assert!(self.size <= DPB_MAX_PICS, "DPB 占用超过硬容量");
    }

    /// 丢弃全部缓存, 不产生输出 (seek 等场景)
    ///
    /// 返回被丢弃的图像数 (不含续场).
    pub fn clear(&mut self) -> usize {
        let dropped = self
            .entries
            .iter()
            .filter(|entry| entry.info.picture.is_some())
            .count();
        if !self.entries.is_empty() {
            debug!(
                "DPB: 清空 {} 个条目, 丢弃 {} 幅图像",
                self.entries.len(),
                dropped
            );
        }
        self.entries.clear();
        self.stored_fields = 0;
        self.size = 0;
        self.last_output = None;
        self.stats.dropped += dropped as u64;
        dropped
    }

    /// 修改缓冲深度, 下一次 push 时生效
    ///
    /// 超出 `1..=DPB_MAX_PICS` 的值会被截断.
    pub fn set_max_pics(&mut self, max_pics: usize) {
        let clamped = max_pics.clamp(1, DPB_MAX_PICS);
        if clamped == self.max_pics {
            return;
        }
        if clamped != max_pics {
            warn!(
                "DPB: 缓冲深度 {} 超出范围, 截断为 {}",
                max_pics, clamped
            );
        }
        debug!("DPB: 缓冲深度 {} -> {}", self.max_pics, clamped);
        self.max_pics = clamped;
    }

    /// 修改每缓冲场数, 仅允许在 DPB 为空时进行
    pub fn set_fields_per_buffer(&mut self, fields_per_buffer: u8) -> XuResult<()> {
        validate_fields_per_buffer(fields_per_buffer)?;
        if !self.entries.is_empty() {
            return Err(XuError::InvalidArgument(format!(
                "DPB 非空 ({} 个条目) 时不能修改每缓冲场数",
                self.entries.len()
            )));
        }
        self.config.fields_per_buffer = fields_per_buffer;
        self.update_size();
        Ok(())
    }

    /// 条目数 (含续场)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 占用的图像缓冲数
    pub fn size(&self) -> usize {
        self.size
    }

    /// 存放的场数
    pub fn stored_fields(&self) -> usize {
        self.stored_fields
    }

    /// 当前缓冲深度
    pub fn max_pics(&self) -> usize {
        self.max_pics
    }

    pub fn config(&self) -> &DpbConfig {
        &self.config
    }

    pub fn stats(&self) -> &DpbStats {
        &self.stats
    }

    /// 按输出顺序列出待输出条目的 FOC
    pub fn pending_focs(&self) -> impl Iterator<Item = i32> + '_ {
        self.entries.iter().map(|entry| entry.info.foc)
    }

    fn update_size(&mut self) {
        self.size = match self.config.fields_per_buffer {
            1 => self.entries.len(),
            _ => self.stored_fields.div_ceil(2),
        };
    }
}

fn order_key<P>(poc_based: bool, entry: &Entry<P>) -> OrderKey {
    let primary = if poc_based {
        entry.info.poc
    } else {
        entry.info.foc
    };
    (entry.epoch, primary, entry.info.foc, entry.seq)
}
