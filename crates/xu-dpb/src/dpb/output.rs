use super::*;

use xu_core::PtsDate;

use crate::output::OutputPicture;

// ============================================================
// 输出与深度控制
// ============================================================

impl<P> Dpb<P> {
    /// 输出显示顺序上的下一幅图像
    ///
    /// 选出排序键最小的条目, 打上显示时间戳并推进游标. 无图像的续场只推进游标
    /// 和计数, 然后继续选下一个条目. DPB 中没有可输出的图像时返回 `None`.
    pub fn output_next(&mut self, date: &mut PtsDate) -> Option<OutputPicture<P>> {
        while !self.entries.is_empty() {
            if let Some(picture) = self.output_head(date) {
                return Some(picture);
            }
        }
        None
    }

    /// 调用方协议: 先输出到深度以下 (flush 时输出全部), 再插入
    ///
    /// 每次调用都会重新读取 `info.max_pics_buffering`, 深度减小时本次会连续
    /// 输出多幅图像, 直到占用低于新深度. 非严格模式下插入后还会提前释放
    /// 已确定处于显示顺序下一位的图像.
    pub fn push(&mut self, info: FrameInfo<P>, date: &mut PtsDate) -> Vec<OutputPicture<P>> {
        self.set_max_pics(usize::from(info.max_pics_buffering));

        let mut out = Vec::new();
        while info.flush || self.size >= self.max_pics {
            match self.output_next(date) {
                Some(picture) => out.push(picture),
                None => break,
            }
        }
        if info.flush && !out.is_empty() {
            debug!("DPB: flush 输出 {} 幅图像", out.len());
        }

        self.insert(info);

        if !self.config.strict_reorder {
            self.release_ready(date, &mut out);
        }
        out
    }

    /// 按显示顺序输出全部缓存
    pub fn drain(&mut self, date: &mut PtsDate) -> Vec<OutputPicture<P>> {
        let mut out = Vec::with_capacity(self.entries.len());
        while let Some(picture) = self.output_next(date) {
            out.push(picture);
        }
        assert!(
            self.size == 0 && self.stored_fields == 0,
            "drain 后计数应归零: size={}, stored_fields={}",
            self.size,
            self.stored_fields
        );
        out
    }

    /// 非严格模式: 头部条目与上次输出之间不可能再插入其他图像时无需等待深度填满
    fn release_ready(&mut self, date: &mut PtsDate, out: &mut Vec<OutputPicture<P>>) {
        while let Some(head) = self.entries.first() {
            if !self.follows_last_output(head) {
                break;
            }
            if let Some(picture) = self.output_head(date) {
                trace!("DPB: 提前释放 foc={}", picture.foc);
                self.stats.early_released += 1;
                out.push(picture);
            }
        }
    }

    /// 排序键在整数意义上紧接上次输出: 同一纪元内 FOC 恰好加一, 按 POC 排序时
    /// 还要求 POC 相同. 纪元内尚无输出时要求序号为 0 (纪元内序号从 0 开始且非负).
    ///
    /// 帧的 FOC 步长因码流而异 (H.264 为 2, HEVC 可以为 1).
    fn follows_last_output(&self, entry: &Entry<P>) -> bool {
        let poc_based = self.config.poc_based_reorder;
        let info = &entry.info;
        match self.last_output {
            Some(last) if last.epoch == entry.epoch => {
                last.foc.checked_add(1) == Some(info.foc) && (!poc_based || info.poc == last.poc)
            }
            _ => info.foc == 0 && (!poc_based || info.poc == 0),
        }
    }

    /// 移除头部条目; 续场返回 `None`
    fn output_head(&mut self, date: &mut PtsDate) -> Option<OutputPicture<P>> {
        let entry = self.entries.remove(0);
        let info = entry.info;
        let field_units = info.field_units();

        assert!(
            self.stored_fields >= usize::from(field_units),
            "DPB 场计数不一致: stored_fields={}, 待移除 {}",
            self.stored_fields,
            field_units
        );
        self.stored_fields -= usize::from(field_units);
        self.update_size();
        self.last_output = Some(OutputPosition {
            epoch: entry.epoch,
            foc: info.foc,
            poc: info.poc,
        });

        let pts = match info.pts {
            Some(pts) => {
                date.set(pts);
                pts
            }
            None => date.get(),
        };
        date.increment(self.ticks_for(field_units));

        let Some(picture) = info.picture else {
            trace!("DPB: 消耗续场 foc={}", info.foc);
            self.stats.continuations += 1;
            return None;
        };

        trace!(
            "DPB: 输出 foc={} poc={} pts={} size={} stored_fields={}",
            info.foc, info.poc, pts, self.size, self.stored_fields
        );
        self.stats.output += 1;
        Some(OutputPicture {
            picture,
            pts,
            foc: info.foc,
            poc: info.poc,
            field: info.field,
            top_field_first: info.top_field_first,
            num_ts: info.num_ts,
        })
    }

    /// 跨两场的单元在每缓冲一场时占两个 tick, 其余一个
    fn ticks_for(&self, field_units: u8) -> u32 {
        if field_units == 2 && self.config.fields_per_buffer == 1 {
            2
        } else {
            1
        }
    }
}
