//! 重排轨迹: 文件格式与回放.
//!
//! 轨迹按解码顺序描述送入 DPB 的每个单元, 可选地给出每一步预期的输出序列
//! 和缓冲计数. 回放时逐步驱动 [`Dpb`], 遇到不符立即返回错误.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};
use xu_core::{PtsDate, Rational, XuError, XuResult};
use xu_dpb::{DPB_MAX_PICS, Dpb, DpbConfig, DpbStats, FrameInfo, OutputPicture};

/// 一条完整轨迹
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Trace {
    pub name: String,
    #[serde(default)]
    pub config: TraceConfig,
    /// 场率 [分子, 分母]
    #[serde(default = "default_field_rate")]
    pub field_rate: (i32, i32),
    pub steps: Vec<Step>,
}

/// 轨迹中的 DPB 配置, 缺省值与 [`DpbConfig::default`] 一致
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    pub fields_per_buffer: u8,
    pub strict_reorder: bool,
    pub poc_based_reorder: bool,
    pub max_pics: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        let config = DpbConfig::default();
        Self {
            fields_per_buffer: config.fields_per_buffer,
            strict_reorder: config.strict_reorder,
            poc_based_reorder: config.poc_based_reorder,
            max_pics: config.max_pics,
        }
    }
}

impl From<&TraceConfig> for DpbConfig {
    fn from(config: &TraceConfig) -> Self {
        Self {
            fields_per_buffer: config.fields_per_buffer,
            strict_reorder: config.strict_reorder,
            poc_based_reorder: config.poc_based_reorder,
            max_pics: config.max_pics,
        }
    }
}

fn default_field_rate() -> (i32, i32) {
    (60000, 1001)
}

fn default_depth() -> u8 {
    DPB_MAX_PICS as u8
}

/// 轨迹步骤
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// 按调用方协议送入一个单元
    Push(PushStep),
    /// 输出全部缓存
    Drain(Expectation),
    /// 修改每缓冲场数 (DPB 必须为空)
    SetFieldsPerBuffer { value: u8 },
    /// 丢弃全部缓存
    Clear {
        #[serde(default)]
        expect_dropped: Option<usize>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushStep {
    pub foc: i32,
    /// 缺省为 `foc & !1`
    #[serde(default)]
    pub poc: Option<i32>,
    #[serde(default)]
    pub field: bool,
    /// 不带图像的续场
    #[serde(default)]
    pub continuation: bool,
    /// 缺省为 `foc == 0`
    #[serde(default)]
    pub flush: Option<bool>,
    #[serde(default = "default_depth")]
    pub max_pics_buffering: u8,
    #[serde(default)]
    pub pts: Option<i64>,
    #[serde(default)]
    pub expect: Option<Vec<i32>>,
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub stored_fields: Option<usize>,
}

impl PushStep {
    fn expectation(&self) -> Expectation {
        Expectation {
            expect: self.expect.clone(),
            size: self.size,
            stored_fields: self.stored_fields,
        }
    }
}

/// 某一步之后的预期, 未给出的字段不做校验
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    #[serde(default)]
    pub expect: Option<Vec<i32>>,
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub stored_fields: Option<usize>,
}

/// 单步回放结果
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub step: usize,
    pub focs: Vec<i32>,
    pub pts: Vec<i64>,
    pub size: usize,
    pub stored_fields: usize,
}

/// 整条轨迹的回放结果
#[derive(Debug, Clone)]
pub struct Replay {
    pub name: String,
    pub steps: Vec<StepOutput>,
    pub stats: DpbStats,
}

impl Replay {
    /// 全部输出的 FOC, 按输出顺序
    pub fn output_order(&self) -> Vec<i32> {
        self.steps
            .iter()
            .flat_map(|step| step.focs.iter().copied())
            .collect()
    }
}

/// 从 JSON 文件加载轨迹
pub fn load_trace(path: &Path) -> Result<Trace> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("读取轨迹文件失败, path={}", path.display()))?;
    parse_trace(&text).with_context(|| format!("解析轨迹文件失败, path={}", path.display()))
}

pub fn parse_trace(text: &str) -> Result<Trace> {
    Ok(serde_json::from_str(text)?)
}

/// 回放轨迹; `verify` 为真时核对每一步的预期
///
/// 图像内容取送入时的步骤序号, 用来确认每个输出对应哪一次送入.
pub fn replay(trace: &Trace, field_rate: Option<Rational>, verify: bool) -> XuResult<Replay> {
    let rate = field_rate.unwrap_or_else(|| trace.field_rate.into());
    let mut date = PtsDate::new(rate)?;
    let mut dpb: Dpb<usize> = Dpb::new(DpbConfig::from(&trace.config))?;
    let mut steps = Vec::with_capacity(trace.steps.len());

    info!("回放轨迹 '{}', {} 步, 场率 {}", trace.name, trace.steps.len(), rate);

    for (index, step) in trace.steps.iter().enumerate() {
        let (out, expectation) = match step {
            Step::Push(push) => {
                let info = build_frame_info(push, index, rate);
                (dpb.push(info, &mut date), Some(push.expectation()))
            }
            Step::Drain(expect) => (dpb.drain(&mut date), Some(expect.clone())),
            Step::SetFieldsPerBuffer { value } => {
                dpb.set_fields_per_buffer(*value)?;
                (Vec::new(), None)
            }
            Step::Clear { expect_dropped } => {
                let dropped = dpb.clear();
                if verify {
                    if let Some(expected) = expect_dropped {
                        check(&trace.name, index, "丢弃数", expected, &dropped)?;
                    }
                }
                (Vec::new(), None)
            }
        };

        let result = collect_step(index, &out, &dpb);
        debug!(
            "步骤 {}: 输出 {:?}, size={}, stored_fields={}, 条目 {} 个, 待输出 {:?}",
            index,
            result.focs,
            result.size,
            result.stored_fields,
            dpb.len(),
            dpb.pending_focs().collect::<Vec<_>>()
        );

        if verify {
            if let Some(expectation) = &expectation {
                verify_step(&trace.name, &result, expectation)?;
            }
        }
        steps.push(result);
    }

    Ok(Replay {
        name: trace.name.clone(),
        steps,
        stats: *dpb.stats(),
    })
}

fn build_frame_info(push: &PushStep, index: usize, rate: Rational) -> FrameInfo<usize> {
    let poc = push.poc.unwrap_or(push.foc & !1);
    let info = if push.continuation {
        FrameInfo::continuation(push.foc, poc)
    } else if push.field {
        FrameInfo::field(push.foc, poc, index)
    } else {
        FrameInfo::frame(push.foc, poc, index)
    };
    let info = info
        .with_max_pics_buffering(push.max_pics_buffering)
        .with_flush(push.flush.unwrap_or(push.foc == 0))
        .with_field_rate(rate);
    match push.pts {
        Some(pts) => info.with_pts(pts),
        None => info,
    }
}

fn collect_step(index: usize, out: &[OutputPicture<usize>], dpb: &Dpb<usize>) -> StepOutput {
    StepOutput {
        step: index,
        focs: out.iter().map(|pic| pic.foc).collect(),
        pts: out.iter().map(|pic| pic.pts).collect(),
        size: dpb.size(),
        stored_fields: dpb.stored_fields(),
    }
}

fn verify_step(name: &str, result: &StepOutput, expectation: &Expectation) -> XuResult<()> {
    if let Some(expected) = &expectation.expect {
        check(name, result.step, "输出", expected, &result.focs)?;
    }
    if let Some(expected) = &expectation.size {
        check(name, result.step, "size", expected, &result.size)?;
    }
    if let Some(expected) = &expectation.stored_fields {
        check(name, result.step, "stored_fields", expected, &result.stored_fields)?;
    }
    Ok(())
}

fn check<T: PartialEq + std::fmt::Debug>(
    name: &str,
    step: usize,
    what: &str,
    expected: &T,
    actual: &T,
) -> XuResult<()> {
    if expected == actual {
        return Ok(());
    }
    Err(XuError::InvalidData(format!(
        "轨迹 '{name}' 第 {step} 步{what}不符: 期望 {expected:?}, 实际 {actual:?}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FRAMES_TRACE: &str = include_str!("../../../data/traces/frames.json");
    const FIELDS_TRACE: &str = include_str!("../../../data/traces/fields.json");

    #[test]
    fn test_frames_fixture_replays_cleanly() {
        let trace = parse_trace(FRAMES_TRACE).expect("解析帧模式轨迹失败");
        let replay = replay(&trace, None, true).expect("帧模式轨迹应全部通过");
        assert_eq!(
            replay.output_order(),
            vec![0, 2, 4, 0, 2, 4, 6, 8, 10, 0],
            "全部输出顺序不符"
        );
        assert_eq!(replay.stats.output, 10);
    }

    #[test]
    fn test_fields_fixture_replays_cleanly() {
        let trace = parse_trace(FIELDS_TRACE).expect("解析场模式轨迹失败");
        let replay = replay(&trace, None, true).expect("场模式轨迹应全部通过");
        let last = replay.steps.last().expect("轨迹不应为空");
        assert_eq!((last.size, last.stored_fields), (0, 0));
    }

    #[test]
    fn test_mismatch_is_reported() {
        let text = r#"{
            "name": "mismatch",
            "steps": [
                { "op": "push", "foc": 0, "max_pics_buffering": 2 },
                { "op": "push", "foc": 2, "max_pics_buffering": 2 },
                { "op": "push", "foc": 4, "max_pics_buffering": 2, "expect": [2] }
            ]
        }"#;
        let trace = parse_trace(text).unwrap();
        let err = replay(&trace, None, true).expect_err("预期输出错误时应失败");
        assert!(err.to_string().contains("第 2 步"), "错误信息应指明步骤: {err}");

        // 不校验时照常回放
        let replay = replay(&trace, None, false).unwrap();
        assert_eq!(replay.steps[2].focs, vec![0]);
    }

    #[test]
    fn test_defaults_and_continuation() {
        let text = r#"{
            "name": "continuation",
            "field_rate": [50, 1],
            "steps": [
                { "op": "push", "foc": 0, "field": true, "size": 1, "stored_fields": 1 },
                { "op": "push", "foc": 1, "continuation": true, "size": 1, "stored_fields": 2 },
                { "op": "push", "foc": 2, "pts": 1000000 },
                { "op": "drain", "expect": [0, 2], "size": 0, "stored_fields": 0 }
            ]
        }"#;
        let trace = parse_trace(text).unwrap();
        assert!(trace.config.strict_reorder);
        let replay = replay(&trace, None, true).unwrap();
        assert_eq!(replay.steps[3].pts, vec![1, 1_000_000]);
        assert_eq!(replay.stats.continuations, 1);
    }

    #[test]
    fn test_clear_step_and_field_rate_override() {
        let text = r#"{
            "name": "clear",
            "steps": [
                { "op": "push", "foc": 0 },
                { "op": "push", "foc": 4 },
                { "op": "clear", "expect_dropped": 2 },
                { "op": "set_fields_per_buffer", "value": 1 },
                { "op": "push", "foc": 0, "field": true },
                { "op": "drain", "expect": [0] }
            ]
        }"#;
        let trace = parse_trace(text).unwrap();
        let replay = replay(&trace, Some(Rational::new(25, 1)), true).unwrap();
        assert_eq!(replay.stats.dropped, 2);
        assert_eq!(replay.steps[5].pts, vec![1]);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let text = r#"{ "name": "bad", "steps": [ { "op": "push", "foc": 0, "fcc": 1 } ] }"#;
        assert!(parse_trace(text).is_err());
    }

    #[test]
    fn test_load_trace_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FRAMES_TRACE.as_bytes()).unwrap();
        let trace = load_trace(file.path()).expect("从文件加载轨迹失败");
        assert_eq!(trace.config.fields_per_buffer, 2);

        let missing = load_trace(Path::new("data/traces/does-not-exist.json"));
        assert!(missing.is_err());
    }
}
