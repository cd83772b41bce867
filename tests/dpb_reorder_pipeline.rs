//! DPB 重排集成测试
//!
//! 按解码顺序逐个送入帧/场, 核对每次插入前输出的图像序列以及缓冲计数.

use xu::core::{PtsDate, Rational, TICK_0};
use xu::dpb::{Dpb, DpbConfig, FrameInfo, OutputPicture};

/// 场率 30000/1000
const FIELD_RATE: Rational = Rational::new(30000, 1000);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn build_strict_dpb(fields_per_buffer: u8) -> Dpb<i32> {
    init_logger();
    Dpb::new(DpbConfig {
        fields_per_buffer,
        strict_reorder: true,
        poc_based_reorder: true,
        ..DpbConfig::default()
    })
    .expect("创建 DPB 失败")
}

fn build_date() -> PtsDate {
    let mut date = PtsDate::new(FIELD_RATE).expect("创建时间戳游标失败");
    date.set(TICK_0);
    date
}

/// 构造测试单元: 图像内容即 FOC, POC 取 FOC 去掉最低位, FOC 为 0 时刷新
fn unit(foc: i32, field: bool, depth: u8) -> FrameInfo<i32> {
    let info = if field {
        FrameInfo::field(foc, foc & !1, foc).with_progressive(true)
    } else {
        FrameInfo::frame(foc, foc & !1, foc)
    };
    info.with_max_pics_buffering(depth)
        .with_flush(foc == 0)
        .with_field_rate(FIELD_RATE)
}

fn focs(out: &[OutputPicture<i32>]) -> Vec<i32> {
    out.iter().map(|pic| pic.picture).collect()
}

fn check_push(dpb: &mut Dpb<i32>, date: &mut PtsDate, info: FrameInfo<i32>, expected: &[i32]) {
    let foc = info.foc;
    let out = dpb.push(info, date);
    assert_eq!(focs(&out), expected, "插入 foc={foc} 前的输出不符");
}

fn check_drain(dpb: &mut Dpb<i32>, date: &mut PtsDate, expected: &[i32]) {
    let out = dpb.drain(date);
    assert_eq!(focs(&out), expected, "drain 输出不符");
    assert_eq!(dpb.size(), 0, "drain 后 size 应为 0");
    assert_eq!(dpb.stored_fields(), 0, "drain 后 stored_fields 应为 0");
}

// ============================================================
// 帧模式
// ============================================================

#[test]
fn test_dpb_with_frames() {
    let mut dpb = build_strict_dpb(2);
    let mut date = build_date();

    check_push(&mut dpb, &mut date, unit(0, false, 4), &[]);
    check_push(&mut dpb, &mut date, unit(4, false, 4), &[]);
    check_push(&mut dpb, &mut date, unit(2, false, 4), &[]);
    // 新序列: 先按显示顺序输出旧序列
    check_push(&mut dpb, &mut date, unit(0, false, 4), &[0, 2, 4]);

    check_push(&mut dpb, &mut date, unit(8, false, 4), &[]);
    check_push(&mut dpb, &mut date, unit(2, false, 4), &[]);
    check_push(&mut dpb, &mut date, unit(6, false, 4), &[]);
    check_push(&mut dpb, &mut date, unit(4, false, 4), &[0]);

    // 深度从 4 降到 2
    check_push(&mut dpb, &mut date, unit(10, false, 2), &[2, 4, 6]);
    check_push(&mut dpb, &mut date, unit(0, false, 2), &[8, 10]);
    assert_eq!(dpb.size(), 1);

    check_drain(&mut dpb, &mut date, &[0]);
}

// ============================================================
// 场模式
// ============================================================

#[test]
fn test_dpb_with_fields_one_per_buffer() {
    let mut dpb = build_strict_dpb(1);
    let mut date = build_date();

    check_push(&mut dpb, &mut date, unit(0, true, 2), &[]);
    check_push(&mut dpb, &mut date, unit(2, true, 2), &[]);
    assert_eq!(dpb.stored_fields(), 2);
    assert_eq!(dpb.size(), 2);

    check_push(&mut dpb, &mut date, unit(1, true, 2), &[0]);
    check_drain(&mut dpb, &mut date, &[1, 2]);
}

#[test]
fn test_dpb_with_fields_two_per_buffer() {
    let mut dpb = build_strict_dpb(2);
    let mut date = build_date();

    check_push(&mut dpb, &mut date, unit(0, true, 2), &[]);
    check_push(&mut dpb, &mut date, unit(2, true, 2), &[]);
    assert_eq!(dpb.stored_fields(), 2);
    assert_eq!(dpb.size(), 1, "两场共用一个缓冲");

    check_push(&mut dpb, &mut date, unit(1, true, 2), &[]);
    assert_eq!(dpb.stored_fields(), 3);
    assert_eq!(dpb.size(), 2);

    check_drain(&mut dpb, &mut date, &[0, 1, 2]);
}

#[test]
fn test_dpb_mixed_frames_and_fields() {
    // 同一个 DPB 依次切换每缓冲场数, 每轮结束都已排空
    let mut dpb = build_strict_dpb(1);
    let mut date = build_date();

    for (fields_per_buffer, size_after_pair) in [(1u8, 3usize), (2, 2)] {
        dpb.set_fields_per_buffer(fields_per_buffer)
            .expect("排空后应允许修改每缓冲场数");

        check_push(&mut dpb, &mut date, unit(0, false, 3), &[]);
        check_push(&mut dpb, &mut date, unit(3, true, 3), &[]);
        assert_eq!(dpb.stored_fields(), 3);
        assert_eq!(dpb.size(), 2);

        check_push(&mut dpb, &mut date, unit(2, true, 3), &[]);
        assert_eq!(dpb.stored_fields(), 4);
        assert_eq!(dpb.size(), size_after_pair);

        check_drain(&mut dpb, &mut date, &[0, 2, 3]);
    }
}

// ============================================================
// 通用性质
// ============================================================

/// 简单的线性同余序列, 生成可复现的 GOP 结构
fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
    *seed >> 16
}

#[test]
fn test_every_inserted_picture_is_output_once_in_order() {
    let mut dpb = build_strict_dpb(2);
    let mut date = build_date();
    let mut seed = 7u32;
    let mut inserted = 0usize;
    let mut outputs = Vec::new();

    for _ in 0..20 {
        // 每个 GOP: I 帧 + 随机长度的 P/B 组, 解码顺序为 P 先于其前面的 B
        let depth = 2 + (lcg(&mut seed) % 5) as u8;
        let mut decode_order = vec![0];
        let mut anchor = 0;
        for _ in 0..(1 + lcg(&mut seed) % 4) {
            let b_count = (lcg(&mut seed) % 3) as i32;
            let next_anchor = anchor + 2 * (b_count + 1);
            decode_order.push(next_anchor);
            for b in 1..=b_count {
                decode_order.push(anchor + 2 * b);
            }
            anchor = next_anchor;
        }

        let mut gop_out = Vec::new();
        for foc in decode_order {
            gop_out.extend(focs(&dpb.push(unit(foc, false, depth), &mut date)));
            inserted += 1;
            assert!(dpb.size() <= usize::from(depth), "占用不应超过深度");
        }
        outputs.push(gop_out);
    }
    let tail = focs(&dpb.drain(&mut date));

    let total: usize = outputs.iter().map(Vec::len).sum::<usize>() + tail.len();
    assert_eq!(total, inserted, "输出数应等于插入数");
    assert_eq!((dpb.size(), dpb.stored_fields()), (0, 0));

    // 同一序列内输出序号单调不减: 序列边界处 foc 回到 0
    let flat: Vec<i32> = outputs.into_iter().flatten().chain(tail).collect();
    for pair in flat.windows(2) {
        assert!(
            pair[1] >= pair[0] || pair[1] == 0,
            "输出序号不应倒退: {} -> {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_non_strict_unit_step_stream_keeps_display_order() {
    // 按 FOC 排序, 帧 FOC 步长为 1; 提前释放不应打乱显示顺序
    init_logger();
    let mut dpb: Dpb<i32> = Dpb::new(DpbConfig {
        fields_per_buffer: 2,
        strict_reorder: false,
        poc_based_reorder: false,
        ..DpbConfig::default()
    })
    .expect("创建 DPB 失败");
    let mut date = build_date();
    let mut seed = 11u32;
    let mut expected = Vec::new();
    let mut actual = Vec::new();

    for _ in 0..20 {
        let depth = 2 + (lcg(&mut seed) % 5) as u8;
        let mut decode_order = vec![0];
        let mut anchor = 0;
        for _ in 0..(1 + lcg(&mut seed) % 4) {
            let b_count = (lcg(&mut seed) % 3) as i32;
            let next_anchor = anchor + b_count + 1;
            decode_order.push(next_anchor);
            decode_order.extend(anchor + 1..next_anchor);
            anchor = next_anchor;
        }
        expected.extend(0..=anchor);

        for foc in decode_order {
            let info = FrameInfo::frame(foc, foc, foc)
                .with_max_pics_buffering(depth)
                .with_flush(foc == 0);
            actual.extend(focs(&dpb.push(info, &mut date)));
        }
    }
    actual.extend(focs(&dpb.drain(&mut date)));

    assert_eq!(actual, expected, "非严格模式输出顺序不符");
    assert_eq!(dpb.len(), 0, "排空后不应剩余条目");
    assert!(dpb.stats().early_released > 0, "连续的 FOC 应触发提前释放");
}

#[test]
fn test_output_pts_advances_one_tick_per_frame() {
    let mut dpb = build_strict_dpb(2);
    let mut date = build_date();
    for foc in [0, 6, 2, 4] {
        dpb.push(unit(foc, false, 8), &mut date);
    }
    let pts: Vec<i64> = dpb.drain(&mut date).iter().map(|pic| pic.pts).collect();
    assert_eq!(pts, vec![TICK_0, TICK_0 + 33_333, TICK_0 + 66_666, TICK_0 + 100_000]);
}
