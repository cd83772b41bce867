//! DPB 输出单元.

/// 按显示顺序输出的一幅图像
///
/// 每个输出单元独立持有自己的图像, 可以单独释放.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPicture<P> {
    /// 解码图像
    pub picture: P,
    /// 显示时间戳 (微秒)
    pub pts: i64,
    /// 帧/场输出序号
    pub foc: i32,
    /// 图像序号
    pub poc: i32,
    /// 是否为单场
    pub field: bool,
    /// 顶场优先
    pub top_field_first: bool,
    /// 携带的时间戳个数
    pub num_ts: u8,
}

impl<P> OutputPicture<P> {
    /// 取出图像, 丢弃排序元数据
    pub fn into_picture(self) -> P {
        self.picture
    }
}
