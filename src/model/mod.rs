// 该文件是 Kuaimen （快门） 项目的一部分。
// src/model/mod.rs - 检测结果定义
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

pub mod postprocess;

pub use postprocess::{DecodeError, decode_detections};

/// 单个检测：类别序号、置信度、归一化边界框。
/// 每次推理重新生成，下一次捕获时整体替换。
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
  /// 类别序号，保证是标签表的有效下标
  pub class_id: usize,
  /// 置信度 [0, 1]，原样来自模型输出
  pub score: f32,
  /// [x_min, y_min, x_max, y_max]，归一化到 [0, 1]
  pub bbox: [f32; 4],
}

/// 一次推理的全部检测，保持模型输出顺序
#[derive(Debug, Clone, Default)]
pub struct DetectResult {
  pub items: Box<[Detection]>,
}

impl DetectResult {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}
