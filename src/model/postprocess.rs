// 该文件是 Kuaimen （快门） 项目的一部分。
// src/model/postprocess.rs - 模型输出解码
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

use thiserror::Error;
use tracing::debug;

use crate::labels::LabelTable;
use crate::model::{DetectResult, Detection};

/// 每条检测记录在输出数组中占用的槽位数:
/// [x_min, y_min, x_max, y_max, score, class_id]
pub const DETECTION_STRIDE: usize = 6;

#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("推理结果缺失: 未找到检测输出张量")]
  NoDetectionData,
}

/// 将平铺的模型输出解码为结构化检测序列。
///
/// 坐标与置信度原样拷贝（模型内部已归一化，也已做过后处理，
/// 这里不再施加置信度阈值）。类别值截断为整数后做范围检查，
/// 越界的记录静默丢弃。输出顺序与输入数组一致。
pub fn decode_detections(
  output: Option<&[f32]>,
  labels: &LabelTable,
) -> Result<DetectResult, DecodeError> {
  let data = output.ok_or(DecodeError::NoDetectionData)?;

  let mut items = Vec::with_capacity(data.len() / DETECTION_STRIDE);

  for window in data.chunks_exact(DETECTION_STRIDE) {
    let class_raw = window[5] as i64;
    if class_raw < 0 || class_raw as usize >= labels.len() {
      debug!("丢弃类别越界的检测记录: {}", class_raw);
      continue;
    }

    items.push(Detection {
      class_id: class_raw as usize,
      score: window[4],
      bbox: [window[0], window[1], window[2], window[3]],
    });
  }

  debug!("解码得到 {} 条检测", items.len());

  Ok(DetectResult {
    items: items.into_boxed_slice(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn labels(n: usize) -> LabelTable {
    let path = std::env::temp_dir().join(format!(
      "kuaimen-decode-labels-{}-{}.txt",
      std::process::id(),
      n
    ));
    let text: Vec<String> = (0..n).map(|i| format!("class-{}", i)).collect();
    std::fs::write(&path, text.join("\n")).unwrap();
    LabelTable::from_file(path.to_str().unwrap()).unwrap()
  }

  #[test]
  fn missing_output_is_an_error() {
    let err = decode_detections(None, &LabelTable::coco()).unwrap_err();
    assert!(matches!(err, DecodeError::NoDetectionData));
  }

  #[test]
  fn empty_output_yields_empty_result() {
    let result = decode_detections(Some(&[]), &LabelTable::coco()).unwrap();
    assert!(result.is_empty());
  }

  #[test]
  fn partitions_into_stride_windows() {
    let data: Vec<f32> = (0..DETECTION_STRIDE * 5)
      .map(|i| if i % DETECTION_STRIDE == 5 { 0.0 } else { 0.5 })
      .collect();
    let result = decode_detections(Some(&data), &LabelTable::coco()).unwrap();
    assert_eq!(result.len(), 5);
  }

  #[test]
  fn rejects_out_of_range_classes_keeps_order() {
    // 三条记录：类别 0、类别 16、类别 999（越界）
    let data = [
      0.1, 0.1, 0.4, 0.4, 0.9, 0.0, //
      0.5, 0.5, 0.9, 0.9, 0.4, 16.0, //
      0.1, 0.1, 0.2, 0.2, 0.99, 999.0,
    ];
    let result = decode_detections(Some(&data), &LabelTable::coco()).unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.items[0].class_id, 0);
    assert_eq!(result.items[1].class_id, 16);
  }

  #[test]
  fn rejects_negative_classes() {
    let data = [0.1, 0.1, 0.4, 0.4, 0.9, -1.0];
    let result = decode_detections(Some(&data), &LabelTable::coco()).unwrap();
    assert!(result.is_empty());
  }

  #[test]
  fn class_value_is_truncated_not_rounded() {
    // 16.9 截断为 16；-0.5 截断为 0，仍是有效类别
    let data = [
      0.1, 0.1, 0.4, 0.4, 0.9, 16.9, //
      0.2, 0.2, 0.3, 0.3, 0.8, -0.5,
    ];
    let result = decode_detections(Some(&data), &LabelTable::coco()).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.items[0].class_id, 16);
    assert_eq!(result.items[1].class_id, 0);
  }

  #[test]
  fn score_and_bbox_are_copied_verbatim() {
    // 不施加置信度阈值：低分记录照样保留
    let data = [0.25, 0.5, 0.75, 1.0, 0.01, 3.0];
    let result = decode_detections(Some(&data), &labels(4)).unwrap();

    assert_eq!(result.len(), 1);
    let det = &result.items[0];
    assert_eq!(det.score, 0.01);
    assert_eq!(det.bbox, [0.25, 0.5, 0.75, 1.0]);
    assert_eq!(det.class_id, 3);
  }

  #[test]
  fn table_boundary_class_is_rejected() {
    let table = labels(3);
    let data = [
      0.0, 0.0, 1.0, 1.0, 0.5, 2.0, //
      0.0, 0.0, 1.0, 1.0, 0.5, 3.0,
    ];
    let result = decode_detections(Some(&data), &table).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.items[0].class_id, 2);
  }
}
