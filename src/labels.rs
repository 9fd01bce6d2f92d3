// 该文件是 Kuaimen （快门） 项目的一部分。
// src/labels.rs - 类别标签表
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

use anyhow::{Context, Result};

/// COCO 数据集类别名称
pub const COCO_LABELS: [&str; 80] = [
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "backpack",
  "umbrella",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "dining table",
  "toilet",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];

/// 类别标签表：按序号寻址的固定字符串序列，进程生命周期内不可变
#[derive(Debug, Clone)]
pub struct LabelTable {
  names: Box<[String]>,
}

impl LabelTable {
  /// 内置的 COCO 80 类标签表
  pub fn coco() -> Self {
    LabelTable {
      names: COCO_LABELS.iter().map(|s| s.to_string()).collect(),
    }
  }

  /// 从文本文件加载标签表，每行一个标签，行号即类别序号
  pub fn from_file(path: &str) -> Result<Self> {
    let text =
      std::fs::read_to_string(path).with_context(|| format!("无法读取标签文件: {}", path))?;

    let names: Box<[String]> = text
      .lines()
      .map(|line| line.trim().to_string())
      .filter(|line| !line.is_empty())
      .collect();

    Ok(LabelTable { names })
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&str> {
    self.names.get(index).map(|s| s.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn coco_table_has_80_entries() {
    let labels = LabelTable::coco();
    assert_eq!(labels.len(), 80);
    assert_eq!(labels.get(0), Some("person"));
    assert_eq!(labels.get(16), Some("dog"));
    assert_eq!(labels.get(79), Some("toothbrush"));
  }

  #[test]
  fn out_of_range_index_is_none() {
    let labels = LabelTable::coco();
    assert_eq!(labels.get(80), None);
  }

  #[test]
  fn loads_labels_from_file() {
    let path = std::env::temp_dir().join(format!("kuaimen-labels-{}.txt", std::process::id()));
    std::fs::write(&path, "cat\ndog\n\nbird\n").unwrap();

    let labels = LabelTable::from_file(path.to_str().unwrap()).unwrap();
    assert_eq!(labels.len(), 3);
    assert_eq!(labels.get(1), Some("dog"));
    assert_eq!(labels.get(2), Some("bird"));
  }
}
