// 该文件是 Kuaimen （快门） 项目的一部分。
// src/output/overlay.rs - 坐标投影与叠加层原语
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

use crate::labels::LabelTable;
use crate::model::DetectResult;

/// 渲染时读取的视口尺寸，不持久化
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
  pub width: f32,
  pub height: f32,
}

impl Viewport {
  pub fn new(width: f32, height: f32) -> Self {
    Self { width, height }
  }
}

/// 屏幕空间矩形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

/// 单个可绘制的叠加项：矩形加标签文本
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayItem {
  pub rect: PixelRect,
  pub label: String,
  pub score: f32,
}

/// 将归一化边界框投影到视口像素坐标。纯函数，每次渲染重新计算。
/// 不做视口裁剪：坐标超出 [0, 1] 的框会落到屏幕外。
pub fn project_box(bbox: &[f32; 4], viewport: Viewport) -> PixelRect {
  let [x1, y1, x2, y2] = *bbox;
  PixelRect {
    x: x1 * viewport.width,
    y: y1 * viewport.height,
    width: (x2 - x1) * viewport.width,
    height: (y2 - y1) * viewport.height,
  }
}

/// 把一次检测结果展开为叠加项序列。
/// 解码阶段已保证 class_id 是标签表的有效下标。
pub fn build_overlay(
  result: &DetectResult,
  labels: &LabelTable,
  viewport: Viewport,
) -> Vec<OverlayItem> {
  result
    .items
    .iter()
    .map(|det| OverlayItem {
      rect: project_box(&det.bbox, viewport),
      label: labels.get(det.class_id).unwrap_or("?").to_string(),
      score: det.score,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Detection;

  #[test]
  fn projection_is_linear_and_exact() {
    let rect = project_box(&[0.0, 0.0, 1.0, 1.0], Viewport::new(1920.0, 1080.0));
    assert_eq!(
      rect,
      PixelRect {
        x: 0.0,
        y: 0.0,
        width: 1920.0,
        height: 1080.0
      }
    );
  }

  #[test]
  fn projection_does_not_clamp() {
    let rect = project_box(&[-0.5, 0.0, 0.5, 0.5], Viewport::new(100.0, 100.0));
    assert_eq!(
      rect,
      PixelRect {
        x: -50.0,
        y: 0.0,
        width: 100.0,
        height: 50.0
      }
    );
  }

  #[test]
  fn projection_scales_each_axis_independently() {
    let rect = project_box(&[0.25, 0.5, 0.75, 0.75], Viewport::new(400.0, 200.0));
    assert_eq!(rect.x, 100.0);
    assert_eq!(rect.y, 100.0);
    assert_eq!(rect.width, 200.0);
    assert_eq!(rect.height, 50.0);
  }

  #[test]
  fn overlay_carries_labels_and_scores() {
    let result = DetectResult {
      items: vec![
        Detection {
          class_id: 0,
          score: 0.9,
          bbox: [0.1, 0.1, 0.4, 0.4],
        },
        Detection {
          class_id: 16,
          score: 0.4,
          bbox: [0.5, 0.5, 0.9, 0.9],
        },
      ]
      .into_boxed_slice(),
    };

    let items = build_overlay(&result, &LabelTable::coco(), Viewport::new(100.0, 100.0));

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].label, "person");
    assert_eq!(items[0].score, 0.9);
    assert_eq!(items[1].label, "dog");
    assert_eq!(items[1].rect.x, 50.0);
  }

  #[test]
  fn off_screen_boxes_are_kept() {
    let result = DetectResult {
      items: vec![Detection {
        class_id: 0,
        score: 0.5,
        bbox: [1.2, 1.2, 1.5, 1.5],
      }]
      .into_boxed_slice(),
    };

    let items = build_overlay(&result, &LabelTable::coco(), Viewport::new(100.0, 100.0));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].rect.x, 120.0);
  }
}
