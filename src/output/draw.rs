// 该文件是 Kuaimen （快门） 项目的一部分。
// src/output/draw.rs - 叠加层栅格化
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

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;

use crate::output::overlay::OverlayItem;

const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_HEIGHT: i32 = 24;
const LABEL_CHAR_WIDTH: f32 = 11.0; // 每字符平均宽度（粗略估计）
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const BOX_COLOR: [u8; 3] = [0, 0, 255];
const TEXT_COLOR: [u8; 3] = [255, 255, 255];

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("无法读取字体文件: {0}")]
  FontIo(#[from] std::io::Error),
  #[error("无法解析字体文件: {0}")]
  FontInvalid(#[from] ab_glyph::InvalidFont),
}

/// 在 RGB 图像上绘制叠加项。没有字体时只画框不写字。
pub struct Draw {
  font: Option<FontVec>,
  font_size: f32,
  box_color: [u8; 3],
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font: None,
      font_size: LABEL_FONT_SIZE,
      box_color: BOX_COLOR,
    }
  }
}

impl Draw {
  pub fn with_font_path(path: &str) -> Result<Self, DrawError> {
    let data = std::fs::read(path)?;
    let font = FontVec::try_from_vec(data)?;
    Ok(Self {
      font: Some(font),
      ..Self::default()
    })
  }

  pub fn draw_overlay(&self, image: &mut RgbImage, items: &[OverlayItem]) {
    for item in items {
      self.draw_item(image, item);
    }
  }

  fn draw_item(&self, image: &mut RgbImage, item: &OverlayItem) {
    let x = item.rect.x.floor() as i32;
    let y = item.rect.y.floor() as i32;
    let width = item.rect.width.ceil() as i32;
    let height = item.rect.height.ceil() as i32;

    // 空矩形或退化矩形没有可画的内容
    if width <= 0 || height <= 0 {
      return;
    }

    // imageproc 自行裁剪越界部分，屏幕外的框部分可见
    let rect = Rect::at(x, y).of_size(width as u32, height as u32);
    draw_hollow_rect_mut(image, rect, Rgb(self.box_color));
    let inner = Rect::at(x + 1, y + 1).of_size((width - 1).max(1) as u32, (height - 1).max(1) as u32);
    draw_hollow_rect_mut(image, inner, Rgb(self.box_color));

    let Some(font) = &self.font else {
      return;
    };

    let label = format!("{} {:.2}", item.label, item.score);
    let text_width = (label.len() as f32 * LABEL_CHAR_WIDTH) as i32;
    let label_x = x.max(0);
    let label_y = (y - LABEL_TEXT_HEIGHT).max(0);

    let max_width = (image.width() as i32 - label_x).max(0);
    let label_width = text_width.min(max_width);
    if label_width <= 0 {
      return;
    }

    let background = Rect::at(label_x, label_y).of_size(label_width as u32, LABEL_TEXT_HEIGHT as u32);
    draw_filled_rect_mut(image, background, Rgb(self.box_color));

    draw_text_mut(
      image,
      Rgb(TEXT_COLOR),
      label_x,
      label_y + LABEL_TEXT_VERTICAL_PADDING,
      PxScale::from(self.font_size),
      font,
      &label,
    );
  }
}
