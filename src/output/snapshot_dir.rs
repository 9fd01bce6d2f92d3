// 该文件是 Kuaimen （快门） 项目的一部分。
// src/output/snapshot_dir.rs - 快照目录输出
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

use std::path::PathBuf;
use std::sync::atomic::{AtomicU16, Ordering};

use chrono::{Datelike, Utc};
use image::RgbImage;
use thiserror::Error;
use url::Url;

use crate::output::draw::Draw;
use crate::output::overlay::OverlayItem;
use crate::output::Render;
use crate::{FromUrl, FromUrlWithScheme};

#[derive(Error, Debug)]
pub enum SnapshotDirError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 把每次捕获保存到按日期组织的快照目录，方案 `folder://`。
/// `?record` 会额外写出一份检测明细文本。
pub struct SnapshotDirOutput {
  directory: PathBuf,
  draw: Draw,
  record: bool,
  frame_counter: AtomicU16,
}

impl FromUrlWithScheme for SnapshotDirOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for SnapshotDirOutput {
  type Error = SnapshotDirError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(SnapshotDirError::SchemeMismatch);
    }

    let record = url.query_pairs().any(|(k, _)| k == "record");

    Ok(SnapshotDirOutput {
      directory: PathBuf::from(url.path()),
      draw: Draw::default(),
      record,
      frame_counter: AtomicU16::new(0),
    })
  }
}

impl SnapshotDirOutput {
  pub fn new(directory: impl Into<PathBuf>, draw: Draw, record: bool) -> Self {
    Self {
      directory: directory.into(),
      draw,
      record,
      frame_counter: AtomicU16::new(0),
    }
  }

  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }

  fn next_path(&self) -> Result<PathBuf, SnapshotDirError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    let id = self.frame_counter.fetch_add(1, Ordering::Relaxed) + 1;
    Ok(directory.join(format!("{}-{:04X}.png", now.format("%H-%M-%S"), id)))
  }

  fn write_record(&self, path: &PathBuf, items: &[OverlayItem]) -> Result<(), SnapshotDirError> {
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
      lines.push(format!(
        "{}, {:.4}, {:.1}, {:.1}, {:.1}, {:.1}",
        item.label, item.score, item.rect.x, item.rect.y, item.rect.width, item.rect.height
      ));
    }
    std::fs::write(path.with_extension("txt"), lines.join("\n"))?;
    Ok(())
  }
}

impl Render for SnapshotDirOutput {
  type Error = SnapshotDirError;

  fn render(&self, image: &RgbImage, items: &[OverlayItem]) -> Result<(), Self::Error> {
    let path = self.next_path()?;

    let mut canvas = image.clone();
    self.draw.draw_overlay(&mut canvas, items);
    canvas.save(&path)?;

    if self.record {
      self.write_record(&path, items)?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::output::overlay::PixelRect;

  #[test]
  fn writes_snapshot_and_record() {
    let dir = std::env::temp_dir().join(format!("kuaimen-snap-{}", std::process::id()));
    let output = SnapshotDirOutput::new(&dir, Draw::default(), true);

    let image = RgbImage::from_pixel(16, 16, image::Rgb([0, 0, 0]));
    let items = [OverlayItem {
      rect: PixelRect {
        x: 1.0,
        y: 1.0,
        width: 4.0,
        height: 4.0,
      },
      label: "cat".to_string(),
      score: 0.7,
    }];

    output.render(&image, &items).unwrap();

    let now = Utc::now();
    let day_dir = dir
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    let entries: Vec<_> = std::fs::read_dir(&day_dir).unwrap().collect();
    // 一张 PNG 加一份记录文本
    assert_eq!(entries.len(), 2);
  }

  #[test]
  fn from_url_parses_record_flag() {
    let url = Url::parse("folder:///tmp/snaps?record").unwrap();
    let output = SnapshotDirOutput::from_url(&url).unwrap();
    assert!(output.record);
  }
}
