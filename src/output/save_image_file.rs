// 该文件是 Kuaimen （快门） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use std::path::Path;

use image::RgbImage;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::output::draw::Draw;
use crate::output::overlay::OverlayItem;
use crate::output::Render;
use crate::{FromUrl, FromUrlWithScheme};

/// 把叠加后的图像保存为单个文件，方案 `image://`
pub struct SaveImageFileOutput {
  path: String,
  draw: Draw,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    Ok(SaveImageFileOutput {
      path: url.path().to_string(),
      draw: Draw::default(),
    })
  }
}

impl SaveImageFileOutput {
  pub fn new(path: impl Into<String>, draw: Draw) -> Self {
    Self {
      path: path.into(),
      draw,
    }
  }

  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }
}

impl Render for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render(&self, image: &RgbImage, items: &[OverlayItem]) -> Result<(), Self::Error> {
    let mut canvas = image.clone();
    self.draw.draw_overlay(&mut canvas, items);

    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    canvas.save(&self.path)?;
    info!("保存叠加图像到文件: {}", self.path);

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::output::overlay::PixelRect;

  #[test]
  fn renders_and_saves_to_path() {
    let path = std::env::temp_dir().join(format!("kuaimen-save-{}.png", std::process::id()));
    let output = SaveImageFileOutput::new(path.to_str().unwrap(), Draw::default());

    let image = RgbImage::from_pixel(32, 32, image::Rgb([0, 0, 0]));
    let items = [OverlayItem {
      rect: PixelRect {
        x: 4.0,
        y: 4.0,
        width: 8.0,
        height: 8.0,
      },
      label: "person".to_string(),
      score: 0.5,
    }];

    output.render(&image, &items).unwrap();
    assert!(path.exists());
  }

  #[test]
  fn from_url_rejects_wrong_scheme() {
    let url = Url::parse("folder:///tmp/x").unwrap();
    assert!(matches!(
      SaveImageFileOutput::from_url(&url),
      Err(SaveImageFileError::SchemeMismatch(_))
    ));
  }
}
