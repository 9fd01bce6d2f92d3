// 该文件是 Kuaimen （快门） 项目的一部分。
// src/output/mod.rs - 叠加层输出模块
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

pub mod draw;
pub mod overlay;
pub mod save_image_file;
pub mod snapshot_dir;

pub use draw::Draw;
pub use overlay::{OverlayItem, PixelRect, Viewport, build_overlay, project_box};
pub use save_image_file::SaveImageFileOutput;
pub use snapshot_dir::SnapshotDirOutput;

use image::RgbImage;

/// 叠加层渲染边界：消费检测叠加项与一帧图像，渲染到某个目的地。
/// 渲染之间不保留状态。
pub trait Render {
  type Error;

  fn render(&self, image: &RgbImage, items: &[OverlayItem]) -> Result<(), Self::Error>;
}
