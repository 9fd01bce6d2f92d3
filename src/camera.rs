// 该文件是 Kuaimen （快门） 项目的一部分。
// src/camera.rs - 相机边界
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

use std::time::Instant;

use anyhow::{Context, Result, bail};
use image::{ImageReader, RgbImage};
use tracing::{debug, info};
use url::Url;
use v4l::FourCC;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// 相机朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
  #[default]
  Back,
  Front,
}

impl Facing {
  pub fn toggled(self) -> Self {
    match self {
      Facing::Back => Facing::Front,
      Facing::Front => Facing::Back,
    }
  }
}

/// 一次捕获的静态帧
pub struct Still {
  pub image: RgbImage,
  pub facing: Facing,
  pub timestamp_ms: u64,
}

/// 相机边界：捕获一帧静态图像，支持前后朝向切换
pub trait Camera {
  fn capture(&mut self) -> Result<Still>;

  fn facing(&self) -> Facing;

  fn switch_facing(&mut self) -> Result<()>;
}

/// V4L2 相机。每个朝向对应一个设备路径，捕获时临时打开设备、
/// 抓取单帧后立即释放。
pub struct V4l2Camera {
  back_device: Option<String>,
  front_device: Option<String>,
  facing: Facing,
  start_time: Instant,
}

const CAPTURE_WIDTH: u32 = 640;
const CAPTURE_HEIGHT: u32 = 480;

// 抓帧前丢弃的帧数，等待自动曝光稳定
const WARMUP_FRAMES: usize = 3;

impl V4l2Camera {
  pub fn new(back_device: Option<String>, front_device: Option<String>) -> Result<Self> {
    if back_device.is_none() && front_device.is_none() {
      bail!("至少需要配置一个相机设备");
    }

    let facing = if back_device.is_some() {
      Facing::Back
    } else {
      Facing::Front
    };

    Ok(Self {
      back_device,
      front_device,
      facing,
      start_time: Instant::now(),
    })
  }

  fn device_path(&self) -> Result<&str> {
    let path = match self.facing {
      Facing::Back => self.back_device.as_deref(),
      Facing::Front => self.front_device.as_deref(),
    };
    path.with_context(|| format!("朝向 {:?} 未配置相机设备", self.facing))
  }

  fn grab(path: &str) -> Result<RgbImage> {
    debug!("打开相机设备: {}", path);
    let device =
      Device::with_path(path).with_context(|| format!("无法打开设备: {}", path))?;

    let mut format = device.format()?;
    format.width = CAPTURE_WIDTH;
    format.height = CAPTURE_HEIGHT;
    format.fourcc = FourCC::new(b"YUYV");
    let format = device.set_format(&format)?;

    let mut stream =
      Stream::with_buffers(&device, Type::VideoCapture, 4).context("无法创建捕获流")?;

    for _ in 0..WARMUP_FRAMES {
      let _ = stream.next().context("无法捕获帧")?;
    }

    let (buffer, _meta) = stream.next().context("无法捕获帧")?;
    let rgb_data = yuyv_to_rgb(buffer, format.width, format.height);

    RgbImage::from_raw(format.width, format.height, rgb_data)
      .context("无法从捕获数据创建 RGB 图像")
  }
}

impl Camera for V4l2Camera {
  fn capture(&mut self) -> Result<Still> {
    let path = self.device_path()?.to_string();
    let image = Self::grab(&path)?;

    Ok(Still {
      image,
      facing: self.facing,
      timestamp_ms: self.start_time.elapsed().as_millis() as u64,
    })
  }

  fn facing(&self) -> Facing {
    self.facing
  }

  fn switch_facing(&mut self) -> Result<()> {
    let next = self.facing.toggled();
    let available = match next {
      Facing::Back => self.back_device.is_some(),
      Facing::Front => self.front_device.is_some(),
    };
    if !available {
      bail!("朝向 {:?} 未配置相机设备，无法切换", next);
    }
    info!("切换相机朝向: {:?} -> {:?}", self.facing, next);
    self.facing = next;
    Ok(())
  }
}

/// 将 YUYV 格式转换为 RGB
fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Vec<u8> {
  let mut rgb = Vec::with_capacity((width * height * 3) as usize);

  for chunk in yuyv.chunks(4) {
    if chunk.len() < 4 {
      break;
    }

    let y0 = chunk[0] as f32;
    let u = chunk[1] as f32 - 128.0;
    let y1 = chunk[2] as f32;
    let v = chunk[3] as f32 - 128.0;

    for y in [y0, y1] {
      let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
      let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
      let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
      rgb.extend_from_slice(&[r, g, b]);
    }
  }

  rgb
}

/// 图片文件相机：每次捕获重新读取同一文件，用于测试与离线运行。
/// 朝向切换只翻转标志，不影响内容。
pub struct StillImageCamera {
  path: String,
  facing: Facing,
}

impl StillImageCamera {
  pub fn new(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      facing: Facing::default(),
    }
  }
}

impl Camera for StillImageCamera {
  fn capture(&mut self) -> Result<Still> {
    let image = ImageReader::open(&self.path)
      .with_context(|| format!("无法打开图片文件: {}", self.path))?
      .decode()
      .with_context(|| format!("无法解码图片文件: {}", self.path))?
      .to_rgb8();

    Ok(Still {
      image,
      facing: self.facing,
      timestamp_ms: 0,
    })
  }

  fn facing(&self) -> Facing {
    self.facing
  }

  fn switch_facing(&mut self) -> Result<()> {
    self.facing = self.facing.toggled();
    Ok(())
  }
}

/// 根据 URL 方案创建相机。
/// - `v4l2:///dev/video0` 后置设备（`?front=/dev/video1` 可选前置设备）
/// - `file:///path/to/still.jpg` 图片文件相机
pub fn create_camera(url: &Url) -> Result<Box<dyn Camera>> {
  match url.scheme() {
    "v4l2" => {
      let back = urlencoding::decode(url.path())
        .context("相机设备路径解码失败")?
        .into_owned();
      let front = url
        .query_pairs()
        .find(|(k, _)| k == "front")
        .map(|(_, v)| v.into_owned());
      let back = if back.is_empty() { None } else { Some(back) };
      Ok(Box::new(V4l2Camera::new(back, front)?))
    }
    "file" => {
      let path = urlencoding::decode(url.path())
        .context("图片路径解码失败")?
        .into_owned();
      Ok(Box::new(StillImageCamera::new(path)))
    }
    other => bail!("不支持的相机方案: {}", other),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn facing_toggles_both_ways() {
    assert_eq!(Facing::Back.toggled(), Facing::Front);
    assert_eq!(Facing::Front.toggled(), Facing::Back);
  }

  #[test]
  fn still_image_camera_flips_facing_flag() {
    let mut camera = StillImageCamera::new("unused.png");
    assert_eq!(camera.facing(), Facing::Back);
    camera.switch_facing().unwrap();
    assert_eq!(camera.facing(), Facing::Front);
  }

  #[test]
  fn v4l2_camera_requires_a_device() {
    assert!(V4l2Camera::new(None, None).is_err());
  }

  #[test]
  fn v4l2_switch_without_front_device_fails() {
    let mut camera = V4l2Camera::new(Some("/dev/video0".into()), None).unwrap();
    assert_eq!(camera.facing(), Facing::Back);
    assert!(camera.switch_facing().is_err());
    assert_eq!(camera.facing(), Facing::Back);
  }

  #[test]
  fn still_image_camera_reads_file() {
    let path = std::env::temp_dir().join(format!("kuaimen-still-{}.png", std::process::id()));
    let image = RgbImage::from_pixel(4, 4, image::Rgb([255, 0, 0]));
    image.save(&path).unwrap();

    let mut camera = StillImageCamera::new(path.to_str().unwrap());
    let still = camera.capture().unwrap();
    assert_eq!(still.image.dimensions(), (4, 4));
  }
}
