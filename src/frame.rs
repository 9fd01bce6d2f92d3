// 该文件是 Kuaimen （快门） 项目的一部分。
// src/frame.rs - 捕获帧预处理
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

use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use thiserror::Error;
use tracing::debug;

use crate::engine::TensorInput;

/// 模型输入尺寸（固定）
pub const MODEL_INPUT_WIDTH: u32 = 640;
pub const MODEL_INPUT_HEIGHT: u32 = 640;

/// 模型输入张量名称
pub const INPUT_TENSOR_NAME: &str = "image";

const JPEG_QUALITY: u8 = 90;

/// 预处理完成的帧：编码后的字节缓冲区，外加批次维度包装
#[derive(Debug, Clone)]
pub struct EncodedFrame {
  data: Box<[u8]>,
}

#[derive(Error, Debug)]
pub enum FramePrepError {
  #[error("图像编码失败: {0}")]
  EncodeError(#[from] image::ImageError),
  #[error("图像编码结果为空")]
  EmptyEncode,
}

impl EncodedFrame {
  pub fn as_bytes(&self) -> &[u8] {
    &self.data
  }

  /// 张量形状 [1, N]，批次维度固定为 1
  pub fn tensor_shape(&self) -> [usize; 2] {
    [1, self.data.len()]
  }

  pub fn as_tensor_input(&self) -> TensorInput<'_> {
    TensorInput {
      name: INPUT_TENSOR_NAME,
      shape: self.tensor_shape(),
      data: &self.data,
    }
  }
}

/// 将捕获的图像缩放到模型输入尺寸并编码。
/// 编码无数据时返回错误，调用方应中止本次检测循环。
pub fn prepare_frame(image: &RgbImage) -> Result<EncodedFrame, FramePrepError> {
  let resized = image::imageops::resize(
    image,
    MODEL_INPUT_WIDTH,
    MODEL_INPUT_HEIGHT,
    FilterType::Triangle,
  );

  let mut data = Vec::new();
  let encoder = JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY);
  resized.write_with_encoder(encoder)?;

  if data.is_empty() {
    return Err(FramePrepError::EmptyEncode);
  }

  debug!("帧预处理完成，编码字节数: {}", data.len());

  Ok(EncodedFrame {
    data: data.into_boxed_slice(),
  })
}
