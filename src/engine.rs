// 该文件是 Kuaimen （快门） 项目的一部分。
// src/engine.rs - 推理引擎边界
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

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, model::postprocess::DETECTION_STRIDE};

/// 检测输出张量名称
pub const OUTPUT_TENSOR_NAME: &str = "output0";

/// 引擎输入：单个命名张量
#[derive(Debug, Clone, Copy)]
pub struct TensorInput<'a> {
  pub name: &'a str,
  pub shape: [usize; 2],
  pub data: &'a [u8],
}

/// 引擎输出：按名称索引的浮点张量集合
#[derive(Debug, Clone, Default)]
pub struct EngineOutputs {
  tensors: HashMap<String, Box<[f32]>>,
}

impl EngineOutputs {
  pub fn insert(&mut self, name: impl Into<String>, data: Vec<f32>) {
    self.tensors.insert(name.into(), data.into_boxed_slice());
  }

  pub fn get_f32(&self, name: &str) -> Option<&[f32]> {
    self.tensors.get(name).map(|t| t.as_ref())
  }

  /// 检测输出张量（可能缺失）
  pub fn detection_output(&self) -> Option<&[f32]> {
    self.get_f32(OUTPUT_TENSOR_NAME)
  }
}

/// 推理引擎边界。引擎本身是外部黑盒，本 crate 只约定张量进出。
pub trait InferenceEngine {
  type Error: std::error::Error + Send + Sync + 'static;

  fn infer(&mut self, input: &TensorInput<'_>) -> Result<EngineOutputs, Self::Error>;
}

#[derive(Error, Debug)]
pub enum ReplayEngineError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("模型数据无效: {0}")]
  ModelInvalid(#[from] serde_json::Error),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("输出张量 '{0}' 长度 {1} 不是 {2} 的倍数")]
  InvalidOutputLength(String, usize, usize),
}

/// 回放引擎：从 JSON 文件加载一份录制好的输出张量集合，
/// 每次推理原样返回。用于离线调试与测试。
#[derive(Debug)]
pub struct ReplayEngine {
  outputs: EngineOutputs,
}

#[derive(Debug)]
pub struct ReplayEngineBuilder {
  model_path: String,
}

const REPLAY_SCHEME: &str = "replay";

impl FromUrlWithScheme for ReplayEngineBuilder {
  const SCHEME: &'static str = REPLAY_SCHEME;
}

impl FromUrl for ReplayEngineBuilder {
  type Error = ReplayEngineError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != REPLAY_SCHEME {
      return Err(ReplayEngineError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        REPLAY_SCHEME
      )));
    }

    let path = urlencoding::decode(url.path())
      .map_err(|e| ReplayEngineError::ModelPathError(e.to_string()))?;

    Ok(ReplayEngineBuilder {
      model_path: path.into_owned(),
    })
  }
}

impl ReplayEngineBuilder {
  pub fn from_path(path: impl Into<String>) -> Self {
    ReplayEngineBuilder {
      model_path: path.into(),
    }
  }

  pub fn build(self) -> Result<ReplayEngine, ReplayEngineError> {
    info!("加载回放模型文件: {}", self.model_path);
    let raw = std::fs::read(&self.model_path)?;
    debug!("回放文件大小: {} 字节", raw.len());

    let tensors: HashMap<String, Vec<f32>> = serde_json::from_slice(&raw)?;

    let mut outputs = EngineOutputs::default();
    for (name, data) in tensors {
      if name == OUTPUT_TENSOR_NAME && data.len() % DETECTION_STRIDE != 0 {
        return Err(ReplayEngineError::InvalidOutputLength(
          name,
          data.len(),
          DETECTION_STRIDE,
        ));
      }
      debug!("回放张量 '{}' 长度: {}", name, data.len());
      outputs.insert(name, data);
    }

    info!("回放模型加载完成");
    Ok(ReplayEngine { outputs })
  }
}

#[derive(Error, Debug)]
pub enum ReplayInferError {}

impl InferenceEngine for ReplayEngine {
  type Error = ReplayInferError;

  fn infer(&mut self, input: &TensorInput<'_>) -> Result<EngineOutputs, Self::Error> {
    debug!(
      "回放推理: 输入 '{}' 形状 {:?}, {} 字节",
      input.name,
      input.shape,
      input.data.len()
    );
    Ok(self.outputs.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("kuaimen-engine-{}-{}", std::process::id(), name));
    std::fs::write(&path, contents).unwrap();
    path
  }

  #[test]
  fn replay_engine_returns_recorded_output() {
    let path = temp_file(
      "ok.json",
      r#"{"output0": [0.1, 0.2, 0.3, 0.4, 0.9, 0.0]}"#,
    );
    let mut engine = ReplayEngineBuilder::from_path(path.to_str().unwrap())
      .build()
      .unwrap();

    let input = TensorInput {
      name: "image",
      shape: [1, 4],
      data: &[1, 2, 3, 4],
    };
    let outputs = engine.infer(&input).unwrap();
    assert_eq!(outputs.detection_output().unwrap().len(), 6);
  }

  #[test]
  fn replay_engine_rejects_partial_stride() {
    let path = temp_file("bad-stride.json", r#"{"output0": [0.1, 0.2, 0.3]}"#);
    let err = ReplayEngineBuilder::from_path(path.to_str().unwrap())
      .build()
      .unwrap_err();
    assert!(matches!(err, ReplayEngineError::InvalidOutputLength(_, 3, _)));
  }

  #[test]
  fn replay_engine_rejects_invalid_json() {
    let path = temp_file("bad-json.json", "not json");
    let err = ReplayEngineBuilder::from_path(path.to_str().unwrap())
      .build()
      .unwrap_err();
    assert!(matches!(err, ReplayEngineError::ModelInvalid(_)));
  }

  #[test]
  fn replay_engine_missing_file_is_load_error() {
    let err = ReplayEngineBuilder::from_path("/nonexistent/kuaimen-model.json")
      .build()
      .unwrap_err();
    assert!(matches!(err, ReplayEngineError::ModelLoadError(_)));
  }

  #[test]
  fn builder_rejects_wrong_scheme() {
    let url = Url::parse("file:///tmp/model.json").unwrap();
    let err = ReplayEngineBuilder::from_url(&url).unwrap_err();
    assert!(matches!(err, ReplayEngineError::ModelPathError(_)));
  }

  #[test]
  fn outputs_without_detection_tensor() {
    let path = temp_file("other.json", r#"{"aux": [1.0]}"#);
    let mut engine = ReplayEngineBuilder::from_path(path.to_str().unwrap())
      .build()
      .unwrap();
    let input = TensorInput {
      name: "image",
      shape: [1, 0],
      data: &[],
    };
    let outputs = engine.infer(&input).unwrap();
    assert!(outputs.detection_output().is_none());
    assert!(outputs.get_f32("aux").is_some());
  }
}
