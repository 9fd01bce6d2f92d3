// 该文件是 Kuaimen （快门） 项目的一部分。
// src/session.rs - 检测会话状态机
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

use anyhow::Result;
use tracing::{debug, info, warn};

use image::RgbImage;

use crate::camera::{Camera, Still};
use crate::engine::InferenceEngine;
use crate::frame::prepare_frame;
use crate::labels::LabelTable;
use crate::model::{DetectResult, decode_detections};

/// 会话的粗粒度状态。`Detecting` 即互斥闩：
/// 新的检测请求只在 `Ready` 时被接受。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// 模型加载中
  ModelLoading,
  /// 空闲，可接受检测请求
  Ready,
  /// 检测循环进行中
  Detecting,
  /// 模型加载失败，检测能力永久不可用
  LoadFailed,
}

/// 一次检测请求的结局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
  /// 循环完成，记录了若干条检测
  Completed(usize),
  /// 已有循环在进行，本次请求被忽略
  Busy,
  /// 模型未就绪（加载中或加载失败）
  NotReady,
  /// 循环中止，先前的检测保持不变，横幅已更新
  Aborted,
}

/// 检测会话：持有检测列表、横幅与状态，
/// 所有可变状态只在循环边界上更新。
pub struct DetectSession {
  phase: Phase,
  labels: LabelTable,
  detections: DetectResult,
  capture: Option<RgbImage>,
  banner: Option<String>,
}

impl DetectSession {
  pub fn new(labels: LabelTable) -> Self {
    Self {
      phase: Phase::ModelLoading,
      labels,
      detections: DetectResult::default(),
      capture: None,
      banner: None,
    }
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn labels(&self) -> &LabelTable {
    &self.labels
  }

  /// 当前检测列表，直到下一次循环完成前保持不变
  pub fn detections(&self) -> &DetectResult {
    &self.detections
  }

  /// 临时错误横幅，进入下一次循环时清除
  pub fn banner(&self) -> Option<&str> {
    self.banner.as_deref()
  }

  /// 最近一次成功循环捕获的图像，供叠加层渲染
  pub fn last_capture(&self) -> Option<&RgbImage> {
    self.capture.as_ref()
  }

  /// 模型加载完成，进入就绪状态
  pub fn model_loaded(&mut self) {
    debug_assert_eq!(self.phase, Phase::ModelLoading);
    info!("模型加载完成，会话就绪");
    self.phase = Phase::Ready;
  }

  /// 模型加载失败：检测能力永久不可用
  pub fn model_failed(&mut self, message: impl Into<String>) {
    let message = message.into();
    warn!("模型加载失败: {}", message);
    self.banner = Some(message);
    self.phase = Phase::LoadFailed;
  }

  /// 检测循环的唯一入口。仅在 `Ready` 时进入 `Detecting` 并返回 true；
  /// 其余状态下请求被忽略。
  pub fn begin_cycle(&mut self) -> bool {
    match self.phase {
      Phase::Ready => {
        self.banner = None;
        self.phase = Phase::Detecting;
        true
      }
      Phase::Detecting => {
        debug!("检测循环进行中，忽略新的检测请求");
        false
      }
      Phase::ModelLoading | Phase::LoadFailed => {
        debug!("模型未就绪（{:?}），忽略检测请求", self.phase);
        false
      }
    }
  }

  /// 循环完成：替换检测列表与展示图像，回到就绪状态
  pub fn complete_cycle(&mut self, still: Still, result: DetectResult) {
    debug_assert_eq!(self.phase, Phase::Detecting);
    info!("检测循环完成，共 {} 条检测", result.len());
    self.detections = result;
    self.capture = Some(still.image);
    self.phase = Phase::Ready;
  }

  /// 循环中止：设置横幅，保留先前的检测，回到就绪状态。
  /// 不自动重试，由用户重新触发。
  pub fn abort_cycle(&mut self, message: impl Into<String>) {
    debug_assert_eq!(self.phase, Phase::Detecting);
    let message = message.into();
    warn!("检测循环中止: {}", message);
    self.banner = Some(message);
    self.phase = Phase::Ready;
  }

  /// 执行一次完整的检测循环：捕获 → 预处理 → 推理 → 解码 → 记录。
  /// 可恢复的失败（捕获、编码、推理、结果缺失）中止循环并设置横幅。
  pub fn run_cycle<C, E>(&mut self, camera: &mut C, engine: &mut E) -> Result<CycleOutcome>
  where
    C: Camera + ?Sized,
    E: InferenceEngine,
  {
    match self.phase {
      Phase::ModelLoading | Phase::LoadFailed => return Ok(CycleOutcome::NotReady),
      Phase::Detecting => return Ok(CycleOutcome::Busy),
      Phase::Ready => {}
    }

    let entered = self.begin_cycle();
    debug_assert!(entered);

    let still = match camera.capture() {
      Ok(still) => still,
      Err(e) => {
        self.abort_cycle(format!("捕获失败: {}", e));
        return Ok(CycleOutcome::Aborted);
      }
    };

    let frame = match prepare_frame(&still.image) {
      Ok(frame) => frame,
      Err(e) => {
        self.abort_cycle(format!("图像预处理失败: {}", e));
        return Ok(CycleOutcome::Aborted);
      }
    };

    let outputs = match engine.infer(&frame.as_tensor_input()) {
      Ok(outputs) => outputs,
      Err(e) => {
        self.abort_cycle(format!("推理失败: {}", e));
        return Ok(CycleOutcome::Aborted);
      }
    };

    let result = match decode_detections(outputs.detection_output(), &self.labels) {
      Ok(result) => result,
      Err(e) => {
        self.abort_cycle(format!("{}", e));
        return Ok(CycleOutcome::Aborted);
      }
    };

    let count = result.len();
    self.complete_cycle(still, result);
    Ok(CycleOutcome::Completed(count))
  }
}
