// 该文件是 Kuaimen （快门） 项目的一部分。
// src/bin/preview.rs - 连续预览叠加
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

use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::{info, warn};
use url::Url;

use kuaimen::FromUrl;
use kuaimen::camera::create_camera;
use kuaimen::engine::ReplayEngineBuilder;
use kuaimen::labels::LabelTable;
use kuaimen::output::{Render, SnapshotDirOutput, Viewport, build_overlay};
use kuaimen::session::{CycleOutcome, DetectSession};

/// Kuaimen 连续预览参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型路径（replay:// 方案）
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 相机来源（v4l2:// 或 file:// 方案）
  #[arg(long, value_name = "CAMERA")]
  pub camera: Url,

  /// 快照目录（folder:// 方案）
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 标签文件路径，缺省使用内置 COCO 80 类表
  #[arg(long, value_name = "FILE")]
  pub labels: Option<String>,

  /// 预览帧数（0 表示无限制）
  #[arg(long, default_value = "0", value_name = "COUNT")]
  pub max_frames: u64,

  /// 帧间隔（毫秒）
  #[arg(long, default_value = "200", value_name = "MS")]
  pub interval_ms: u64,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  let labels = match &args.labels {
    Some(path) => LabelTable::from_file(path)?,
    None => LabelTable::coco(),
  };

  let mut session = DetectSession::new(labels);
  let mut engine = match ReplayEngineBuilder::from_url(&args.model).and_then(|b| b.build()) {
    Ok(engine) => {
      session.model_loaded();
      engine
    }
    Err(e) => {
      session.model_failed(format!("{}", e));
      bail!("模型加载失败: {}", e);
    }
  };

  let mut camera = create_camera(&args.camera)?;
  let output = SnapshotDirOutput::from_url(&args.output)?;

  let (tx, rx) = std::sync::mpsc::channel();

  ctrlc::set_handler(move || {
    info!("收到中断信号，准备退出...");
    let _ = tx.send(());
    thread::spawn(|| {
      thread::sleep(Duration::from_secs(30));
      warn!("强制退出程序");
      std::process::exit(1);
    });
  })
  .expect("Error setting Ctrl-C handler");

  info!("开始预览...");
  let mut frame_index = 0u64;

  loop {
    frame_index += 1;
    info!("处理第 {} 帧", frame_index);

    let outcome = session.run_cycle(camera.as_mut(), &mut engine)?;
    match outcome {
      CycleOutcome::Completed(count) => {
        info!("第 {} 帧检测到 {} 个对象", frame_index, count);
      }
      CycleOutcome::Aborted => {
        warn!("第 {} 帧中止: {}", frame_index, session.banner().unwrap_or("?"));
      }
      CycleOutcome::Busy | CycleOutcome::NotReady => {
        warn!("检测请求被拒绝: {:?}", outcome);
      }
    }

    // 叠加层每次渲染都重新计算，渲染之间不保留状态
    if let Some(image) = session.last_capture() {
      let viewport = Viewport::new(image.width() as f32, image.height() as f32);
      let items = build_overlay(session.detections(), session.labels(), viewport);
      output.render(image, &items)?;
    }

    if args.max_frames > 0 && frame_index >= args.max_frames {
      info!("达到指定帧数 {}, 退出预览循环", frame_index);
      break;
    }
    if rx.try_recv().is_ok() {
      warn!("中断信号接收，退出预览循环");
      break;
    }

    thread::sleep(Duration::from_millis(args.interval_ms));
  }

  info!("预览结束，共处理 {} 帧", frame_index);
  Ok(())
}
