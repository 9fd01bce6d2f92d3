// 该文件是 Kuaimen （快门） 项目的一部分。
// src/main.rs - 单次捕获检测主程序
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

mod args;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;

use kuaimen::FromUrl;
use kuaimen::camera::create_camera;
use kuaimen::engine::ReplayEngineBuilder;
use kuaimen::labels::LabelTable;
use kuaimen::output::{
  Draw, Render, SaveImageFileOutput, SnapshotDirOutput, Viewport, build_overlay,
};
use kuaimen::session::{CycleOutcome, DetectSession};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型路径: {}", args.model);
  info!("相机来源: {}", args.camera);
  info!("输出目的地: {}", args.output);

  let labels = match &args.labels {
    Some(path) => LabelTable::from_file(path)?,
    None => LabelTable::coco(),
  };
  info!("标签表共 {} 类", labels.len());

  let mut session = DetectSession::new(labels);

  let engine = ReplayEngineBuilder::from_url(&args.model)
    .map_err(anyhow::Error::from)
    .and_then(|builder| builder.build().map_err(anyhow::Error::from));
  let mut engine = match engine {
    Ok(engine) => {
      session.model_loaded();
      engine
    }
    Err(e) => {
      session.model_failed(format!("{}", e));
      bail!("模型加载失败，检测功能不可用: {}", e);
    }
  };

  let mut camera = create_camera(&args.camera)?;
  if args.front {
    camera.switch_facing()?;
  }
  info!("相机朝向: {:?}", camera.facing());

  let outcome = session.run_cycle(camera.as_mut(), &mut engine)?;
  match outcome {
    CycleOutcome::Completed(count) => {
      println!("检测完成，共 {} 个对象", count);
      for det in session.detections().items.iter() {
        println!(
          "  - {}: {:.2}% at [{:.3}, {:.3}, {:.3}, {:.3}]",
          session.labels().get(det.class_id).unwrap_or("?"),
          det.score * 100.0,
          det.bbox[0],
          det.bbox[1],
          det.bbox[2],
          det.bbox[3]
        );
      }
    }
    CycleOutcome::Aborted => {
      println!("检测中止: {}", session.banner().unwrap_or("未知原因"));
      return Ok(());
    }
    CycleOutcome::Busy | CycleOutcome::NotReady => {
      bail!("检测请求被拒绝: {:?}", outcome);
    }
  }

  let image = session
    .last_capture()
    .context("没有可渲染的捕获图像")?;
  let viewport = Viewport::new(image.width() as f32, image.height() as f32);
  let items = build_overlay(session.detections(), session.labels(), viewport);

  let draw = match &args.font {
    Some(path) => Draw::with_font_path(path)?,
    None => Draw::default(),
  };

  match args.output.scheme() {
    "image" => {
      let output = SaveImageFileOutput::from_url(&args.output)?.with_draw(draw);
      output.render(image, &items)?;
    }
    "folder" => {
      let output = SnapshotDirOutput::from_url(&args.output)?.with_draw(draw);
      output.render(image, &items)?;
    }
    other => bail!("不支持的输出方案: {}", other),
  }

  println!("叠加图像已输出: {}", args.output);

  Ok(())
}
