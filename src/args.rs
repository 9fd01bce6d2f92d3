// 该文件是 Kuaimen （快门） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

/// Kuaimen 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型路径
  /// 支持方案:
  /// - replay://path/to/outputs.json 回放引擎
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 相机来源
  /// 支持方案:
  /// - v4l2:///dev/video0（可选 ?front=/dev/video1）
  /// - file:///path/to/still.jpg
  #[arg(long, value_name = "CAMERA")]
  pub camera: Url,

  /// 输出目的地
  /// 支持方案:
  /// - image:///path/to/out.png 单文件
  /// - folder:///path/to/snaps 快照目录（可选 ?record）
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 标签文件路径（每行一个标签）。缺省使用内置 COCO 80 类表
  #[arg(long, value_name = "FILE")]
  pub labels: Option<String>,

  /// 标签字体文件路径。未提供时只画框不写字
  #[arg(long, value_name = "FILE")]
  pub font: Option<String>,

  /// 启动时切换到前置相机
  #[arg(long)]
  pub front: bool,
}
