//! sqdec-cli - SQ/QS 矩阵环绕声解码命令行工具
//!
//! 读取 SQ 或 QS 编码的立体声 WAV, 输出四声道 (默认前/后两个立体声文件) 或 5.1.

mod logging;
mod output;

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use log::{error, info};

use sqdec_core::MatrixFormat;
use sqdec_matrix::{DEFAULT_LFE_CUTOFF_HZ, DecodeConfig, LfeShaping, MatrixDecoder};
use sqdec_wav::WavReader;

use output::OutputMode;

#[derive(Parser, Debug)]
#[command(name = "sqdec-cli", version, about = "SQ/QS 矩阵四声道 / 5.1 解码工具")]
struct Cli {
    /// 输入立体声 WAV 文件 (16 位 PCM), 使用 --input <路径>
    #[arg(long)]
    input: Option<String>,

    /// 输出格式: 4.0 或 5.1 (不指定时输出前/后两个立体声文件)
    #[arg(long = "audioformat")]
    audio_format: Option<String>,

    /// 矩阵格式: SQ 或 QS
    #[arg(long = "matrixformat", default_value = "SQ")]
    matrix_format: String,

    /// LFE 整形方式: exp (连续指数衰减) 或 rect (截止频率以上清零)
    #[arg(long = "lfe-filter", default_value = "exp")]
    lfe_filter: String,

    /// LFE 截止频率 (Hz)
    #[arg(long = "lfe-cutoff", default_value_t = DEFAULT_LFE_CUTOFF_HZ)]
    lfe_cutoff: f64,

    /// 输出目录
    #[arg(long = "output-dir", default_value = ".")]
    output_dir: PathBuf,

    /// 关闭逐声道并行变换
    #[arg(long = "no-parallel")]
    no_parallel: bool,

    /// 以 JSON 打印生效的解码配置后退出
    #[arg(long = "dump-config")]
    dump_config: bool,

    /// 日志级别 (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        OutputMode::from_arg(self.audio_format.as_deref())
    }

    fn decode_config(&self) -> DecodeConfig {
        DecodeConfig::default()
            .with_matrix_format(MatrixFormat::from_name_lossy(&self.matrix_format))
            .with_output_layout(self.output_mode().layout())
            .with_lfe_shaping(LfeShaping::from_name_lossy(&self.lfe_filter))
            .with_lfe_cutoff(self.lfe_cutoff)
            .with_parallel(!self.no_parallel)
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init("sqdec-cli", cli.verbose) {
        eprintln!("警告: 日志初始化失败: {e:#}");
    }

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        eprintln!("错误: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let decoder = MatrixDecoder::new(cli.decode_config());

    if cli.dump_config {
        let json = serde_json::to_string_pretty(decoder.config()).context("序列化配置失败")?;
        println!("{json}");
        return Ok(());
    }

    let Some(input) = cli.input.as_deref() else {
        println!("必须指定输入 WAV 文件 (--input <路径>).");
        println!();
        Cli::command().print_help()?;
        return Ok(());
    };

    let mode = cli.output_mode();
    info!(
        "开始解码: 输入={}, 矩阵={}, 输出={}",
        input,
        decoder.config().matrix_format,
        mode
    );

    let reader = WavReader::open(input).with_context(|| format!("打开 {input} 失败"))?;
    info!(
        "输入: {} Hz, 声明 {} 帧, 时长 {:.2} 秒",
        reader.info().sample_rate,
        reader.info().frames(),
        reader.info().duration().unwrap_or(0.0),
    );
    let samples = reader
        .read_stereo()
        .with_context(|| format!("读取 {input} 失败"))?;
    info!("读取完成: {} 帧", samples.len());

    let decoded = decoder
        .decode(&samples.left, &samples.right, samples.sample_rate)
        .context("矩阵解码失败")?;

    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("创建输出目录 {} 失败", cli.output_dir.display()))?;
    let files = output::plan(mode, input, &cli.output_dir);
    let written = output::write_all(&decoded, &files)?;

    for path in &written {
        println!("{}", path.display());
    }
    info!("解码完成, 共写出 {} 个文件", written.len());
    Ok(())
}
