// ==========================================
// 学位市场饱和度分析 - 命令行主入口
// ==========================================
// 输出: 查询结果以 JSON 写到 stdout，日志写到 stderr
// ==========================================

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use degree_saturation::app::{get_default_db_path, AppState};
use degree_saturation::importer::DatasetFiles;
use degree_saturation::logging;

#[derive(Parser, Debug)]
#[command(name = "degree-saturation", version, about = "学位市场饱和度分析")]
struct Cli {
    /// SQLite 数据库路径（缺省: DEGREE_SATURATION_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    json_log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 导入源数据（整体替换已有数据集）
    Import {
        #[arg(long)]
        degrees: PathBuf,
        #[arg(long)]
        jobs: PathBuf,
        #[arg(long)]
        crosswalk: PathBuf,
        #[arg(long)]
        employment: Option<PathBuf>,
    },
    /// 单个学位某年的饱和度
    Saturation {
        #[arg(long)]
        degree: String,
        #[arg(long)]
        year: i32,
    },
    /// 某年全部学位按饱和度升序
    Rank {
        #[arg(long)]
        year: i32,
        /// 写出 CSV 而非 JSON
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// 替代学位推荐
    Alternatives {
        #[arg(long)]
        degree: String,
        #[arg(long)]
        year: i32,
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// 学位市场展望（饱和度标签 + 景气判定）
    Outlook {
        #[arg(long)]
        degree: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        base_year: Option<i32>,
    },
    /// 毕业生供给线性预测
    Forecast {
        #[arg(long)]
        degree: String,
        #[arg(long)]
        from_year: Option<i32>,
        #[arg(long)]
        years: Option<i32>,
    },
    /// 导入历史
    Batches {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.json_log {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!(
        "{} v{} 启动",
        degree_saturation::APP_NAME,
        degree_saturation::VERSION
    );

    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).context("无法初始化AppState")?;

    match cli.command {
        Command::Import {
            degrees,
            jobs,
            crosswalk,
            employment,
        } => {
            let files = DatasetFiles {
                degrees,
                jobs,
                crosswalk,
                employment,
            };
            print_json(&state.import_api.import_dataset(&files)?)
        }
        Command::Saturation { degree, year } => {
            print_json(&state.saturation_api.compute_saturation(&degree, year)?)
        }
        Command::Rank { year, csv: Some(out) } => {
            let file = File::create(&out)
                .with_context(|| format!("无法创建文件 {}", out.display()))?;
            let rows = state.saturation_api.export_rank_csv(year, file)?;
            tracing::info!(rows, path = %out.display(), "排名 CSV 已写出");
            Ok(())
        }
        Command::Rank { year, csv: None } => {
            print_json(&state.saturation_api.rank_degrees(year)?)
        }
        Command::Alternatives { degree, year, k } => print_json(
            &state
                .saturation_api
                .find_alternatives_scored(&degree, year, k)?,
        ),
        Command::Outlook {
            degree,
            year,
            base_year,
        } => print_json(
            &state
                .saturation_api
                .degree_outlook(&degree, year, base_year)?,
        ),
        Command::Forecast {
            degree,
            from_year,
            years,
        } => print_json(
            &state
                .saturation_api
                .forecast_supply(&degree, from_year, years)?,
        ),
        Command::Batches { limit } => print_json(&state.import_api.list_batches(limit)?),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
