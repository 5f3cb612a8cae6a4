use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aliasdi - 别名注册表检查工具
#[derive(Parser, Debug)]
#[command(name = "aliasdi")]
#[command(about = "Inspect and verify alias registry configuration")]
pub struct Args {
    /// 配置文件路径（默认 ./aliasdi.toml 或 $ALIASDI_CONFIG）
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// 覆盖源文件根目录
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// 子命令
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 列出所有别名及其规范化设置
    List {
        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },
    /// 检查别名：源文件存在且定义了对应的类
    Check {
        /// 要检查的别名（默认全部）
        aliases: Vec<String>,
    },
}
