use crate::core::{NamespaceStore, Resolver};
use crate::domain::DomainType;
use crate::utils::error::{CarpeError, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Debug, Clone, Parser)]
#[command(name = "carpe")]
#[command(about = "Inspect namespace manifests and convert domain objects")]
pub struct CliConfig {
    /// 宣告命名空間、領域型別與視圖的 manifest 檔案
    #[arg(long, short, default_value = "carpe.toml")]
    pub manifest: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 以 JSON 輸出命名空間樹
    Tree,
    /// 將模型記錄 (欄位鍵) 轉換為傳輸用 payload
    Encode {
        /// 領域型別的點分路徑，例如 model.blog.Article
        domain: String,
        /// JSON 格式的模型記錄
        json: String,
    },
    /// 將傳輸用 payload 轉換為模型記錄 (欄位鍵)
    Decode {
        domain: String,
        /// JSON 格式的 payload
        json: String,
    },
    /// 對 payload 呼叫產生的 getter，例如 getTitle
    Get {
        domain: String,
        getter: String,
        json: String,
        /// 欄位不存在時回傳的 JSON 值
        #[arg(long)]
        default: Option<String>,
    },
}

impl Command {
    /// 在已載入的 store 上執行指令，回傳要輸出的文字
    pub fn execute(&self, store: &NamespaceStore, resolver: &Resolver) -> Result<String> {
        match self {
            Command::Tree => Ok(serde_json::to_string_pretty(&store.root().describe())?),
            Command::Encode { domain, json } => {
                let object = lookup_domain(resolver, domain)?.from_model(&parse_json(json)?)?;
                Ok(serde_json::to_string(&object)?)
            }
            Command::Decode { domain, json } => {
                let object = lookup_domain(resolver, domain)?.from_payload(&parse_json(json)?)?;
                Ok(serde_json::to_string(&object.to_model())?)
            }
            Command::Get {
                domain,
                getter,
                json,
                default,
            } => {
                let object = lookup_domain(resolver, domain)?.from_payload(&parse_json(json)?)?;
                let default = default.as_deref().map(parse_json).transpose()?;
                match object.call(getter, default)? {
                    Some(value) => Ok(serde_json::to_string(&value)?),
                    None => Ok("undefined".to_string()),
                }
            }
        }
    }
}

fn parse_json(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

fn lookup_domain(resolver: &Resolver, path: &str) -> Result<Rc<DomainType>> {
    resolver
        .resolve_path(path)?
        .as_domain()
        .cloned()
        .ok_or_else(|| CarpeError::UnknownMember {
            name: path.to_string(),
        })
}
