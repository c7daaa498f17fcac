use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Column names used to pull records out of tabular datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Identifier column (also names the output file).
    pub id: String,
    /// Preferred document link.
    pub primary_link: String,
    /// Link tried when the primary fails.
    pub secondary_link: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            id: "BRnum".to_string(),
            primary_link: "Pdf_URL".to_string(),
            secondary_link: "Report Html Address".to_string(),
        }
    }
}

/// Network and disk parameters for a single fetch attempt (`[fetch]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Client identity sent with every request. Some origins answer 401/403
    /// to non-browser agents.
    pub user_agent: String,
    /// Total time allowed for the HEAD probe.
    pub probe_timeout_secs: u64,
    /// Connect timeout for the GET.
    pub connect_timeout_secs: u64,
    /// The GET is aborted when no data arrives for this long.
    pub transfer_timeout_secs: u64,
    /// Attempts fail with `InsufficientSpace` below this many free bytes.
    pub min_free_bytes: u64,
    /// Skip TLS certificate verification. Many report hosts in the source
    /// datasets serve expired or self-signed certificates.
    pub accept_invalid_certs: bool,
    /// Redirect hops followed before giving up.
    pub max_redirections: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36"
                .to_string(),
            probe_timeout_secs: 30,
            connect_timeout_secs: 30,
            transfer_timeout_secs: 60,
            min_free_bytes: 5 * 1024 * 1024,
            accept_invalid_certs: true,
            max_redirections: 10,
        }
    }
}

impl FetchConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }
}

/// Global configuration loaded from `~/.config/pdfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfetchConfig {
    /// Tabular datasets (CSV or spreadsheet) to read records from.
    pub datasets: Vec<PathBuf>,
    /// Directory receiving `<id>.pdf` artifacts.
    pub output_dir: PathBuf,
    /// CSV status ledger (`id,status,info`).
    pub ledger_path: PathBuf,
    /// Number of concurrent fetch workers.
    pub workers: usize,
    /// Rows pulled from each dataset per pass.
    pub batch_size: usize,
    /// Stop the run after this many successes (bounded / dry runs).
    pub success_cap: Option<usize>,
    /// Capacity of the progress event channel; events beyond it are dropped.
    pub progress_capacity: usize,
    pub columns: ColumnConfig,
    pub fetch: FetchConfig,
}

impl Default for PdfetchConfig {
    fn default() -> Self {
        Self {
            datasets: Vec::new(),
            output_dir: PathBuf::from("data/PDFs"),
            ledger_path: PathBuf::from("data/DownloadedStatus.csv"),
            workers: 3,
            batch_size: 1000,
            success_cap: None,
            progress_capacity: 256,
            columns: ColumnConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pdfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PdfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PdfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file (`--config`).
pub fn load_from_path(path: &Path) -> Result<PdfetchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: PdfetchConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
