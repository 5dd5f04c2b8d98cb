use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml, Yaml},
    Figment,
};
use crate::services::allow_list::AllowList;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub game: GameConfig,
    #[serde(default)]
    pub duplication: DuplicationConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameConfig {
    pub executable: PathBuf,
    #[serde(default = "default_wine_bin")]
    pub wine_bin: String,
    pub wine_prefix_base: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DuplicationConfig {
    #[serde(default)]
    pub keys_allowed: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub toons: usize,
    pub dual_monitor: bool,
    pub title_bar_height: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub poll_interval_ms: u64,
    pub poll_timeout_ms: u64,
    pub settle_delay_ms: u64,
}

fn default_wine_bin() -> String {
    "wine".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            toons: 4,
            dual_monitor: false,
            title_bar_height: 28,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000,
            poll_timeout_ms: 30000,
            settle_delay_ms: 2000,
        }
    }
}

impl GameConfig {
    /// Имя дочернего IME-окна Wine, в которое уходят клавиши
    pub fn ime_window_pattern(&self) -> String {
        let exe = self
            .executable
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        format!("\"Default IME\": (\"{}\" \"{}\")", exe, exe)
    }

    /// Отдельный WINEPREFIX на каждого клиента
    pub fn wine_prefix(&self, client_name: &str) -> PathBuf {
        self.wine_prefix_base.join(client_name)
    }
}

impl Config {
    pub fn allow_list(&self) -> AllowList {
        AllowList::new(self.duplication.keys_allowed.iter().map(|key| key.trim()))
    }

    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let is_yaml = matches!(
            config_path.extension().and_then(|ext| ext.to_str()),
            Some("yml") | Some("yaml")
        );
        let figment = if is_yaml {
            Figment::new().merge(Yaml::file(config_path))
        } else {
            Figment::new().merge(Toml::file(config_path))
        };

        let config: Config = figment
            .merge(Env::prefixed("BRAWLER_").split("__"))
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        Ok(config)
    }

    /// Аргументы командной строки важнее файла
    pub fn apply_overrides(&mut self, toons: Option<usize>, dual_monitor: bool) -> Result<()> {
        if let Some(toons) = toons {
            self.layout.toons = toons;
        }
        if dual_monitor {
            self.layout.dual_monitor = true;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        // Валидация настроек игры
        if self.game.executable.as_os_str().is_empty() {
            anyhow::bail!("game.executable не задан");
        }
        if self.game.wine_bin.trim().is_empty() {
            anyhow::bail!("game.wine_bin не задан");
        }
        if self.game.wine_prefix_base.as_os_str().is_empty() {
            anyhow::bail!("game.wine_prefix_base не задан");
        }

        // Валидация списка клавиш
        for (i, key) in self.duplication.keys_allowed.iter().enumerate() {
            if key.trim().is_empty() {
                anyhow::bail!("Пустая клавиша в keys_allowed #{}", i + 1);
            }
        }

        // Валидация раскладки окон
        if self.layout.dual_monitor && self.layout.toons < 2 {
            anyhow::bail!("Для режима двух мониторов нужно минимум 2 toon-клиента");
        }

        // Валидация таймингов
        if self.window.poll_interval_ms < 100 {
            anyhow::bail!("poll_interval_ms должно быть минимум 100");
        }
        if self.window.poll_timeout_ms < self.window.poll_interval_ms {
            anyhow::bail!("poll_timeout_ms должно быть не меньше poll_interval_ms");
        }

        Ok(())
    }
}
