use crate::config::GameConfig;
use crate::error::{BrawlerError, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Запуск и завершение экземпляров игры под Wine
///
/// Каждый клиент живёт в своём виртуальном рабочем столе `explorer /desktop=`
/// и в своём WINEPREFIX, имя рабочего стола совпадает с именем клиента.
pub struct ClientLauncher {
    game: GameConfig,
    dry_run: bool,
}

impl ClientLauncher {
    pub fn new(game: GameConfig, dry_run: bool) -> Self {
        Self { game, dry_run }
    }

    /// Шаблон имени окна, в которое уходят клавиши
    pub fn ime_window_pattern(&self) -> String {
        self.game.ime_window_pattern()
    }

    fn desktop_args(&self, name: &str, width: u32, height: u32) -> Vec<String> {
        vec![
            "explorer".to_string(),
            format!("/desktop={},{}x{}", name, width, height),
            self.game.executable.to_string_lossy().into_owned(),
        ]
    }

    /// Запустить клиента, не дожидаясь появления окна
    pub fn open(&self, name: &str, width: u32, height: u32) -> Result<()> {
        let args = self.desktop_args(name, width, height);
        let prefix = self.game.wine_prefix(name);
        info!("{}: запуск ({}x{})", name, width, height);

        if self.dry_run {
            info!(
                "[DRY RUN] WINEPREFIX={} {} {}",
                prefix.display(),
                self.game.wine_bin,
                args.join(" ")
            );
            return Ok(());
        }

        let child = Command::new(&self.game.wine_bin)
            .args(&args)
            .env("WINEPREFIX", &prefix)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                BrawlerError::Internal(format!("{}: не удалось запустить {}: {}", name, self.game.wine_bin, e))
            })?;
        debug!("{}: процесс wine запущен, pid {:?}", name, child.id());

        Ok(())
    }

    /// `kill -TERM <pid>`
    pub async fn terminate(&self, name: &str, pid: u32) -> Result<()> {
        info!("{}: завершение процесса {}", name, pid);
        if self.dry_run {
            info!("[DRY RUN] kill -TERM {}", pid);
            return Ok(());
        }

        let pid = pid.to_string();
        let output = Command::new("kill").args(["-TERM", pid.as_str()]).output().await?;
        if !output.status.success() {
            return Err(BrawlerError::command_failed(format!("kill -TERM {}", pid), &output.stderr));
        }
        Ok(())
    }
}
