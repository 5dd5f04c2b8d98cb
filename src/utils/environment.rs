use crate::error::{BrawlerError, Result};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Утилиты, без которых сессия не запустится
const REQUIRED_TOOLS: [&str; 3] = ["xdotool", "xwininfo", "xprop"];

/// Проверить, что есть X-дисплей и все внешние утилиты
pub fn check_environment(wine_bin: &str) -> Result<()> {
    info!("Проверка окружения...");

    check_display(env::var("DISPLAY").ok())?;

    let path = env::var_os("PATH").unwrap_or_default();
    for tool in REQUIRED_TOOLS.iter().copied().chain(std::iter::once(wine_bin)) {
        match find_executable(tool, &path) {
            Some(found) => debug!("{} найден: {}", tool, found.display()),
            None => {
                return Err(BrawlerError::Environment(format!(
                    "{} не найден в PATH или не исполняемый",
                    tool
                )))
            }
        }
    }

    info!("Проверка окружения завершена успешно");
    Ok(())
}

fn check_display(value: Option<String>) -> Result<()> {
    match value {
        Some(value) if !value.is_empty() => {
            debug!("DISPLAY={}", value);
            Ok(())
        }
        _ => Err(BrawlerError::Environment(
            "переменная DISPLAY не задана, нужен запущенный X.org".to_string(),
        )),
    }
}

/// Имя с `/` проверяется как путь, иначе ищется по каталогам `path`
fn find_executable(program: &str, path: &OsStr) -> Option<PathBuf> {
    if program.contains('/') {
        let candidate = PathBuf::from(program);
        return is_executable(&candidate).then_some(candidate);
    }

    env::split_paths(path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
