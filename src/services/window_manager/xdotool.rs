use crate::debug_if_enabled;
use crate::error::{BrawlerError, Result};
use crate::events::WindowId;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

use super::r#trait::WindowManager;

/// Значение _MOTIF_WM_HINTS: flags = decorations, decorations = 0
const MOTIF_NO_DECORATIONS: &str = "0x2, 0x0, 0x0, 0x0, 0x0";

/// Управление окнами через xdotool, xwininfo и xprop
pub struct XdotoolWindowManager;

impl XdotoolWindowManager {
    pub fn new() -> Self {
        Self
    }

    async fn output(program: &str, args: &[&str]) -> Result<Output> {
        debug_if_enabled!("{} {}", program, args.join(" "));
        let output = Command::new(program).args(args).output().await.map_err(|e| {
            debug!("{} не найден или не запускается: {}", program, e);
            BrawlerError::Io(e)
        })?;
        Ok(output)
    }

    /// Запуск команды, для которой важен только код возврата
    async fn run(program: &str, args: &[&str]) -> Result<()> {
        let output = Self::output(program, args).await?;
        if !output.status.success() {
            return Err(BrawlerError::command_failed(
                format!("{} {}", program, args.join(" ")),
                &output.stderr,
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl WindowManager for XdotoolWindowManager {
    async fn search_by_name(&self, name: &str) -> Result<Option<WindowId>> {
        debug!("Поиск окна по имени: {}", name);
        let output = Self::output("xdotool", &["search", "--name", name]).await?;

        // xdotool возвращает 1, если ничего не нашлось
        if !output.status.success() && output.stdout.is_empty() {
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_search_output(&stdout))
    }

    async fn find_child(&self, parent: WindowId, pattern: &str) -> Result<Option<WindowId>> {
        debug!("Поиск дочернего окна {} у {}", pattern, parent);
        let parent = parent.to_string();
        let output = Self::output("xwininfo", &["-children", "-id", parent.as_str()]).await?;

        if !output.status.success() {
            return Err(BrawlerError::command_failed(
                format!("xwininfo -children -id {}", parent),
                &output.stderr,
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_child_window(&stdout, pattern))
    }

    async fn resize(&self, window: WindowId, width: u32, height: u32) -> Result<()> {
        debug!("Размер окна {}: {}x{}", window, width, height);
        let (window, width, height) = (window.to_string(), width.to_string(), height.to_string());
        Self::run("xdotool", &["windowsize", window.as_str(), width.as_str(), height.as_str()]).await
    }

    async fn move_to(&self, window: WindowId, x: i32, y: i32) -> Result<()> {
        debug!("Перемещение окна {} в {},{}", window, x, y);
        let (window, x, y) = (window.to_string(), x.to_string(), y.to_string());
        Self::run("xdotool", &["windowmove", window.as_str(), x.as_str(), y.as_str()]).await
    }

    async fn undecorate(&self, window: WindowId) -> Result<()> {
        debug!("Снятие декораций с окна {}", window);
        let window = window.to_string();
        Self::run(
            "xprop",
            &[
                "-id",
                window.as_str(),
                "-f",
                "_MOTIF_WM_HINTS",
                "32c",
                "-set",
                "_MOTIF_WM_HINTS",
                MOTIF_NO_DECORATIONS,
            ],
        )
        .await
    }

    async fn window_pid(&self, window: WindowId) -> Result<Option<u32>> {
        let window = window.to_string();
        let output = Self::output("xprop", &["-id", window.as_str(), "_NET_WM_PID"]).await?;
        if !output.status.success() {
            return Err(BrawlerError::command_failed(
                format!("xprop -id {} _NET_WM_PID", window),
                &output.stderr,
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_window_pid(&stdout))
    }
}

/// Вывод `xdotool search`: по одному десятичному id в строке
pub fn parse_search_output(stdout: &str) -> Option<WindowId> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse().ok())
}

/// Вывод `xwininfo -children`: первая строка с `pattern`, id - первый токен
pub fn parse_child_window(stdout: &str, pattern: &str) -> Option<WindowId> {
    stdout
        .lines()
        .filter(|line| line.contains(pattern))
        .find_map(|line| line.split_whitespace().next()?.parse().ok())
}

/// Вывод `xprop _NET_WM_PID`: `_NET_WM_PID(CARDINAL) = 1234`
pub fn parse_window_pid(stdout: &str) -> Option<u32> {
    let mut tokens = stdout.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(_), Some("="), Some(pid)) => pid.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XWININFO_CHILDREN: &str = r#"
xwininfo: Window id: 0x5e00001 "client_1 - Wine desktop"

  Root window id: 0x1d8 (the root window) (has no name)
  Parent window id: 0x1d8 (the root window) (has no name)
     3 children:
     0x5e00012 "Game": ("game.exe" "game.exe")  1024x768+0+0  +0+0
     0x5e00009 "Default IME": ("game.exe" "game.exe")  1x1+-100+-100  +-100+-100
     0x5e00004 (has no name): ()  1x1+-1+-1  +-1+-1
"#;

    #[test]
    fn test_parse_search_output() {
        assert_eq!(parse_search_output("62914561\n62914565\n"), Some(WindowId(62914561)));
        assert_eq!(parse_search_output("\n  \n"), None);
        assert_eq!(parse_search_output("Defaulting to search window name\n"), None);
    }

    #[test]
    fn test_parse_child_window_picks_ime() {
        let pattern = r#""Default IME": ("game.exe" "game.exe")"#;
        assert_eq!(
            parse_child_window(XWININFO_CHILDREN, pattern),
            Some(WindowId(0x5e00009))
        );
        assert_eq!(parse_child_window(XWININFO_CHILDREN, "other.exe"), None);
    }

    #[test]
    fn test_parse_window_pid() {
        assert_eq!(parse_window_pid("_NET_WM_PID(CARDINAL) = 31337\n"), Some(31337));
        assert_eq!(parse_window_pid("_NET_WM_PID:  not found.\n"), None);
        assert_eq!(parse_window_pid(""), None);
    }
}
