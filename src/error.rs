use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrawlerError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Не удалось подключиться к X-серверу: {0}")]
    X11Connect(#[from] x11rb::errors::ConnectError),

    #[error("Ошибка соединения с X-сервером: {0}")]
    X11Connection(#[from] x11rb::errors::ConnectionError),

    #[error("Ошибка ответа X-сервера: {0}")]
    X11Reply(#[from] x11rb::errors::ReplyError),

    #[error("Ошибка ответа X-сервера: {0}")]
    X11ReplyOrId(#[from] x11rb::errors::ReplyOrIdError),

    #[error("Расширение X11 недоступно: {0}")]
    ExtensionMissing(String),

    #[error("Команда `{command}` завершилась с ошибкой: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Окно не найдено: {0}")]
    WindowNotFound(String),

    #[error("Окружение не готово: {0}")]
    Environment(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl BrawlerError {
    pub fn window_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(BrawlerError::WindowNotFound(msg.into()))
    }

    pub fn command_failed(command: impl Into<String>, stderr: &[u8]) -> Self {
        BrawlerError::CommandFailed {
            command: command.into(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BrawlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_trims_stderr() {
        let err = BrawlerError::command_failed("xdotool key", b"  no such window\n");
        match err {
            BrawlerError::CommandFailed { command, stderr } => {
                assert_eq!(command, "xdotool key");
                assert_eq!(stderr, "no such window");
            }
            other => panic!("неожиданная ошибка: {other:?}"),
        }
    }

    #[test]
    fn test_window_not_found_helper() {
        let result: Result<()> = BrawlerError::window_not_found("client_1");
        assert!(matches!(result, Err(BrawlerError::WindowNotFound(name)) if name == "client_1"));
    }
}
