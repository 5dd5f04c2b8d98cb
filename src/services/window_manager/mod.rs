//! WindowManager: управление окнами клиентов через внешние X11 утилиты
//!
//! Поиск окон по имени, поиск дочернего IME-окна, размер, положение,
//! снятие декораций и PID владельца. Никакой логики рассылки клавиш здесь нет.

mod dry_run;
mod xdotool;
mod r#trait;

pub use self::r#trait::{create_window_manager, WindowManager};
