pub mod allow_list;
pub mod client_launcher;
pub mod client_registry;
pub mod dispatcher;
pub mod duplicator;
pub mod event_tap;
pub mod key_decoder;
pub mod key_sender;
pub mod layout;
pub mod screen;
pub mod session;
pub mod window_manager;

pub use client_launcher::ClientLauncher;
pub use duplicator::Duplicator;
pub use event_tap::create_event_tap_factory;
pub use key_sender::create_key_sender;
pub use layout::LayoutPlan;
pub use screen::ScreenInfo;
pub use session::Session;
pub use window_manager::create_window_manager;
