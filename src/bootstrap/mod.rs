//! Process bootstrap: configuration, tracing and dependency wiring.
//! 启动流程：配置、日志、依赖装配。

pub mod config;
pub mod tracing;
pub mod wiring;

pub use config::load_config;
pub use self::tracing::init_tracing_subscriber;
pub use wiring::{wire_dependencies, PasteeDeps};
