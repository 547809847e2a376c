pub mod backend;
pub mod load_config;
pub mod logging;
pub mod provider;

pub use backend::ReqwestBackend;
pub use load_config::load_config;
pub use provider::Provider;
