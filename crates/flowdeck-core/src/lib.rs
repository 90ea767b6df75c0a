pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod result;

pub use config::AppConfig;
pub use context::{RequestContext, Role};
pub use error::FlowdeckError;
pub use result::FlowdeckResult;
