pub mod protocol;
pub mod registry;
pub mod resource_registry;
pub mod resources;
mod server;
pub mod standard_tool;
pub mod tool_handlers;

pub use protocol::*;
pub use registry::{ToolRegistry, create_default_registry};
pub use resource_registry::{ResourceRegistry, create_default_resource_registry};
pub use server::{MAX_CONCURRENT_REQUESTS, McpServer};
