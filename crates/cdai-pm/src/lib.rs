mod error;
mod manager;
mod template;

pub use error::PmError;
pub use manager::PromptManager;
pub use template::{DESCRIBE_SCENE, PromptTemplate, RENDER};
