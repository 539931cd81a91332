//! 核心编排层：错误、状态、循环监管、持久化、关闭处理、SRDF 主控循环

pub mod error;
pub mod framework;
pub mod persistence;
pub mod shutdown;
pub mod state;
pub mod supervisor;

pub use error::{Result, SrdfError};
pub use framework::{FrameworkHandle, SrdfFramework};
pub use persistence::ProgressFile;
pub use state::{FrameworkPhase, FrameworkStatus};
pub use supervisor::CycleSupervisor;
