//! Error type shared by every layer of the harness.
//!
//! Context, loader and GUI failures are fatal and only ever surface during
//! startup. Framebuffer and shader failures are reported here too, but the
//! callers that hit them at runtime log and carry on.

use std::path::PathBuf;

use crate::lifecycle::LoopState;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("failed to create window or OpenGL context: {0}")]
    ContextCreationFailed(String),

    #[error("failed to load OpenGL functions: {0}")]
    GraphicsLoaderFailed(String),

    #[error("failed to allocate GPU object: {0}")]
    GpuAllocationFailed(String),

    #[error("framebuffer incomplete (status {status:#06x})")]
    FramebufferIncomplete { status: u32 },

    #[error("failed to compile {stage} shader: {log}")]
    ShaderCompileFailed { stage: &'static str, log: String },

    #[error("failed to link shader program: {0}")]
    ShaderLinkFailed(String),

    #[error("failed to read shader source {}: {source}", .path.display())]
    ShaderIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to initialize GUI renderer: {0}")]
    GuiInitFailed(String),

    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    InvalidPixelData { expected: usize, actual: usize },

    #[error("cannot {action} while the render loop is {state:?}")]
    InvalidTransition {
        state: LoopState,
        action: &'static str,
    },

    #[error("invalid config {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    /// Whether the error must abort startup instead of being logged and tolerated.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HarnessError::ContextCreationFailed(_)
                | HarnessError::GraphicsLoaderFailed(_)
                | HarnessError::GuiInitFailed(_)
                | HarnessError::Config { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_failures_are_fatal() {
        assert!(HarnessError::ContextCreationFailed("no display".into()).is_fatal());
        assert!(HarnessError::GraphicsLoaderFailed("glGetString".into()).is_fatal());
        assert!(!HarnessError::FramebufferIncomplete { status: 0x8cd6 }.is_fatal());
        assert!(
            !HarnessError::ShaderCompileFailed {
                stage: "fragment",
                log: "0:1: syntax error".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn messages_name_the_failing_piece() {
        let err = HarnessError::ShaderIo {
            path: PathBuf::from("resources/shaders/quad.frag"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("resources/shaders/quad.frag"));

        let err = HarnessError::FramebufferIncomplete { status: 0x8cd6 };
        assert_eq!(err.to_string(), "framebuffer incomplete (status 0x8cd6)");
    }
}
