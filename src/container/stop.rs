//! Stop block: the zero-length stream terminator.

/// Sentinel closing a container. Carries no payload; any payload byte is a
/// grammar violation handled by the frame parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopBlock;
