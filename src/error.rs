use thiserror::Error;

/// Fatal conditions surfaced from a single `step`. None of these are
/// recovered locally; partial writes made before the failure stay visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The byte pattern matched no known opcode family.
    #[error("invalid opcode {0:#04X}")]
    InvalidOpcode(u8),

    /// A memory access ran past the end of the address space.
    #[error("memory access out of range at {0:#06X}")]
    MemoryOutOfRange(u32),

    /// A stage received an operand whose shape does not fit the opcode
    /// family it was dispatched to. Indicates a decode bug upstream.
    #[error("operand shape does not match the opcode family")]
    ParamShapeMismatch,

    /// The invoker was asked to advance an already drained queue.
    #[error("dequeued an empty command queue")]
    QueueUnderflow,
}
