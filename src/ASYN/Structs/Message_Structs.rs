// Value types that cross the kernel boundary inside a slot.

use std::fmt;

use crate::ASYN::error::{AsynError, AsynResult};

/// Size of the message body that follows `m_source` and `m_type`.
pub const MSG_PAYLOAD: usize = 56;

/// A process or service address in the kernel's endpoint space.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint(pub i32);

impl Endpoint {
    /// Wildcard source for receives.
    pub const ANY: Endpoint = Endpoint(0x7ace);
    /// No endpoint at all.
    pub const NONE: Endpoint = Endpoint(0x6ace);
    /// The calling process.
    pub const SELF: Endpoint = Endpoint(0x8ace);

    pub const fn as_raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Endpoint::ANY => f.write_str("ANY"),
            Endpoint::NONE => f.write_str("NONE"),
            Endpoint::SELF => f.write_str("SELF"),
            Endpoint(raw) => write!(f, "ep{raw}"),
        }
    }
}

/// The fixed 64-byte message envelope.
///
/// ABI-stable: `m_source` at 0, `m_type` at 4, payload at 8, 16-byte aligned.
/// `m_source` is filled in by the kernel on delivery; senders leave it alone.
#[repr(C, align(16))]
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Message {
    pub m_source: Endpoint,
    pub m_type: i32,
    pub payload: [u8; MSG_PAYLOAD],
}

impl Message {
    /// Build a message, zero-padding `payload` to the envelope size.
    pub fn new(m_type: i32, payload: &[u8]) -> AsynResult<Self> {
        if payload.len() > MSG_PAYLOAD {
            return Err(AsynError::PayloadTooLarge {
                len: payload.len(),
                max: MSG_PAYLOAD,
            });
        }
        let mut msg = Message {
            m_type,
            ..Message::default()
        };
        msg.payload[..payload.len()].copy_from_slice(payload);
        Ok(msg)
    }

    /// A message with only a type code.
    pub const fn with_type(m_type: i32) -> Self {
        Message {
            m_source: Endpoint(0),
            m_type,
            payload: [0; MSG_PAYLOAD],
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Message::with_type(0)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_message(self, f)
    }
}

/// A kernel status or per-message delivery result. Zero is success.
#[repr(transparent)]
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    pub const OK: ErrorCode = ErrorCode(0);
    pub const EFAULT: ErrorCode = ErrorCode(-14);
    pub const EINVAL: ErrorCode = ErrorCode(-22);
    pub const ENOSYS: ErrorCode = ErrorCode(-78);
    /// Send would deadlock.
    pub const ELOCKED: ErrorCode = ErrorCode(-101);
    /// No permission to talk to the destination.
    pub const ECALLDENIED: ErrorCode = ErrorCode(-104);
    /// Source or destination is not alive.
    pub const EDEADSRCDST: ErrorCode = ErrorCode(-105);
    /// Source or destination is not ready.
    pub const ENOTREADY: ErrorCode = ErrorCode(-106);
    /// Destination cannot handle the request.
    pub const EBADREQUEST: ErrorCode = ErrorCode(-107);

    #[inline]
    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    pub const fn as_raw(self) -> i32 {
        self.0
    }

    /// Symbolic name for the codes this crate knows about.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            ErrorCode::OK => "OK",
            ErrorCode::EFAULT => "EFAULT",
            ErrorCode::EINVAL => "EINVAL",
            ErrorCode::ENOSYS => "ENOSYS",
            ErrorCode::ELOCKED => "ELOCKED",
            ErrorCode::ECALLDENIED => "ECALLDENIED",
            ErrorCode::EDEADSRCDST => "EDEADSRCDST",
            ErrorCode::ENOTREADY => "ENOTREADY",
            ErrorCode::EBADREQUEST => "EBADREQUEST",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "error {}", self.0),
        }
    }
}

impl fmt::Debug for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A delivery failure handed back by `poll_error`. Not stored anywhere; polling again
/// rescans the table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ErrorRecord {
    pub dst: Endpoint,
    pub msg: Message,
    pub result: ErrorCode,
}
