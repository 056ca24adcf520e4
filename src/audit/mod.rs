// Audit side channel: every request-handler call is captured, serialized and
// shipped to a remote function without waiting for the outcome.

pub mod interceptor;
pub mod record;
pub mod sink;

pub use interceptor::Auditor;
pub use record::AuditRecord;
pub use sink::{AuditError, AuditSink, HttpFunctionSink, LogSink};
