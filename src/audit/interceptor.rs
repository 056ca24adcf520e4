use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::record::{error_value, panic_value, AuditRecord};
use super::sink::AuditSink;

/// Wraps request-handler calls and ships one audit record per call.
///
/// The wrapped call's outcome is handed back untouched; audit failures stay
/// inside this type.
#[derive(Clone)]
pub struct Auditor {
    sink: Arc<dyn AuditSink>,
    function_name: Arc<str>,
}

impl Auditor {
    pub fn new(sink: Arc<dyn AuditSink>, function_name: impl Into<String>) -> Self {
        Self {
            sink,
            function_name: Arc::from(function_name.into()),
        }
    }

    /// Run `call` and audit it as `target::method(args)`.
    ///
    /// `args` is usually a tuple of the call's arguments and is captured
    /// before the call runs. A panic inside `call` is audited and then resumed.
    pub async fn around<T, E, A, F>(
        &self,
        target: &'static str,
        method: &'static str,
        args: &A,
        call: F,
    ) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize,
        E: std::error::Error,
        F: Future<Output = Result<T, E>>,
    {
        let captured_args = serde_json::to_value(args);

        let outcome = AssertUnwindSafe(call).catch_unwind().await;

        let result = match &outcome {
            Ok(Ok(value)) => serde_json::to_value(value),
            Ok(Err(err)) => Ok(error_value(err)),
            Err(panic) => Ok(panic_value(panic.as_ref())),
        };
        self.dispatch(target, method, captured_args, result);

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    fn dispatch(
        &self,
        target: &str,
        method: &str,
        args: Result<Value, serde_json::Error>,
        result: Result<Value, serde_json::Error>,
    ) {
        let payload = match AuditRecord::capture(target, method, args, result).and_then(|r| r.to_json()) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Error processing audit record for {}::{}: {}", target, method, e);
                return;
            }
        };
        debug!("JSON: {}", payload);

        let sink = self.sink.clone();
        let function_name = self.function_name.clone();
        // One detached task per event, never joined or retried
        let handle = tokio::spawn(async move {
            let _ = sink.invoke(&function_name, payload).await;
        });
        debug!("audit dispatch: {:?}", handle);
    }
}
