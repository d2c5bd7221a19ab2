/*!
 * Monitoring
 * Structured logging setup for processes that embed completion signals
 */

mod tracer;

pub use tracer::{init_tracing, try_init_tracing, ENV_TRACE_JSON};
