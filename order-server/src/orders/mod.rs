//! Order domain
//!
//! - [`workflow`] - checkout: number, pricing, invoice
//! - [`status`] - transition table and actor permissions
//! - [`reconciler`] - gateway payment confirmations
//! - [`task_queue`] / [`task_worker`] - durable background side effects
//! - [`sweep`] - cleanup of orders that never got an invoice

pub mod error;
pub mod money;
pub mod numbering;
pub mod reconciler;
pub mod status;
pub mod sweep;
pub mod task_queue;
pub mod task_worker;
pub mod workflow;

pub use error::{OrderError, OrderResult};
pub use reconciler::{ReconcileOutcome, reconcile_invoice};
pub use status::{Actor, Transition};
pub use task_queue::{OrderTask, TaskQueue};
pub use task_worker::TaskWorker;
pub use workflow::{Buyer, CheckoutSettings, OrderWorkflow};
