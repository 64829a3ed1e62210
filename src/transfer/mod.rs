//! Transfer orchestration: the burn → attest → mint pipeline.

mod orchestrator;
mod request;

pub use orchestrator::{
    BurnMessage, TransferFailure, TransferOrchestrator, TransferReceipts, TransferStage,
};
pub use request::TransferRequest;
