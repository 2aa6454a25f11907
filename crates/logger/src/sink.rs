//! Sink trait

use crate::error::DeliveryError;
use crate::{Level, Record};

/// A destination that receives records from the registry.
///
/// Implementations must tolerate concurrent `deliver` calls from any thread.
/// Errors are reported on stderr by the caller and never reach the code that
/// emitted the record.
pub trait Sink: Send + Sync + 'static {
    /// Deliver one record
    fn deliver(&self, record: &Record) -> Result<(), DeliveryError>;

    /// Push out anything the sink has buffered
    fn flush(&self) -> Result<(), DeliveryError> {
        Ok(())
    }
}

/// Last-resort reporting for a failed delivery.
pub(crate) fn report_delivery_failure(level: Level, err: &DeliveryError) {
    eprintln!("hooklog: failed to deliver {level} record: {err}");
}
