//! Pin orchestrators, one per job type.

mod organization_logo;
mod release_files;

pub use organization_logo::{LogoPinOutcome, OrganizationLogoOrchestrator, StatusSync};
pub use release_files::{
    FileOutcome, FileRole, ManifestOutcome, ManifestSkip, ManifestStep, ReleaseFilesOrchestrator,
    ReleasePinReport,
};

use pinner_core::PinRecordUpdate;
use pinner_indexer::PinRecordStore;

/// Write a status update whose failure must not change the outcome of the caller.
/// Returns whether the indexer accepted it.
pub(crate) async fn update_best_effort(
    store: &dyn PinRecordStore,
    pin_id: &str,
    update: PinRecordUpdate,
) -> bool {
    match store.update_pin_record(pin_id, &update).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                pin_id = %pin_id,
                status = %update.status,
                error = %e,
                "Best-effort pin record update failed"
            );
            false
        }
    }
}
