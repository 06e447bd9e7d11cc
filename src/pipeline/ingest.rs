//! Per-run ingest orchestration
//!
//! One provider is taken from scrape start to terminal run state:
//!
//! 1. A scrape run is opened in the `running` state.
//! 2. The provider produces candidate records (or a hard failure).
//! 3. Each candidate is validated, checked against the duplicate identity,
//!    and persisted if it survives both gates.
//! 4. Pending rows are uploaded in batches and successes flagged.
//! 5. The run is closed exactly once with the authoritative counts, and
//!    provider stats are accumulated.

use crate::pipeline::{IngestTally, RunOutcome};
use crate::provider::{Provider, ScrapeOptions};
use crate::record::{validate, ClassRecord};
use crate::storage::{RunStatus, Store};
use crate::upload::{BackendClient, UploadReport};
use crate::Result;

/// Admits candidate records into the store for the given run.
///
/// Invalid and duplicate candidates are dropped silently; neither is an
/// error, and neither stops the rest of the list. Storage faults are hard
/// failures and propagate.
pub fn ingest_records<S: Store>(
    store: &mut S,
    run_id: i64,
    records: &[ClassRecord],
) -> Result<IngestTally> {
    let mut tally = IngestTally::default();

    for record in records {
        if !validate(record) {
            tracing::debug!(
                "Dropping invalid candidate '{}' from {}",
                record.name,
                record.provider_name
            );
            tally.invalid += 1;
            continue;
        }

        let (provider_record_id, start_time) = record.identity();
        if store.is_duplicate(provider_record_id, start_time)? {
            tracing::debug!("Dropping duplicate candidate '{}'", provider_record_id);
            tally.duplicates += 1;
            continue;
        }

        store.insert_class(run_id, record)?;
        tally.accepted += 1;
    }

    Ok(tally)
}

/// Runs one provider end to end: scrape, ingest, upload, close the run.
///
/// Provider failures never propagate as errors; they are folded into the
/// returned outcome so a multi-provider driver can log and move on. Only
/// storage faults return `Err`.
pub async fn run_provider<S: Store, P: Provider>(
    store: &mut S,
    provider: &P,
    backend: &BackendClient,
    options: &ScrapeOptions,
) -> Result<RunOutcome> {
    let name = provider.name().to_string();
    store.upsert_provider_stats(&name)?;
    let run_id = store.create_run(&name)?;
    tracing::info!("Run {} started for provider {}", run_id, name);

    let output = match provider.scrape(options).await {
        Ok(output) => output,
        Err(e) => {
            let message = e.to_string();
            tracing::error!("Provider {} failed: {}", name, message);
            store.complete_run(run_id, false, 0, 0, Some(&message))?;
            store.update_provider_stats(&name, false, 0)?;
            return Ok(RunOutcome {
                run_id,
                provider_name: name,
                status: RunStatus::Failed,
                tally: IngestTally::default(),
                upload: UploadReport::default(),
                error_text: Some(message),
            });
        }
    };

    // Anything scraped before a mid-run abort is still admitted; there is
    // no partial-run rollback.
    let tally = ingest_records(store, run_id, &output.records)?;
    tracing::info!(
        "Run {}: {} accepted, {} invalid, {} duplicates",
        run_id,
        tally.accepted,
        tally.invalid,
        tally.duplicates
    );

    if let Some(failure) = output.failure {
        tracing::error!("Provider {} aborted mid-scrape: {}", name, failure);
        store.complete_run(run_id, false, tally.accepted, 0, Some(&failure))?;
        store.update_provider_stats(&name, false, tally.accepted)?;
        return Ok(RunOutcome {
            run_id,
            provider_name: name,
            status: RunStatus::Failed,
            tally,
            upload: UploadReport::default(),
            error_text: Some(failure),
        });
    }

    let upload = upload_pending(store, backend, None).await?;

    let error_text = if output.errors.is_empty() {
        None
    } else {
        Some(output.errors.join("; "))
    };

    store.complete_run(
        run_id,
        true,
        tally.accepted,
        upload.uploaded,
        error_text.as_deref(),
    )?;
    store.update_provider_stats(&name, true, tally.accepted)?;

    tracing::info!(
        "Run {} completed: {} uploaded, {} failed upload",
        run_id,
        upload.uploaded,
        upload.failed
    );

    Ok(RunOutcome {
        run_id,
        provider_name: name,
        status: RunStatus::Completed,
        tally,
        upload,
        error_text,
    })
}

/// Uploads rows still flagged as pending and marks the successes.
///
/// Failed batches simply leave their rows pending; a later invocation
/// retries them. Successes are attributed to the head of the pending list:
/// the backend reports only a total count, so when a middle batch fails
/// the flagged rows may not be exactly the ones the backend kept.
pub async fn upload_pending<S: Store>(
    store: &mut S,
    backend: &BackendClient,
    limit: Option<u32>,
) -> Result<UploadReport> {
    let pending = store.unuploaded_classes(limit)?;
    if pending.is_empty() {
        tracing::debug!("No pending rows to upload");
        return Ok(UploadReport::default());
    }

    let records: Vec<ClassRecord> = pending.iter().map(|row| row.record.clone()).collect();
    let report = backend.upload(&records).await;

    let flagged: Vec<i64> = pending
        .iter()
        .take(report.uploaded as usize)
        .map(|row| row.id)
        .collect();
    store.mark_uploaded(&flagged)?;

    Ok(report)
}
