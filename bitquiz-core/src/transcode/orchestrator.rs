//! Transcode Orchestrator
//!
//! Drives the external engine through the fixed three-variant plan for one
//! input file:
//! 1. Pick a session id (file stem + high-resolution stamp)
//! 2. Write the input into the engine's virtual file system
//! 3. Sequentially, per plan: exec, read back, wrap as a media resource,
//!    register the locator, build the track
//! 4. On any failure, release this run's locators and fail closed
//! 5. On success, return the tracks in shuffled presentation order
//! 6. Always attempt to delete the session's scratch files

use super::plan::TranscodePlan;
use super::{EngineError, EngineStatus, TranscodeEngine};
use crate::asset::InputAsset;
use crate::error::{Error, Result};
use crate::events::{QuizEvent, QuizEventBus};
use crate::ledger::ResourceLedger;
use crate::media::{Locator, MediaHost};
use crate::track_set::{self, QuizTrack, TrackSet};
use bitquiz_common::time;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs conversions against one transcoding engine
pub struct TranscodeOrchestrator {
    engine: Arc<dyn TranscodeEngine>,
    host: Arc<dyn MediaHost>,
    status: EngineStatus,
}

impl TranscodeOrchestrator {
    pub fn new(engine: Arc<dyn TranscodeEngine>, host: Arc<dyn MediaHost>) -> Self {
        let status = if engine.is_ready() {
            EngineStatus::Ready
        } else {
            EngineStatus::Uninitialized
        };
        Self {
            engine,
            host,
            status,
        }
    }

    pub fn status(&self) -> &EngineStatus {
        &self.status
    }

    /// Readiness gate consulted before every conversion
    pub fn is_ready(&self) -> bool {
        self.engine.is_ready()
    }

    /// One-time engine initialization
    ///
    /// Calling again after success is a no-op. After a failure the engine
    /// may be retried.
    pub async fn initialize(&mut self, events: &QuizEventBus) -> Result<()> {
        if self.engine.is_ready() {
            self.status = EngineStatus::Ready;
            return Ok(());
        }

        self.status = EngineStatus::Loading;
        info!("Loading transcoding engine");

        match self.engine.load().await {
            Ok(()) if self.engine.is_ready() => {
                self.status = EngineStatus::Ready;
                info!("Transcoding engine ready");
                events.emit_lossy(QuizEvent::EngineReady {
                    timestamp: time::now(),
                });
                Ok(())
            }
            Ok(()) => {
                let reason = "engine reported success but is not ready".to_string();
                self.fail_init(reason, events)
            }
            Err(e) => self.fail_init(e.to_string(), events),
        }
    }

    fn fail_init(&mut self, reason: String, events: &QuizEventBus) -> Result<()> {
        warn!(error = %reason, "Transcoding engine failed to load");
        self.status = EngineStatus::Failed(reason.clone());
        events.emit_lossy(QuizEvent::EngineFailed {
            error: reason.clone(),
            timestamp: time::now(),
        });
        Err(Error::EngineInit(reason))
    }

    /// Produce the three quiz variants of `asset`
    ///
    /// Fails with `NotReady` or `NoInput` before touching the engine. Any
    /// later failure releases every locator this run registered and returns
    /// `TranscodeFailure`; no partial track set escapes.
    pub async fn convert(
        &self,
        asset: Option<&InputAsset>,
        ledger: &mut ResourceLedger,
        events: &QuizEventBus,
    ) -> Result<TrackSet> {
        if !self.engine.is_ready() {
            return Err(Error::NotReady);
        }
        let asset = asset.ok_or(Error::NoInput)?;

        let session_id = format!("{}_{}", asset.file_stem(), time::session_stamp());
        info!(
            session_id = %session_id,
            asset = %asset.name(),
            bytes = asset.byte_len(),
            mime_type = %asset.mime_type(),
            "Starting conversion"
        );
        events.emit_lossy(QuizEvent::ConversionStarted {
            session_id: session_id.clone(),
            asset_name: asset.name().to_string(),
            timestamp: time::now(),
        });

        let result = self.run_plans(&session_id, asset, ledger, events).await;

        // Best-effort regardless of outcome
        self.cleanup_scratch(&session_id).await;

        match result {
            Ok(set) => {
                info!(
                    session_id = %session_id,
                    tracks = set.len(),
                    "Conversion completed"
                );
                events.emit_lossy(QuizEvent::ConversionCompleted {
                    session_id,
                    track_ids: set.iter().map(|t| t.id().to_string()).collect(),
                    timestamp: time::now(),
                });
                Ok(set)
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Conversion failed");
                events.emit_lossy(QuizEvent::ConversionFailed {
                    session_id,
                    error: e.to_string(),
                    timestamp: time::now(),
                });
                Err(e)
            }
        }
    }

    async fn run_plans(
        &self,
        session_id: &str,
        asset: &InputAsset,
        ledger: &mut ResourceLedger,
        events: &QuizEventBus,
    ) -> Result<TrackSet> {
        let input_name = TranscodePlan::input_name(session_id, asset);
        self.engine
            .write_file(&input_name, asset.bytes())
            .await
            .map_err(|e| transcode_error("writing input", &input_name, e))?;

        let plans = TranscodePlan::all();
        let mut produced: Vec<QuizTrack> = Vec::with_capacity(plans.len());

        // Strictly one engine call at a time
        for plan in plans {
            match self
                .run_plan(&plan, session_id, &input_name, asset, ledger)
                .await
            {
                Ok(track) => {
                    produced.push(track);
                    events.emit_lossy(QuizEvent::VariantEncoded {
                        session_id: session_id.to_string(),
                        completed: produced.len(),
                        total: plans.len(),
                        timestamp: time::now(),
                    });
                }
                Err(e) => {
                    let released = ledger.release(&locators_of(&produced));
                    warn!(
                        session_id = %session_id,
                        quality = %plan.quality,
                        released,
                        "Plan failed, discarded resources from this run"
                    );
                    return Err(e);
                }
            }
        }

        let locators = locators_of(&produced);
        let shuffled = track_set::shuffle(produced, &mut rand::thread_rng());
        match TrackSet::new(session_id, shuffled) {
            Some(set) => Ok(set),
            None => {
                ledger.release(&locators);
                Err(Error::TranscodeFailure(
                    "plan did not yield exactly one track per quality".to_string(),
                ))
            }
        }
    }

    async fn run_plan(
        &self,
        plan: &TranscodePlan,
        session_id: &str,
        input_name: &str,
        asset: &InputAsset,
        ledger: &mut ResourceLedger,
    ) -> Result<QuizTrack> {
        let output_name = plan.output_name(session_id, asset);
        let args = plan.engine_args(input_name, &output_name, asset);

        debug!(
            session_id = %session_id,
            quality = %plan.quality,
            args = ?args,
            "Invoking transcoding engine"
        );
        self.engine
            .exec(&args)
            .await
            .map_err(|e| transcode_error(plan.quality.tag(), &output_name, e))?;

        let bytes = self
            .engine
            .read_file(&output_name)
            .await
            .map_err(|e| transcode_error("reading output", &output_name, e))?;

        let mime_type = plan.output_mime(asset);
        let byte_count = bytes.len();
        let locator = self
            .host
            .create_resource(bytes, &mime_type)
            .map_err(|e| Error::TranscodeFailure(format!("wrapping {}: {}", output_name, e)))?;
        ledger.register(locator.clone());

        debug!(
            session_id = %session_id,
            quality = %plan.quality,
            bytes = byte_count,
            mime_type = %mime_type,
            "Variant ready"
        );

        Ok(QuizTrack::new(
            session_id,
            plan.quality,
            output_name,
            locator,
            mime_type,
        ))
    }

    /// Delete every scratch entry belonging to `session_id`; never fails
    async fn cleanup_scratch(&self, session_id: &str) {
        let prefix = format!("{}_", session_id);
        let names = match self.engine.list_files(&prefix).await {
            Ok(names) => names,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Could not list scratch files for cleanup");
                return;
            }
        };

        for name in names {
            if let Err(e) = self.engine.delete_file(&name).await {
                warn!(session_id = %session_id, file = %name, error = %e, "Scratch file cleanup failed");
            }
        }
    }
}

fn locators_of(tracks: &[QuizTrack]) -> Vec<Locator> {
    tracks.iter().map(|t| t.locator().clone()).collect()
}

fn transcode_error(step: &str, file: &str, source: EngineError) -> Error {
    Error::TranscodeFailure(format!("{} ({}): {}", step, file, source))
}
