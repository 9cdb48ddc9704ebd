use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument, Span};

use crate::config::Config;
use crate::downsample::{DownsampledImage, Downsampler};
use crate::error::ExtractionError;
use crate::extractor::{GeminiExtractor, MetadataExtractor, StockMetadata};
use crate::secrets::Credential;

use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressReporter};
use super::queue::{ItemStatus, QueueItem};
use super::result::{BatchSummary, ResultRecord};

/// Drives a queue through downsampling and extraction, one item at a time.
///
/// Items are processed strictly in order and never concurrently. Every item
/// yields exactly one [`ResultRecord`]; a failing item is recorded and the
/// run moves on.
pub struct BatchOrchestrator {
    downsampler: Downsampler,
    extractor: Arc<dyn MetadataExtractor>,
    strict_metadata: bool,
}

impl BatchOrchestrator {
    /// Production constructor. Builds the Gemini extractor from config.
    pub fn from_config(config: &Config) -> Result<Self, ExtractionError> {
        let extractor = GeminiExtractor::new(&config.extractor)?;
        Ok(
            Self::new(Downsampler::from_config(&config.downsample), Arc::new(extractor))
                .with_strict_metadata(config.extractor.strict_metadata),
        )
    }

    pub fn new(downsampler: Downsampler, extractor: Arc<dyn MetadataExtractor>) -> Self {
        Self {
            downsampler,
            extractor,
            strict_metadata: false,
        }
    }

    /// When set, metadata that breaks the instruction contract fails the
    /// item instead of passing through with a warning.
    pub fn with_strict_metadata(mut self, strict: bool) -> Self {
        self.strict_metadata = strict;
        self
    }

    /// Processes every item of `queue` and returns one record per item, in
    /// queue order. Statuses are reset to `Pending` first, so each call is
    /// an independent run. An empty queue returns immediately without
    /// emitting events.
    pub async fn run(
        &self,
        queue: &mut [QueueItem],
        credential: &Credential,
        progress: &dyn ProgressReporter,
    ) -> Vec<ResultRecord> {
        if queue.is_empty() {
            return Vec::new();
        }

        let total = queue.len();
        let batch_span = info_span!("batch", total);

        async move {
            for item in queue.iter_mut() {
                item.reset();
            }

            info!("Starting batch of {} images", total);
            progress.report(ProgressEvent::run_started(total));

            let mut records = Vec::with_capacity(total);
            for (index, item) in queue.iter_mut().enumerate() {
                let item_span = info_span!("item",
                    item_id = %item.id,
                    filename = %item.filename,
                    mime_type = %item.mime_type,
                    index,
                );
                let record = self
                    .process_item(index, item, credential, progress)
                    .instrument(item_span)
                    .await;
                records.push(record);
            }

            let summary = BatchSummary::from_records(&records);
            info!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                bytes_saved = summary.bytes_saved,
                "Batch finished: {}",
                summary
            );
            progress.report(ProgressEvent::run_finished(summary));

            records
        }
        .instrument(batch_span)
        .await
    }

    async fn process_item(
        &self,
        index: usize,
        item: &mut QueueItem,
        credential: &Credential,
        progress: &dyn ProgressReporter,
    ) -> ResultRecord {
        item.advance(ItemStatus::Processing);
        progress.report(ProgressEvent::item(item, index, "Optimizing & analyzing..."));

        match self.process(item, credential).await {
            Ok((image, metadata)) => {
                item.advance(ItemStatus::Completed);
                progress.report(ProgressEvent::item(item, index, "Ready"));
                ResultRecord::success(item, metadata, &image)
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Item failed: {}", message);
                item.advance(ItemStatus::Error);
                progress.report(ProgressEvent::item_failed(item, index, &message));
                ResultRecord::failure(item, message)
            }
        }
    }

    async fn process(
        &self,
        item: &QueueItem,
        credential: &Credential,
    ) -> Result<(DownsampledImage, StockMetadata), PipelineError> {
        let image = self.step_downsample(item).await?;
        let metadata = self.step_extract(&image, credential).await?;
        Ok((image, metadata))
    }

    async fn step_downsample(&self, item: &QueueItem) -> Result<DownsampledImage, PipelineError> {
        let downsampler = self.downsampler;
        let source = item.source_handle();
        let span = Span::current();

        let image = tokio::task::spawn_blocking(move || {
            span.in_scope(|| downsampler.downsample(&source))
        })
        .await
        .map_err(|e| PipelineError::Aborted(format!("downsampling task failed: {}", e)))??;

        debug!(
            original = %image.original_dimensions,
            resized = %image.dimensions,
            original_bytes = image.original_size_bytes,
            compressed_bytes = image.compressed_size_bytes,
            "Downsampled"
        );
        Ok(image)
    }

    async fn step_extract(
        &self,
        image: &DownsampledImage,
        credential: &Credential,
    ) -> Result<StockMetadata, PipelineError> {
        let extractor = Arc::clone(&self.extractor);
        let credential = credential.clone();
        let payload = image.encoded.clone();

        // A panicking extractor only fails its own item.
        let metadata = tokio::spawn(
            async move { extractor.extract(&credential, &payload).await }
                .instrument(info_span!("extract")),
        )
        .await
        .map_err(|e| match e.try_into_panic() {
            Ok(panic) => PipelineError::from_panic(panic),
            Err(e) => PipelineError::Aborted(format!("extraction task failed: {}", e)),
        })??;

        let issues = metadata.validate();
        if !issues.is_empty() {
            let joined = issues.join("; ");
            if self.strict_metadata {
                return Err(ExtractionError::InvalidMetadata(joined).into());
            }
            warn!(issues = %joined, "Metadata does not follow the instruction contract");
        }

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::progress::NoopProgress;
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 80, 40]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn metadata() -> StockMetadata {
        StockMetadata {
            description: "Brown square".to_string(),
            keywords: "brown, square, color, flat, simple".to_string(),
            categories: "Abstract".to_string(),
            editorial: "no".to_string(),
            mature_content: "no".to_string(),
            illustration: "yes".to_string(),
        }
    }

    fn credential() -> Credential {
        Credential::new("test-key-0123456789").unwrap()
    }

    /// Returns a fixed record, failing or panicking on chosen calls.
    struct ScriptedExtractor {
        calls: AtomicUsize,
        fail_on: Option<usize>,
        panic_on: Option<usize>,
        response: StockMetadata,
    }

    impl ScriptedExtractor {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on: None,
                panic_on: None,
                response: metadata(),
            }
        }
    }

    #[async_trait]
    impl MetadataExtractor for ScriptedExtractor {
        async fn extract(
            &self,
            _credential: &Credential,
            _image: &[u8],
        ) -> Result<StockMetadata, ExtractionError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic_on == Some(call) {
                panic!("extractor blew up");
            }
            if self.fail_on == Some(call) {
                return Err(ExtractionError::EmptyResponse);
            }
            Ok(self.response.clone())
        }
    }

    fn orchestrator(extractor: ScriptedExtractor) -> BatchOrchestrator {
        BatchOrchestrator::new(Downsampler::default(), Arc::new(extractor))
    }

    #[tokio::test]
    async fn test_empty_queue_is_noop() {
        let events = Mutex::new(Vec::new());
        let reporter = |e: ProgressEvent| events.lock().unwrap().push(e);

        let records = orchestrator(ScriptedExtractor::ok())
            .run(&mut [], &credential(), &reporter)
            .await;

        assert!(records.is_empty());
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_items_succeed_in_order() {
        let mut queue = vec![
            QueueItem::new("one.png", "image/png", png(10, 10)),
            QueueItem::new("two.png", "image/png", png(20, 10)),
            QueueItem::new("three.png", "image/png", png(10, 20)),
        ];

        let records = orchestrator(ScriptedExtractor::ok())
            .run(&mut queue, &credential(), &NoopProgress)
            .await;

        let names: Vec<_> = records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["one.png", "two.png", "three.png"]);
        assert!(records.iter().all(|r| r.is_success()));
        assert!(queue.iter().all(|i| i.status() == ItemStatus::Completed));
        assert_eq!(records[0].metadata, metadata());
    }

    #[tokio::test]
    async fn test_extraction_failure_is_isolated() {
        let mut queue: Vec<_> = (0..4)
            .map(|i| QueueItem::new(format!("{}.png", i), "image/png", png(8, 8)))
            .collect();
        let extractor = ScriptedExtractor {
            fail_on: Some(1),
            ..ScriptedExtractor::ok()
        };

        let records = orchestrator(extractor)
            .run(&mut queue, &credential(), &NoopProgress)
            .await;

        assert_eq!(records.len(), 4);
        assert!(records[0].is_success());
        assert!(!records[1].is_success());
        assert_eq!(records[1].error.as_deref(), Some("Empty response from AI"));
        assert_eq!(records[1].metadata, StockMetadata::default());
        assert!(records[2].is_success());
        assert!(records[3].is_success());
        assert_eq!(queue[1].status(), ItemStatus::Error);
    }

    #[tokio::test]
    async fn test_decode_failure_skips_extractor() {
        let extractor = Arc::new(ScriptedExtractor::ok());
        let orchestrator = BatchOrchestrator::new(Downsampler::default(), extractor.clone());
        let mut queue = vec![
            QueueItem::new("corrupt.jpg", "image/jpeg", b"not an image".to_vec()),
            QueueItem::new("ok.png", "image/png", png(4, 4)),
        ];

        let records = orchestrator
            .run(&mut queue, &credential(), &NoopProgress)
            .await;

        assert!(records[0]
            .error
            .as_deref()
            .unwrap()
            .starts_with("Failed to decode image"));
        assert!(records[1].is_success());
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_extractor_panic_is_recorded() {
        let mut queue = vec![
            QueueItem::new("a.png", "image/png", png(4, 4)),
            QueueItem::new("b.png", "image/png", png(4, 4)),
        ];
        let extractor = ScriptedExtractor {
            panic_on: Some(0),
            ..ScriptedExtractor::ok()
        };

        let records = orchestrator(extractor)
            .run(&mut queue, &credential(), &NoopProgress)
            .await;

        assert_eq!(
            records[0].error.as_deref(),
            Some("Processing aborted: extractor blew up")
        );
        assert!(records[1].is_success());
    }

    #[tokio::test]
    async fn test_events_follow_status_order() {
        let events = Mutex::new(Vec::new());
        let reporter = |e: ProgressEvent| events.lock().unwrap().push(e);
        let mut queue = vec![
            QueueItem::new("ok.png", "image/png", png(4, 4)),
            QueueItem::new("bad.png", "image/png", vec![0, 1, 2]),
        ];

        orchestrator(ScriptedExtractor::ok())
            .run(&mut queue, &credential(), &reporter)
            .await;

        let events = events.into_inner().unwrap();
        assert!(matches!(events[0], ProgressEvent::RunStarted { total: 2, .. }));

        let statuses: Vec<(usize, ItemStatus)> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::ItemStatus { index, status, .. } => Some((*index, *status)),
                _ => None,
            })
            .collect();
        assert_eq!(
            statuses,
            vec![
                (0, ItemStatus::Processing),
                (0, ItemStatus::Completed),
                (1, ItemStatus::Processing),
                (1, ItemStatus::Error),
            ]
        );

        match events.last().unwrap() {
            ProgressEvent::RunFinished { summary, .. } => {
                assert_eq!(summary.succeeded, 1);
                assert_eq!(summary.failed, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_run_starts_from_pending() {
        let orchestrator = orchestrator(ScriptedExtractor::ok());
        let mut queue = vec![QueueItem::new("a.png", "image/png", png(4, 4))];

        orchestrator.run(&mut queue, &credential(), &NoopProgress).await;
        assert_eq!(queue[0].status(), ItemStatus::Completed);

        let records = orchestrator.run(&mut queue, &credential(), &NoopProgress).await;
        assert_eq!(records.len(), 1);
        assert!(records[0].is_success());
        assert_eq!(queue[0].status(), ItemStatus::Completed);
    }

    #[tokio::test]
    async fn test_strict_metadata_downgrades_invalid_records() {
        let mut bad = metadata();
        bad.categories = "Landscapes".to_string();

        let lenient = orchestrator(ScriptedExtractor {
            response: bad.clone(),
            ..ScriptedExtractor::ok()
        });
        let mut queue = vec![QueueItem::new("a.png", "image/png", png(4, 4))];
        let records = lenient.run(&mut queue, &credential(), &NoopProgress).await;
        assert!(records[0].is_success());
        assert_eq!(records[0].metadata.categories, "Landscapes");

        let strict = orchestrator(ScriptedExtractor {
            response: bad,
            ..ScriptedExtractor::ok()
        })
        .with_strict_metadata(true);
        let records = strict.run(&mut queue, &credential(), &NoopProgress).await;
        assert!(!records[0].is_success());
        assert!(records[0]
            .error
            .as_deref()
            .unwrap()
            .contains("unknown category 'Landscapes'"));
    }
}
