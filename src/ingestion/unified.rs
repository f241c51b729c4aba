//! Unified ingestion entrypoints.
//!
//! Most callers build a [`Loader`] around a [`Fetcher`] and call [`Loader::load`], which:
//!
//! - classifies the locator by extension (or uses [`LoaderOptions::format`] when set)
//! - fetches the bytes and routes them to the CSV/JSON/text/audio/image/raw path
//! - reports success/failure/alerts to an [`IngestionObserver`], if configured
//! - settles exactly once, through the optional [`Callback`] and the returned future

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{IngestionError, IngestionResult};
use crate::processing::pixels::{extract_features, FeatureMode};
use crate::types::DataContainer;

use super::adapters::AdapterRegistry;
use super::audio::{channels_to_container, AudioDecoder};
use super::csv::{parse_csv_slice, CsvOptions};
use super::delivery::{deliver, Callback, Completion, Deferred};
use super::format::{IngestionPath, Source, SourceDescriptor, SourceFormat};
use super::image::ImageDecoder;
use super::json::parse_json_str;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::source::{Fetcher, LocalSource};
use super::text::{raw_container, text_container};

/// Options controlling loader behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct LoaderOptions {
    /// If `None`, detect the format from the locator's extension.
    pub format: Option<SourceFormat>,
    /// Feature derived from images when the call site does not pick one.
    pub image_mode: FeatureMode,
    /// CSV-specific options.
    pub csv: CsvOptions,
    /// JSON dialect adapters, tried before generic transposition.
    pub adapters: AdapterRegistry,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for LoaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderOptions")
            .field("format", &self.format)
            .field("image_mode", &self.image_mode)
            .field("csv", &self.csv)
            .field("adapters", &self.adapters)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            format: None,
            image_mode: FeatureMode::default(),
            csv: CsvOptions::default(),
            adapters: AdapterRegistry::with_defaults(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// One routed ingestion request.
struct Request {
    descriptor: SourceDescriptor,
    path: IngestionPath,
    image_mode: FeatureMode,
}

/// Ingestion facade: owns the transport/decoder collaborators and the options.
///
/// Cloning is cheap; every returned future owns its own clone, so it is `'static`.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use datatree_ingest::ingestion::{FileFetcher, Loader};
///
/// # fn main() -> Result<(), datatree_ingest::IngestionError> {
/// let loader = Loader::new(Arc::new(FileFetcher::new()));
/// let table = futures::executor::block_on(loader.load("people.csv", None))?;
/// for column in table.children() {
///     println!("{:?}: {} values", column.label(), column.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Loader {
    fetcher: Arc<dyn Fetcher>,
    audio: Option<Arc<dyn AudioDecoder>>,
    image: Option<Arc<dyn ImageDecoder>>,
    options: LoaderOptions,
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("audio_decoder", &self.audio.is_some())
            .field("image_decoder", &self.image.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl Loader {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            audio: None,
            image: None,
            options: LoaderOptions::default(),
        }
    }

    pub fn with_audio_decoder(mut self, decoder: Arc<dyn AudioDecoder>) -> Self {
        self.audio = Some(decoder);
        self
    }

    pub fn with_image_decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.image = Some(decoder);
        self
    }

    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Fetch `locator` and ingest it along the path its extension selects.
    pub fn load(&self, locator: &str, callback: Option<Callback>) -> Completion {
        let descriptor = SourceDescriptor::remote(locator).with_format(self.options.format);
        self.run(self.request(descriptor, None), callback)
    }

    /// Ingest an already-resident source. Only `.json`/`.csv` names are parsed; anything else
    /// takes the raw path.
    pub fn load_local(&self, source: LocalSource, callback: Option<Callback>) -> Completion {
        let descriptor = SourceDescriptor::local(source).with_format(self.options.format);
        self.run(self.request(descriptor, None), callback)
    }

    /// Fetch `locator` and ingest it as JSON regardless of its extension.
    pub fn web(&self, locator: &str, callback: Option<Callback>) -> Completion {
        let descriptor = SourceDescriptor::remote(locator);
        self.run(self.request(descriptor, Some(IngestionPath::Json)), callback)
    }

    /// Fetch `locator` as CSV. The returned [`Deferred`] exposes the target container up front.
    ///
    /// The target is populated only when the returned [`Deferred`] is driven to completion; if it
    /// is never awaited, the target stays empty.
    pub fn csv(&self, locator: &str, callback: Option<Callback>) -> Deferred {
        let descriptor = SourceDescriptor::remote(locator);
        self.run_deferred(self.request(descriptor, Some(IngestionPath::Csv)), callback)
    }

    /// Fetch `locator` as text. Binary content fails with a type mismatch.
    ///
    /// As with [`Loader::csv`], the target is populated only when the returned [`Deferred`] is
    /// driven to completion.
    pub fn text(&self, locator: &str, callback: Option<Callback>) -> Deferred {
        let descriptor = SourceDescriptor::remote(locator);
        self.run_deferred(self.request(descriptor, Some(IngestionPath::Text)), callback)
    }

    /// Fetch and decode an image, then derive `mode` (or [`LoaderOptions::image_mode`]).
    pub fn image(&self, locator: &str, mode: Option<FeatureMode>, callback: Option<Callback>) -> Completion {
        let descriptor = SourceDescriptor::remote(locator);
        self.run(self.image_request(descriptor, mode), callback)
    }

    /// Decode an already-resident image, then derive `mode`.
    pub fn image_local(&self, source: LocalSource, mode: Option<FeatureMode>, callback: Option<Callback>) -> Completion {
        let format = SourceFormat::from_locator(&source.name);
        let descriptor = SourceDescriptor::local(source).with_format(Some(format));
        self.run(self.image_request(descriptor, mode), callback)
    }

    /// Fetch and decode an audio file into one leaf per channel.
    pub fn audio(&self, locator: &str, callback: Option<Callback>) -> Completion {
        let descriptor = SourceDescriptor::remote(locator);
        self.run(self.request(descriptor, Some(IngestionPath::Audio)), callback)
    }

    /// Decode an already-resident audio file into one leaf per channel.
    pub fn audio_local(&self, source: LocalSource, callback: Option<Callback>) -> Completion {
        let format = SourceFormat::from_locator(&source.name);
        let descriptor = SourceDescriptor::local(source).with_format(Some(format));
        self.run(self.request(descriptor, Some(IngestionPath::Audio)), callback)
    }

    fn request(&self, descriptor: SourceDescriptor, forced: Option<IngestionPath>) -> Request {
        Request {
            path: forced.unwrap_or_else(|| descriptor.path()),
            descriptor,
            image_mode: self.options.image_mode,
        }
    }

    fn image_request(&self, descriptor: SourceDescriptor, mode: Option<FeatureMode>) -> Request {
        let mut request = self.request(descriptor, Some(IngestionPath::Image));
        if let Some(mode) = mode {
            request.image_mode = mode;
        }
        request
    }

    fn context(request: &Request) -> IngestionContext {
        IngestionContext {
            locator: request.descriptor.locator().to_string(),
            path: request.path,
        }
    }

    fn run(&self, request: Request, callback: Option<Callback>) -> Completion {
        let loader = self.clone();
        let ctx = Self::context(&request);
        deliver(
            async move {
                let result = loader.ingest(request).await;
                loader.report(&ctx, &result);
                result
            },
            callback,
        )
    }

    fn run_deferred(&self, request: Request, callback: Option<Callback>) -> Deferred {
        let target = DataContainer::new();
        let loader = self.clone();
        let ctx = Self::context(&request);
        let populated = target.clone();
        let completion = deliver(
            async move {
                let result = loader
                    .ingest(request)
                    .await
                    .map(|parsed| populated.adopt(&parsed).clone());
                loader.report(&ctx, &result);
                result
            },
            callback,
        );
        Deferred::new(target, completion)
    }

    async fn ingest(&self, request: Request) -> IngestionResult<DataContainer> {
        let Request {
            descriptor,
            path,
            image_mode,
        } = request;
        let SourceDescriptor { source, format } = descriptor;
        let (locator, bytes) = match source {
            Source::Remote(locator) => {
                let bytes = self.fetcher.fetch(&locator).await?;
                (locator, bytes)
            }
            Source::Local(LocalSource { name, bytes }) => (name, bytes),
        };
        debug!(locator = %locator, ?format, ?path, bytes = bytes.len(), "dispatching source");
        self.parse(&locator, format, path, bytes, image_mode)
    }

    fn parse(
        &self,
        locator: &str,
        format: SourceFormat,
        path: IngestionPath,
        bytes: Vec<u8>,
        image_mode: FeatureMode,
    ) -> IngestionResult<DataContainer> {
        match path {
            IngestionPath::Csv => parse_csv_slice(&bytes, &self.options.csv),
            IngestionPath::Json => {
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| IngestionError::json(format!("json input is not utf-8: {e}")))?;
                let value = parse_json_str(text)?;
                self.options.adapters.transpose(locator, &value)
            }
            IngestionPath::Text => text_container(bytes),
            IngestionPath::Audio => {
                let decoder = self
                    .audio
                    .as_ref()
                    .ok_or_else(|| IngestionError::unavailable("audio decoder"))?;
                Ok(channels_to_container(&decoder.decode(&bytes, format)?))
            }
            IngestionPath::Image => {
                let decoder = self
                    .image
                    .as_ref()
                    .ok_or_else(|| IngestionError::unavailable("image decoder"))?;
                Ok(extract_features(&decoder.decode(&bytes, format)?, image_mode))
            }
            IngestionPath::Raw => Ok(raw_container(bytes)),
        }
    }

    fn report(&self, ctx: &IngestionContext, result: &IngestionResult<DataContainer>) {
        let Some(obs) = self.options.observer.as_ref() else {
            return;
        };
        match result {
            Ok(container) => obs.on_success(ctx, IngestionStats::of(container)),
            Err(e) => {
                let sev = IngestionSeverity::for_error(e);
                obs.on_failure(ctx, sev, e);
                if sev >= self.options.alert_at_or_above {
                    obs.on_alert(ctx, sev, e);
                }
            }
        }
    }
}
