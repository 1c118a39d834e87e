use crate::core::format::detect_format;
use crate::core::validator::{CatalogValidator, ValidatedImport, ValidatorOptions};
use crate::domain::model::{ImportFile, ImportProgress, ImportSummary};
use crate::domain::ports::{FileSource, ImportGateway};
use crate::utils::error::{ImportError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Fired once when the work it was handed out for is superseded.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

#[derive(Debug)]
struct CancelHandle {
    tx: watch::Sender<bool>,
}

fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn cancelled(mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Handle dropped without cancelling: never fires.
                std::future::pending::<()>().await;
            }
        }
    }
}

#[derive(Debug)]
struct SessionState {
    selected: Option<ImportFile>,
    error: Option<String>,
    progress: ImportProgress,
    generation: u64,
    cancel: CancelHandle,
    token: CancelToken,
}

impl SessionState {
    fn new() -> Self {
        let (cancel, token) = cancel_pair();
        Self {
            selected: None,
            error: None,
            progress: ImportProgress::default(),
            generation: 0,
            cancel,
            token,
        }
    }

    /// Supersedes whatever is in flight and starts from an empty selection.
    fn next_generation(&mut self) -> (u64, CancelToken) {
        self.cancel.cancel();
        let (cancel, token) = cancel_pair();
        self.cancel = cancel;
        self.token = token.clone();
        self.generation += 1;
        self.selected = None;
        self.error = None;
        self.progress = ImportProgress::default();
        (self.generation, token)
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(flag))
            .map_err(|_| ImportError::ImportInProgress)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The import dialog: one selected file, at most one error, at most one submit in flight.
///
/// Every new selection (or [`clear`](Self::clear)) starts a new generation and
/// cancels reads and submits started under the previous one, so their late
/// results never touch the session.
pub struct ImportSession<G: ImportGateway> {
    gateway: G,
    validator: CatalogValidator,
    state: Mutex<SessionState>,
    busy: AtomicBool,
}

impl<G: ImportGateway> ImportSession<G> {
    pub fn new(gateway: G, options: ValidatorOptions) -> Self {
        Self {
            gateway,
            validator: CatalogValidator::new(options),
            state: Mutex::new(SessionState::new()),
            busy: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn selected_file_name(&self) -> Option<String> {
        self.lock().selected.as_ref().map(|f| f.name.clone())
    }

    pub fn selected_file(&self) -> Option<ImportFile> {
        self.lock().selected.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Replaces the selection with the first of `files`; the rest are ignored.
    pub fn select(&self, files: Vec<ImportFile>) -> Result<()> {
        let mut state = self.lock();
        state.next_generation();

        let dropped = files.len().saturating_sub(1);
        let Some(file) = files.into_iter().next() else {
            return Ok(());
        };
        if dropped > 0 {
            tracing::debug!("Ignoring {} extra file(s) after '{}'", dropped, file.name);
        }

        match detect_format(&file) {
            Ok(format) => {
                tracing::info!("Selected '{}' ({:?}, {} bytes)", file.name, format, file.size());
                state.selected = Some(file);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Rejected '{}': {}", file.name, e);
                state.error = Some(e.user_friendly_message());
                Err(e)
            }
        }
    }

    /// Reads the first of `paths` from `source` and selects it.
    ///
    /// Returns [`ImportError::Cancelled`] if another selection happened while reading.
    pub async fn open<S, P>(&self, source: &S, paths: &[P]) -> Result<()>
    where
        S: FileSource,
        P: AsRef<str>,
    {
        let (generation, token) = self.lock().next_generation();
        let Some(path) = paths.first().map(AsRef::as_ref) else {
            return Ok(());
        };

        let read = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("Read of '{}' superseded", path);
                return Err(ImportError::Cancelled);
            }
            read = source.read_file(path) => read,
        };

        let mut state = self.lock();
        if state.generation != generation {
            return Err(ImportError::Cancelled);
        }

        match read.and_then(|file| detect_format(&file).map(|_| file)) {
            Ok(file) => {
                tracing::info!("Opened '{}' ({} bytes)", file.name, file.size());
                state.selected = Some(file);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Could not open '{}': {}", path, e);
                state.error = Some(e.user_friendly_message());
                Err(e)
            }
        }
    }

    /// Validates the selected file without contacting the backend.
    pub fn check(&self) -> Result<ValidatedImport> {
        let mut state = self.lock();
        state.error = None;

        let result = match state.selected.as_ref() {
            Some(file) => self.validator.validate(file),
            None => Err(ImportError::NoFileSelected),
        };
        if let Err(e) = &result {
            state.error = Some(e.user_friendly_message());
        }
        result
    }

    /// Validates the selected file and, if it passes, hands it to the gateway.
    ///
    /// On success the selection is cleared. On a remote rejection the message
    /// is kept as the session error and the file stays selected for a retry;
    /// whatever the gateway created before failing is not created again.
    pub async fn submit(&self) -> Result<ImportSummary> {
        let _flight = InFlight::acquire(&self.busy)?;

        let (file, mut progress, generation, token) = {
            let mut state = self.lock();
            state.error = None;
            match state.selected.clone() {
                Some(file) => (
                    file,
                    state.progress.clone(),
                    state.generation,
                    state.token.clone(),
                ),
                None => {
                    let e = ImportError::NoFileSelected;
                    state.error = Some(e.user_friendly_message());
                    return Err(e);
                }
            }
        };

        let validated = match self.validator.validate(&file) {
            Ok(validated) => validated,
            Err(e) => {
                tracing::warn!("Validation of '{}' failed: {}", file.name, e);
                self.record_failure(generation, &e, None);
                return Err(e);
            }
        };

        tracing::info!(
            "Submitting '{}': {} products, {} rows",
            file.name,
            validated.groups.len(),
            validated.rows.len()
        );

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(ImportError::Cancelled),
            result = self.gateway.import(&file, &validated.groups, &mut progress) => result,
        };

        match outcome {
            Ok(summary) => {
                let mut state = self.lock();
                if state.generation == generation {
                    state.next_generation();
                } else {
                    tracing::debug!("Import of '{}' finished after a newer selection", file.name);
                }
                tracing::info!(
                    "Import of '{}' done: {} products, {} variants created, {} variants updated",
                    file.name,
                    summary.products_created,
                    summary.variants_created,
                    summary.updated_variants
                );
                Ok(summary)
            }
            Err(ImportError::Cancelled) => {
                tracing::info!("Import of '{}' cancelled", file.name);
                Err(ImportError::Cancelled)
            }
            Err(e) => {
                tracing::error!("Import of '{}' failed: {}", file.name, e);
                if !progress.is_empty() {
                    tracing::warn!(
                        "Kept {} products, {} variants from '{}' for the retry",
                        progress.totals().products_created,
                        progress.totals().variants_created,
                        file.name
                    );
                }
                self.record_failure(generation, &e, Some(progress));
                Err(e)
            }
        }
    }

    /// Closes the dialog: cancels in-flight work and forgets the selection.
    pub fn clear(&self) {
        self.lock().next_generation();
    }

    fn record_failure(&self, generation: u64, error: &ImportError, progress: Option<ImportProgress>) {
        let mut state = self.lock();
        if state.generation == generation {
            state.error = Some(error.user_friendly_message());
            if let Some(progress) = progress {
                state.progress = progress;
            }
        }
    }
}
