//! The drawing session: user-editable state, background selection and the save
//! pipeline.

use crate::notify::{Notification, Notifier, VALIDATION_MESSAGE};
use galaxypaint_core::brush::{BrushColor, ColorParseError};
use galaxypaint_core::collection::{CHOOSE_PLACEHOLDER, DocumentEntry, DocumentSource};
use galaxypaint_core::sink::{PersistenceSink, SaveOutcome};
use galaxypaint_core::surface::DrawingSurface;
use galaxypaint_core::transport::TransportError;
use galaxypaint_render::{CompositingExporter, ExportError, decode_image};
use image::RgbaImage;
use kurbo::Point;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use thiserror::Error;

/// Why a save request was turned down before reaching the sink.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("{}", VALIDATION_MESSAGE)]
    EmptyName,
    #[error("A save is already in progress")]
    Busy,
    #[error("Nothing to save: {0}")]
    Compositing(#[from] ExportError),
}

/// Whether the controller is waiting on a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Interactive,
    Saving,
}

/// Result of `select_background`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundSelection {
    /// The new background is installed.
    Applied,
    /// Placeholder or unknown id; nothing changed.
    Ignored,
    /// A later selection or a clear happened while this one was loading.
    Superseded,
    /// Fetch or decode failed; the previous background stays.
    Failed(String),
}

/// The document currently shown behind the drawing, with its decoded pixels.
#[derive(Debug, Clone)]
pub struct BackgroundSource {
    pub entry: DocumentEntry,
    pub image: Rc<RgbaImage>,
}

struct Session {
    brush_color: BrushColor,
    hide_grid: bool,
    name: String,
    background: Option<BackgroundSource>,
    documents: Vec<DocumentEntry>,
}

/// Marks the controller busy for as long as it lives.
struct BusyGuard<'a>(&'a Cell<bool>);

impl<'a> BusyGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Owns the drawing session and drives saves through the configured sink.
///
/// Everything runs on one thread; methods take `&self` so a pending save or
/// background fetch can overlap with further user input.
pub struct AppController<S: DrawingSurface> {
    surface: RefCell<S>,
    exporter: CompositingExporter,
    sink: Rc<dyn PersistenceSink>,
    documents: Option<Rc<dyn DocumentSource>>,
    notifier: Rc<dyn Notifier>,
    session: RefCell<Session>,
    saving: Cell<bool>,
    selection_ticket: Cell<u64>,
}

impl<S: DrawingSurface> AppController<S> {
    pub fn new(mut surface: S, sink: Rc<dyn PersistenceSink>, notifier: Rc<dyn Notifier>) -> Self {
        let session = Session {
            brush_color: BrushColor::BLACK,
            hide_grid: true,
            name: String::new(),
            background: None,
            documents: Vec::new(),
        };
        surface.set_brush_color(session.brush_color);
        surface.set_hide_grid(session.hide_grid);

        Self {
            surface: RefCell::new(surface),
            exporter: CompositingExporter::new(),
            sink,
            documents: None,
            notifier,
            session: RefCell::new(session),
            saving: Cell::new(false),
            selection_ticket: Cell::new(0),
        }
    }

    /// Offer backgrounds from `source`.
    pub fn with_documents(mut self, source: Rc<dyn DocumentSource>) -> Self {
        self.documents = Some(source);
        self
    }

    pub fn state(&self) -> ControllerState {
        if self.saving.get() {
            ControllerState::Saving
        } else {
            ControllerState::Interactive
        }
    }

    pub fn is_saving(&self) -> bool {
        self.saving.get()
    }

    // --- Brush and grid ---

    pub fn brush_color(&self) -> BrushColor {
        self.session.borrow().brush_color
    }

    pub fn set_brush(&self, color: BrushColor) {
        self.session.borrow_mut().brush_color = color;
        self.surface.borrow_mut().set_brush_color(color);
    }

    /// Set the brush from a hex string; invalid input leaves the brush as is.
    pub fn set_brush_color(&self, hex: &str) -> Result<(), ColorParseError> {
        let color = BrushColor::parse(hex)?;
        self.set_brush(color);
        Ok(())
    }

    /// The surface's fixed brush radius in pixels.
    pub fn brush_radius(&self) -> f64 {
        self.surface.borrow().brush_radius()
    }

    pub fn hide_grid(&self) -> bool {
        self.session.borrow().hide_grid
    }

    pub fn set_hide_grid(&self, hide: bool) {
        self.session.borrow_mut().hide_grid = hide;
        self.surface.borrow_mut().set_hide_grid(hide);
    }

    /// Flip grid visibility and return the new `hide_grid` value.
    pub fn toggle_grid(&self) -> bool {
        let hide = !self.hide_grid();
        self.set_hide_grid(hide);
        hide
    }

    // --- Document name ---

    pub fn name(&self) -> String {
        self.session.borrow().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.session.borrow_mut().name = name.into();
    }

    // --- Strokes ---

    pub fn begin_stroke(&self, point: Point) {
        self.surface.borrow_mut().begin_stroke(point);
    }

    pub fn extend_stroke(&self, point: Point) {
        self.surface.borrow_mut().extend_stroke(point);
    }

    pub fn end_stroke(&self) {
        self.surface.borrow_mut().end_stroke();
    }

    /// Record a whole stroke at once.
    pub fn draw_stroke(&self, points: &[Point]) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        let mut surface = self.surface.borrow_mut();
        surface.begin_stroke(*first);
        for point in rest {
            surface.extend_stroke(*point);
        }
        surface.end_stroke();
    }

    pub fn undo(&self) -> bool {
        self.surface.borrow_mut().undo()
    }

    /// Empty the canvas and drop the background.
    ///
    /// A background still loading is discarded when it arrives.
    pub fn clear(&self) {
        self.surface.borrow_mut().clear();
        self.session.borrow_mut().background = None;
        self.selection_ticket.set(self.selection_ticket.get() + 1);
    }

    /// Run `f` with read access to the surface.
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.surface.borrow())
    }

    // --- Backgrounds ---

    /// Documents from the last refresh.
    pub fn documents(&self) -> Vec<DocumentEntry> {
        self.session.borrow().documents.clone()
    }

    pub fn background(&self) -> Option<DocumentEntry> {
        self.session.borrow().background.as_ref().map(|bg| bg.entry.clone())
    }

    /// Shared handle to the active background's pixels.
    pub fn background_image(&self) -> Option<Rc<RgbaImage>> {
        self.session.borrow().background.as_ref().map(|bg| bg.image.clone())
    }

    /// Reload the list of documents offered as backgrounds.
    pub async fn refresh_documents(&self) -> Result<Vec<DocumentEntry>, TransportError> {
        let Some(source) = self.documents.clone() else {
            return Ok(Vec::new());
        };
        match source.list().await {
            Ok(documents) => {
                log::info!("{} documents available as backgrounds", documents.len());
                self.session.borrow_mut().documents = documents.clone();
                Ok(documents)
            }
            Err(e) => {
                log::error!("Listing documents failed: {}", e);
                self.notifier
                    .notify(Notification::danger(format!("Could not load documents: {}", e)));
                Err(e)
            }
        }
    }

    /// Fetch document `id` and show it behind the drawing.
    ///
    /// The previous background stays until the new one is decoded. On success
    /// the document name becomes `"<title>-rev"`.
    pub async fn select_background(&self, id: &str) -> BackgroundSelection {
        if id == CHOOSE_PLACEHOLDER {
            return BackgroundSelection::Ignored;
        }
        let Some(source) = self.documents.clone() else {
            log::warn!("No document source configured; ignoring background {}", id);
            return BackgroundSelection::Ignored;
        };
        let entry = self.session.borrow().documents.iter().find(|doc| doc.id == id).cloned();
        let Some(entry) = entry else {
            log::warn!("Unknown document {}", id);
            return BackgroundSelection::Ignored;
        };

        let ticket = self.selection_ticket.get() + 1;
        self.selection_ticket.set(ticket);

        let loaded = match source.fetch_content(&entry).await {
            Ok(bytes) => decode_image(&bytes).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        if self.selection_ticket.get() != ticket {
            log::info!("Background {} superseded before it loaded", entry.title);
            return BackgroundSelection::Superseded;
        }

        match loaded {
            Ok(image) => {
                log::info!("Background set to {} ({}x{})", entry.title, image.width(), image.height());
                let mut session = self.session.borrow_mut();
                session.background = None;
                let image = Rc::new(image);
                self.surface.borrow_mut().set_background(Some(image.as_ref()));
                session.name = entry.revision_name();
                session.background = Some(BackgroundSource { entry, image });
                BackgroundSelection::Applied
            }
            Err(detail) => {
                log::error!("Background {} failed to load: {}", entry.title, detail);
                self.notifier
                    .notify(Notification::danger(format!("Could not load background: {}", detail)));
                BackgroundSelection::Failed(detail)
            }
        }
    }

    // --- Saving ---

    /// Export the surface as it is now and commit it under the current name.
    ///
    /// Every save that reaches the sink produces exactly one notification.
    pub async fn save(&self) -> Result<SaveOutcome, SaveError> {
        if self.saving.get() {
            log::warn!("Save requested while another save is in progress");
            return Err(SaveError::Busy);
        }

        let name = self.session.borrow().name.trim().to_string();
        if name.is_empty() {
            log::warn!("Save rejected: no document name");
            self.notifier.notify(Notification::danger(VALIDATION_MESSAGE));
            return Err(SaveError::EmptyName);
        }

        let _busy = BusyGuard::enter(&self.saving);

        let raster = match self.exporter.export_surface(&*self.surface.borrow()) {
            Ok(raster) => raster,
            Err(e) => {
                let error = SaveError::from(e);
                log::error!("Save of {} failed: {}", name, error);
                self.notifier.notify(Notification::danger(error.to_string()));
                return Err(error);
            }
        };

        log::info!("Saving {} ({}x{}, {} bytes)", name, raster.width, raster.height, raster.len());
        let outcome = self.sink.commit(&name, raster).await;
        log::info!("Save of {} finished: {:?}", name, outcome);

        self.notifier
            .notify(Notification::for_outcome(&outcome, &self.sink.success_message(&name)));
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{LogNotifier, ToastQueue};
    use galaxypaint_core::sink::{MemorySink, UPLOAD_SUCCESS_MESSAGE};
    use galaxypaint_core::surface::PixelSurface;
    use galaxypaint_core::transport::{BoxFuture, TransportResult};
    use galaxypaint_render::encode_png;
    use image::Rgba;
    use std::rc::Weak;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct Fixture {
        controller: AppController<PixelSurface>,
        sink: Rc<MemorySink>,
        toasts: Rc<ToastQueue>,
    }

    fn fixture(surface: PixelSurface) -> Fixture {
        init_logging();
        let sink = Rc::new(MemorySink::new());
        let toasts = Rc::new(ToastQueue::new());
        let controller = AppController::new(surface, sink.clone(), toasts.clone());
        Fixture {
            controller,
            sink,
            toasts,
        }
    }

    /// A 40x40 fixture offering `documents`, already listed.
    async fn fixture_with(documents: FakeDocuments) -> Fixture {
        let mut f = fixture(PixelSurface::new(40, 40));
        f.controller = f.controller.with_documents(Rc::new(documents));
        f.controller.refresh_documents().await.unwrap();
        f
    }

    /// Surface wrapper that counts how often the export layers are read.
    struct CountingSurface {
        inner: PixelSurface,
        layer_reads: Cell<usize>,
    }

    impl DrawingSurface for CountingSurface {
        fn drawing_layer(&self) -> &RgbaImage {
            self.layer_reads.set(self.layer_reads.get() + 1);
            self.inner.drawing_layer()
        }
        fn background_layer(&self) -> Option<&RgbaImage> {
            self.inner.background_layer()
        }
        fn set_brush_color(&mut self, color: BrushColor) {
            self.inner.set_brush_color(color)
        }
        fn brush_radius(&self) -> f64 {
            self.inner.brush_radius()
        }
        fn set_hide_grid(&mut self, hide: bool) {
            self.inner.set_hide_grid(hide)
        }
        fn set_background(&mut self, image: Option<&RgbaImage>) {
            self.inner.set_background(image)
        }
        fn begin_stroke(&mut self, point: Point) {
            self.inner.begin_stroke(point)
        }
        fn extend_stroke(&mut self, point: Point) {
            self.inner.extend_stroke(point)
        }
        fn end_stroke(&mut self) {
            self.inner.end_stroke()
        }
        fn clear(&mut self) {
            self.inner.clear()
        }
        fn undo(&mut self) -> bool {
            self.inner.undo()
        }
    }

    /// In-memory documents; each fetch can be made to yield a few times first.
    struct FakeDocuments {
        entries: Vec<(DocumentEntry, Vec<u8>, usize)>,
    }

    impl FakeDocuments {
        fn new() -> Self {
            Self { entries: Vec::new() }
        }

        fn with(mut self, id: &str, title: &str, bytes: Vec<u8>, yields: usize) -> Self {
            let entry = DocumentEntry {
                id: id.to_string(),
                title: title.to_string(),
                content_url: format!("/documents/{}", id),
            };
            self.entries.push((entry, bytes, yields));
            self
        }
    }

    impl DocumentSource for FakeDocuments {
        fn list(&self) -> BoxFuture<'_, TransportResult<Vec<DocumentEntry>>> {
            let entries = self.entries.iter().map(|(entry, _, _)| entry.clone()).collect();
            Box::pin(async move { Ok(entries) })
        }

        fn fetch_content(&self, entry: &DocumentEntry) -> BoxFuture<'_, TransportResult<Vec<u8>>> {
            let found = self.entries.iter().find(|(e, _, _)| e.id == entry.id).cloned();
            Box::pin(async move {
                let (_, bytes, yields) = found.ok_or_else(|| TransportError::Http {
                    status: 404,
                    message: "Not Found".into(),
                })?;
                for _ in 0..yields {
                    tokio::task::yield_now().await;
                }
                Ok(bytes)
            })
        }
    }

    fn png(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, color);
        encode_png(image.as_raw(), width, height).unwrap()
    }

    #[tokio::test]
    async fn test_save_sketch() {
        let f = fixture(PixelSurface::new(400, 400));
        f.controller.draw_stroke(&[Point::new(50.0, 50.0), Point::new(120.0, 80.0)]);
        f.controller.set_name("sketch");

        let outcome = f.controller.save().await.unwrap();

        assert_eq!(outcome, SaveOutcome::Success);
        let (name, raster) = f.sink.last_commit().unwrap();
        assert_eq!(name, "sketch");
        assert_eq!((raster.width, raster.height), (400, 400));
        assert_eq!(f.toasts.drain(), vec![Notification::success(UPLOAD_SUCCESS_MESSAGE)]);
        assert_eq!(f.controller.state(), ControllerState::Interactive);
    }

    #[tokio::test]
    async fn test_save_reports_through_log_notifier() {
        init_logging();
        let sink = Rc::new(MemorySink::new());
        let controller = AppController::new(PixelSurface::new(20, 20), sink.clone(), Rc::new(LogNotifier));
        controller.set_name("logged");

        assert_eq!(controller.save().await.unwrap(), SaveOutcome::Success);
        sink.respond_with(SaveOutcome::Conflict("name taken".into()));
        assert_eq!(
            controller.save().await.unwrap(),
            SaveOutcome::Conflict("name taken".into())
        );
        assert_eq!(sink.commit_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_name_touches_nothing() {
        init_logging();
        let sink = Rc::new(MemorySink::new());
        let toasts = Rc::new(ToastQueue::new());
        let surface = CountingSurface {
            inner: PixelSurface::new(50, 50),
            layer_reads: Cell::new(0),
        };
        let controller = AppController::new(surface, sink.clone(), toasts.clone());
        controller.draw_stroke(&[Point::new(10.0, 10.0)]);

        for name in ["", "   "] {
            controller.set_name(name);
            assert!(matches!(controller.save().await, Err(SaveError::EmptyName)));
        }

        assert_eq!(sink.commit_count(), 0);
        assert_eq!(controller.with_surface(|s| s.layer_reads.get()), 0);
        let shown = toasts.drain();
        assert_eq!(shown.len(), 2);
        assert!(shown.iter().all(|n| *n == Notification::danger(VALIDATION_MESSAGE)));
    }

    #[tokio::test]
    async fn test_name_is_trimmed() {
        let f = fixture(PixelSurface::new(20, 20));
        f.controller.set_name("  sketch  ");
        f.controller.save().await.unwrap();
        assert_eq!(f.sink.last_commit().unwrap().0, "sketch");
    }

    #[tokio::test]
    async fn test_conflict_shows_server_title() {
        let f = fixture(PixelSurface::new(20, 20));
        f.sink.respond_with(SaveOutcome::Conflict("name taken".into()));
        f.controller.set_name("taken");

        let outcome = f.controller.save().await.unwrap();

        assert_eq!(outcome, SaveOutcome::Conflict("name taken".into()));
        let shown = f.toasts.drain();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].is_danger());
        assert!(shown[0].message.contains("name taken"));
    }

    #[tokio::test]
    async fn test_error_outcome_is_one_danger_toast() {
        let f = fixture(PixelSurface::new(20, 20));
        f.sink.respond_with(SaveOutcome::Error("connection refused".into()));
        f.controller.set_name("offline");

        assert_eq!(
            f.controller.save().await.unwrap(),
            SaveOutcome::Error("connection refused".into())
        );
        assert_eq!(
            f.toasts.drain(),
            vec![Notification::danger(
                "An error occurred uploading your document: connection refused"
            )]
        );
        assert!(!f.controller.is_saving());
    }

    #[tokio::test]
    async fn test_empty_surface_is_compositing_error() {
        let f = fixture(PixelSurface::new(0, 0));
        f.controller.set_name("nothing");

        let result = f.controller.save().await;

        assert!(matches!(result, Err(SaveError::Compositing(ExportError::InvalidSurface { .. }))));
        assert_eq!(f.sink.commit_count(), 0);
        let shown = f.toasts.drain();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].message.starts_with("Nothing to save"));
        assert!(!f.controller.is_saving());
    }

    #[tokio::test]
    async fn test_second_save_while_busy_is_rejected() {
        let f = fixture(PixelSurface::new(20, 20));
        f.sink.set_pending_polls(3);
        f.controller.set_name("twice");

        let (first, second) = tokio::join!(f.controller.save(), f.controller.save());

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| matches!(r, Ok(SaveOutcome::Success))).count(), 1);
        assert_eq!(results.iter().filter(|r| matches!(r, Err(SaveError::Busy))).count(), 1);
        assert_eq!(f.sink.commit_count(), 1);
        assert_eq!(f.toasts.len(), 1);
        assert!(!f.controller.is_saving());

        // The guard is released; saving works again.
        assert!(f.controller.save().await.is_ok());
    }

    #[tokio::test]
    async fn test_strokes_during_commit_are_not_exported() {
        let f = fixture(PixelSurface::new(60, 60));
        f.sink.set_pending_polls(4);
        f.controller.draw_stroke(&[Point::new(10.0, 10.0)]);
        f.controller.set_name("snapshot");

        let late_stroke = async {
            tokio::task::yield_now().await;
            assert!(f.controller.is_saving());
            f.controller.draw_stroke(&[Point::new(45.0, 45.0)]);
        };
        let (outcome, ()) = tokio::join!(f.controller.save(), late_stroke);
        assert_eq!(outcome.unwrap(), SaveOutcome::Success);

        let (_, raster) = f.sink.last_commit().unwrap();
        let exported = decode_image(&raster.bytes).unwrap();
        assert_eq!(exported.get_pixel(10, 10)[3], 255);
        assert_eq!(exported.get_pixel(45, 45)[3], 0);
        assert_eq!(f.controller.with_surface(|s| s.drawing_layer().get_pixel(45, 45)[3]), 255);
    }

    #[tokio::test]
    async fn test_brush_and_grid_state() {
        let f = fixture(PixelSurface::new(20, 20));
        assert!(f.controller.hide_grid());

        f.controller.set_brush_color("#ff0000").unwrap();
        assert!(f.controller.set_brush_color("#ff00").is_err());
        assert_eq!(f.controller.brush_color(), BrushColor::new(255, 0, 0));
        f.controller.draw_stroke(&[Point::new(10.0, 10.0)]);
        assert_eq!(
            f.controller.with_surface(|s| *s.drawing_layer().get_pixel(10, 10)),
            Rgba([255, 0, 0, 255])
        );

        assert!(!f.controller.toggle_grid());
        assert!(!f.controller.with_surface(|s| s.hide_grid()));
    }

    #[tokio::test]
    async fn test_undo_past_history_empties_drawing() {
        let f = fixture(PixelSurface::new(30, 30));
        f.controller.draw_stroke(&[Point::new(5.0, 5.0)]);
        f.controller.draw_stroke(&[Point::new(20.0, 20.0), Point::new(25.0, 20.0)]);

        for _ in 0..5 {
            f.controller.undo();
        }

        assert!(f.controller.with_surface(|s| s.is_blank()));
    }

    #[tokio::test]
    async fn test_background_prefills_revision_name() {
        let f = fixture_with(FakeDocuments::new().with("31", "Logo", png(8, 8, Rgba([0, 0, 255, 255])), 0)).await;

        assert_eq!(f.controller.select_background("31").await, BackgroundSelection::Applied);

        assert_eq!(f.controller.name(), "Logo-rev");
        assert!(f.controller.with_surface(|s| s.background_layer().is_some()));

        // The prefilled name is only a suggestion.
        f.controller.set_name("my logo");
        f.controller.save().await.unwrap();
        assert_eq!(f.sink.last_commit().unwrap().0, "my logo");
    }

    #[tokio::test]
    async fn test_new_background_releases_previous() {
        let documents = FakeDocuments::new()
            .with("b1", "First", png(4, 4, Rgba([255, 0, 0, 255])), 0)
            .with("b2", "Second", png(4, 4, Rgba([0, 255, 0, 255])), 0);
        let f = fixture_with(documents).await;

        f.controller.select_background("b1").await;
        let first: Weak<RgbaImage> = Rc::downgrade(&f.controller.background_image().unwrap());
        assert!(first.upgrade().is_some());

        f.controller.select_background("b2").await;

        assert!(first.upgrade().is_none());
        assert_eq!(f.controller.background().unwrap().id, "b2");
    }

    #[tokio::test]
    async fn test_stale_selection_is_superseded() {
        let documents = FakeDocuments::new()
            .with("slow", "Slow", png(4, 4, Rgba([255, 0, 0, 255])), 5)
            .with("fast", "Fast", png(4, 4, Rgba([0, 255, 0, 255])), 0);
        let f = fixture_with(documents).await;

        let (slow, fast) = tokio::join!(
            f.controller.select_background("slow"),
            f.controller.select_background("fast")
        );

        assert_eq!(slow, BackgroundSelection::Superseded);
        assert_eq!(fast, BackgroundSelection::Applied);
        assert_eq!(f.controller.background().unwrap().id, "fast");
        assert_eq!(f.controller.name(), "Fast-rev");
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_background() {
        let documents = FakeDocuments::new()
            .with("good", "Good", png(4, 4, Rgba([255, 0, 0, 255])), 0)
            .with("broken", "Broken", b"not an image".to_vec(), 0);
        let f = fixture_with(documents).await;

        f.controller.select_background("good").await;
        let result = f.controller.select_background("broken").await;

        assert!(matches!(result, BackgroundSelection::Failed(_)));
        assert_eq!(f.controller.background().unwrap().id, "good");
        assert_eq!(f.controller.name(), "Good-rev");
        let shown = f.toasts.drain();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].message.starts_with("Could not load background"));
    }

    #[tokio::test]
    async fn test_placeholder_and_unknown_ids_are_ignored() {
        let f = fixture_with(FakeDocuments::new().with("1", "One", png(2, 2, Rgba([1, 2, 3, 255])), 0)).await;

        assert_eq!(f.controller.select_background("choose").await, BackgroundSelection::Ignored);
        assert_eq!(f.controller.select_background("99").await, BackgroundSelection::Ignored);
        assert!(f.controller.background().is_none());
        assert!(f.toasts.is_empty());
    }

    #[tokio::test]
    async fn test_clear_drops_background_and_pending_selection() {
        let documents = FakeDocuments::new()
            .with("now", "Now", png(4, 4, Rgba([255, 0, 0, 255])), 0)
            .with("later", "Later", png(4, 4, Rgba([0, 255, 0, 255])), 3);
        let f = fixture_with(documents).await;

        f.controller.select_background("now").await;
        f.controller.draw_stroke(&[Point::new(5.0, 5.0)]);
        let image: Weak<RgbaImage> = Rc::downgrade(&f.controller.background_image().unwrap());

        let clear_soon = async {
            tokio::task::yield_now().await;
            f.controller.clear();
        };
        let (later, ()) = tokio::join!(f.controller.select_background("later"), clear_soon);

        assert_eq!(later, BackgroundSelection::Superseded);
        assert!(f.controller.background().is_none());
        assert!(image.upgrade().is_none());
        assert!(f.controller.with_surface(|s| s.is_blank() && s.background_layer().is_none()));
    }

    struct Unreachable;

    impl DocumentSource for Unreachable {
        fn list(&self) -> BoxFuture<'_, TransportResult<Vec<DocumentEntry>>> {
            Box::pin(async { Err(TransportError::Network("connection refused".into())) })
        }

        fn fetch_content(&self, _entry: &DocumentEntry) -> BoxFuture<'_, TransportResult<Vec<u8>>> {
            Box::pin(async { Err(TransportError::Network("connection refused".into())) })
        }
    }

    #[tokio::test]
    async fn test_refresh_failure_notifies_and_keeps_list() {
        let f = fixture(PixelSurface::new(10, 10));
        assert!(f.controller.refresh_documents().await.unwrap().is_empty());

        let controller = f.controller.with_documents(Rc::new(Unreachable));
        assert!(controller.refresh_documents().await.is_err());
        assert!(controller.documents().is_empty());
        assert!(f.toasts.pop().unwrap().message.contains("connection refused"));
    }
}
