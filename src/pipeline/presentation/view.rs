use tracing::debug;

use crate::pipeline::services::image::{ClassColorAssignment, DetectionOverlayRenderer, Surface};
use crate::pipeline::session::{AnalysisSession, SessionId, SessionState};

/// Which result set the presentation layer shows. Independent of the
/// session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTab {
    #[default]
    Detection,
    Classification,
}

/// Keeps the detection overlay in sync with the current session and the
/// selected tab. Only redraws already-computed results.
pub struct OverlayView<S: Surface> {
    renderer: DetectionOverlayRenderer,
    surface: S,
    tab: ActiveTab,
    rendered: Option<SessionId>,
    colors: ClassColorAssignment,
}

impl<S: Surface> OverlayView<S> {
    pub fn new(renderer: DetectionOverlayRenderer, surface: S) -> Self {
        Self {
            renderer,
            surface,
            tab: ActiveTab::default(),
            rendered: None,
            colors: ClassColorAssignment::default(),
        }
    }

    pub fn tab(&self) -> ActiveTab {
        self.tab
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn colors(&self) -> &ClassColorAssignment {
        &self.colors
    }

    pub fn select_tab(&mut self, tab: ActiveTab, session: &AnalysisSession) {
        if self.tab == tab {
            return;
        }
        debug!("Switching overlay to {:?}", tab);
        self.tab = tab;
        self.rendered = None;
        self.refresh(session);
    }

    /// Brings the surface up to date with `session`. Returns true when the
    /// overlay was redrawn.
    pub fn refresh(&mut self, session: &AnalysisSession) -> bool {
        let showable = self.tab == ActiveTab::Detection && session.state() == SessionState::Complete;
        if !showable {
            self.reset();
            return false;
        }
        if self.rendered == Some(session.id()) {
            return false;
        }
        self.colors = self.renderer.render(session.detections(), &mut self.surface);
        self.rendered = Some(session.id());
        true
    }

    fn reset(&mut self) {
        self.surface.clear();
        self.rendered = None;
        self.colors = ClassColorAssignment::default();
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}
