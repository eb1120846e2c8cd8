//! Info-bubble overlay pinned to a world position.
//!
//! A [`Popup`] owns a floating panel appended to the scene's container. While
//! attached with a world position, a post-render listener re-projects the
//! anchor every frame and places the panel bottom-center above it, hiding the
//! panel when the anchor rotates to the far side of the globe.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use foundation::math::{Vec2, Vec3};
use runtime::ListenerHandle;
use scene::{PostRenderEvent, SceneView};
use tracing::{debug, trace, warn};

use crate::config::PopupConfig;
use crate::dom::{Document, DomError, Element, is_displayed, set_displayed};
use crate::host::SceneHost;

pub const PANEL_CLASS: &str = "globe-popup-panel";
pub const CLOSE_BUTTON_CLASS: &str = "globe-popup-close-btn";
pub const HEADER_CLASS: &str = "globe-popup-header-panel";
pub const TITLE_CLASS: &str = "globe-popup-header-title";
pub const CONTENT_CLASS: &str = "globe-popup-content-panel";

/// Gap between the anchor and the panel's bottom edge, in pixels.
pub const ANCHOR_GAP_PX: f64 = 10.0;

const CLOSE_ICON: &str = r#"<svg viewBox="0 0 16 16" width="16" height="16" aria-hidden="true"><path d="M3 3l10 10M13 3L3 13" stroke="currentColor" stroke-width="2"/></svg>"#;

/// Which teardown/update path the content follows.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ContentKind {
    #[default]
    None,
    /// Markup text in a popup-owned container, with header and close button.
    Markup,
    /// A caller-owned element shown as-is.
    Node,
}

#[derive(Debug, Clone)]
enum Content<E> {
    Markup(String),
    Node(E),
}

#[derive(Debug)]
struct PopupDom<E> {
    /// Content path the current skeleton was built for.
    built: ContentKind,
    panel: Option<E>,
    header: Option<E>,
    title: Option<E>,
    close_button: Option<E>,
    content: Option<E>,
}

impl<E> Default for PopupDom<E> {
    fn default() -> Self {
        Self {
            built: ContentKind::None,
            panel: None,
            header: None,
            title: None,
            close_button: None,
            content: None,
        }
    }
}

#[derive(Debug)]
struct SceneLink {
    post_render: PostRenderEvent,
    listener: Option<ListenerHandle>,
}

#[derive(Debug)]
struct PopupState<E> {
    title: String,
    content: Option<Content<E>>,
    world_position: Option<Vec3>,
    offset: Vec2,
    initial_class: Option<String>,
    dom: PopupDom<E>,
    scene: Option<SceneLink>,
}

impl<E: Element> PopupState<E> {
    fn new() -> Self {
        Self {
            title: String::new(),
            content: None,
            world_position: None,
            offset: Vec2::default(),
            initial_class: None,
            dom: PopupDom::default(),
            scene: None,
        }
    }

    fn content_kind(&self) -> ContentKind {
        match self.content {
            None => ContentKind::None,
            Some(Content::Markup(_)) => ContentKind::Markup,
            Some(Content::Node(_)) => ContentKind::Node,
        }
    }

    fn has_frame_listener(&self) -> bool {
        self.scene.as_ref().is_some_and(|s| s.listener.is_some())
    }

    /// Builds the panel skeleton into `self.dom`. On error, whatever was
    /// built is left in `self.dom` for [`PopupState::teardown`].
    fn build<D>(&mut self, document: &D, weak: Weak<RefCell<PopupState<E>>>) -> Result<E, DomError>
    where
        D: Document<Element = E>,
    {
        let panel = document.create_element("div")?;
        panel.add_class(PANEL_CLASS);
        if let Some(class) = &self.initial_class {
            panel.add_class(class);
        }
        set_displayed(&panel, false);
        self.dom.panel = Some(panel.clone());
        self.dom.built = self.content_kind();

        match self.content.clone() {
            Some(Content::Markup(html)) => {
                let close_button = document.create_element("div")?;
                close_button.add_class(CLOSE_BUTTON_CLASS);
                close_button.set_inner_html(CLOSE_ICON);
                self.dom.close_button = Some(close_button.clone());

                let header = document.create_element("div")?;
                header.add_class(HEADER_CLASS);
                self.dom.header = Some(header.clone());

                let title = document.create_element("div")?;
                title.add_class(TITLE_CLASS);
                title.set_inner_html(&self.title);
                self.dom.title = Some(title.clone());

                header.append_child(&title)?;
                panel.append_child(&close_button)?;
                panel.append_child(&header)?;

                let content = document.create_element("div")?;
                content.add_class(CONTENT_CLASS);
                content.set_inner_html(&html);
                self.dom.content = Some(content.clone());
                panel.append_child(&content)?;

                close_button.set_click_handler(Some(Box::new(move || {
                    let Some(shared) = weak.upgrade() else {
                        return;
                    };
                    if let Ok(mut state) = shared.try_borrow_mut() {
                        debug!("popup closed from its close button");
                        state.close();
                    };
                })));
            }
            Some(Content::Node(node)) => {
                panel.append_child(&node)?;
                self.dom.content = Some(node);
            }
            None => {}
        }

        Ok(panel)
    }

    /// Per-frame placement. Skips the frame when the anchor does not project.
    fn reposition(&mut self, view: &dyn SceneView) {
        let Some(position) = self.world_position else {
            return;
        };
        let Some(panel) = self.dom.panel.clone() else {
            return;
        };
        let Some(window) = view.world_to_window(position) else {
            trace!("popup anchor not representable this frame");
            return;
        };

        let anchor = panel_anchor(window, panel.offset_size(), self.offset);
        panel.set_style("left", &format!("{}px", anchor.x));
        panel.set_style("top", &format!("{}px", anchor.y));

        set_displayed(&panel, !is_behind_globe(view, position));
    }

    /// Unregisters from the scene and releases every DOM handle, keeping the
    /// configured content, title, position, offset and class.
    fn teardown(&mut self) {
        if let Some(link) = self.scene.take() {
            if let Some(listener) = link.listener {
                link.post_render.remove_listener(listener);
            }
        }
        if let Some(close_button) = self.dom.close_button.take() {
            close_button.set_click_handler(None);
            close_button.remove();
        }
        if let Some(title) = self.dom.title.take() {
            title.remove();
        }
        if let Some(header) = self.dom.header.take() {
            header.remove();
        }
        if let Some(content) = self.dom.content.take() {
            content.remove();
        }
        if let Some(panel) = self.dom.panel.take() {
            panel.remove();
        }
        self.dom.built = ContentKind::None;
    }

    fn close(&mut self) {
        self.teardown();
        self.content = None;
    }
}

fn subscribe<E: Element>(shared: &Rc<RefCell<PopupState<E>>>, post_render: &PostRenderEvent) -> ListenerHandle {
    let weak = Rc::downgrade(shared);
    post_render.add_listener(move |view| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let Ok(mut state) = shared.try_borrow_mut() else {
            return;
        };
        state.reposition(view);
    })
}

/// Panel top-left for a bottom-center anchor at `window`, [`ANCHOR_GAP_PX`]
/// above the geometry, shifted by `offset`.
pub fn panel_anchor(window: Vec2, panel_size: Vec2, offset: Vec2) -> Vec2 {
    Vec2::new(
        window.x - panel_size.x / 2.0 + offset.x,
        window.y - panel_size.y - ANCHOR_GAP_PX + offset.y,
    )
}

/// Camera height above the ellipsoid plus the ellipsoid's maximum radius.
///
/// Anchors farther from the camera than this are treated as being on the far
/// side of the globe. This is a coarse horizon proxy, not exact occlusion.
pub fn horizon_threshold(view: &dyn SceneView) -> Option<f64> {
    Some(view.camera_height()? + view.ellipsoid().maximum_radius())
}

pub fn is_beyond_horizon(camera_distance: f64, threshold: f64) -> bool {
    camera_distance > threshold
}

/// Back-face test for `position`, measured from the surface point rebuilt
/// from its own longitude, latitude and height.
pub fn is_behind_globe(view: &dyn SceneView, position: Vec3) -> bool {
    let ellipsoid = view.ellipsoid();
    let Some(carto) = ellipsoid.cartesian_to_cartographic(position) else {
        return false;
    };
    let surface_point = ellipsoid.from_degrees(carto.lon_deg(), carto.lat_deg(), carto.height_m);
    let Some(threshold) = horizon_threshold(view) else {
        return false;
    };
    is_beyond_horizon(view.camera_position().distance(surface_point), threshold)
}

/// Floating info panel anchored to a world position.
///
/// Setters chain. Content is either markup (the popup builds a header with a
/// title and a close button around it) or a caller-owned element shown as-is.
#[derive(Debug)]
pub struct Popup<E: Element> {
    state: Rc<RefCell<PopupState<E>>>,
}

impl<E: Element> Default for Popup<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Element> Drop for Popup<E> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.close();
        }
    }
}

impl<E: Element> Popup<E> {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(PopupState::new())),
        }
    }

    pub fn from_config(config: &PopupConfig) -> Self {
        let mut popup = Self::new();
        popup.apply_config(config);
        popup
    }

    pub fn apply_config(&mut self, config: &PopupConfig) -> &mut Self {
        if let Some(class) = &config.class_name {
            self.add_class(class);
        }
        if let Some(title) = &config.title {
            self.set_title(title);
        }
        self.set_offset(config.offset)
    }

    /// Mounts the panel into `scene`'s container.
    ///
    /// Re-attaching tears down the current panel and listener first. Unlike
    /// [`Popup::close`], this keeps the configured content and its kind, so
    /// the new panel is rebuilt from them. Without a world position the panel
    /// stays hidden and no frame listener is registered.
    pub fn attach<S>(&mut self, scene: &S) -> Result<&mut Self, DomError>
    where
        S: SceneHost,
        S::Document: Document<Element = E>,
    {
        let weak = Rc::downgrade(&self.state);
        let mut state = self.state.borrow_mut();
        if state.dom.panel.is_some() {
            state.teardown();
        }

        let built = state
            .build(scene.document(), weak)
            .and_then(|panel| scene.container().append_child(&panel).map(|()| panel));
        let panel = match built {
            Ok(panel) => panel,
            Err(err) => {
                state.teardown();
                return Err(err);
            }
        };

        let listener = state.world_position.map(|_| {
            set_displayed(&panel, true);
            subscribe(&self.state, scene.post_render())
        });
        state.scene = Some(SceneLink {
            post_render: scene.post_render().clone(),
            listener,
        });
        debug!(
            content = ?state.content_kind(),
            tracking = listener.is_some(),
            "popup attached"
        );
        drop(state);
        Ok(self)
    }

    /// Idempotent teardown. Leaves the popup with no content and no scene.
    pub fn close(&mut self) -> &mut Self {
        let mut state = self.state.borrow_mut();
        let was_attached = state.dom.panel.is_some();
        state.close();
        if was_attached {
            debug!("popup closed");
        }
        drop(state);
        self
    }

    /// Markup in a live markup container is replaced in place; switching
    /// from node content takes effect on the next [`Popup::attach`].
    pub fn set_content_markup(&mut self, html: &str) -> &mut Self {
        let mut state = self.state.borrow_mut();
        if state.dom.built == ContentKind::Markup {
            if let Some(container) = &state.dom.content {
                container.set_inner_html(html);
            }
        }
        state.content = Some(Content::Markup(html.to_string()));
        drop(state);
        self
    }

    /// Shows a caller-owned element. A live node is swapped in place; switching
    /// from markup takes effect on the next [`Popup::attach`].
    pub fn set_content_node(&mut self, node: E) -> &mut Self {
        let mut state = self.state.borrow_mut();
        let live_node = state.dom.built == ContentKind::Node;
        let live = (state.dom.content.clone(), state.dom.panel.clone());
        if let (true, (Some(old), Some(panel))) = (live_node, live) {
            old.remove();
            match panel.append_child(&node) {
                Ok(()) => state.dom.content = Some(node.clone()),
                Err(err) => {
                    warn!(%err, "could not swap popup content");
                    state.dom.content = None;
                }
            }
        }
        state.content = Some(Content::Node(node));
        drop(state);
        self
    }

    /// Stores the anchor. Repositioning happens on the next rendered frame.
    ///
    /// An attached popup that was not tracking starts tracking now.
    pub fn set_world_position(&mut self, position: Vec3) -> &mut Self {
        let mut state = self.state.borrow_mut();
        state.world_position = Some(position);
        let needs_listener = state.dom.panel.is_some() && !state.has_frame_listener();
        if needs_listener {
            if let Some(panel) = &state.dom.panel {
                set_displayed(panel, true);
            }
            let post_render = state.scene.as_ref().map(|s| s.post_render.clone());
            if let Some(post_render) = post_render {
                let listener = subscribe(&self.state, &post_render);
                state.scene = Some(SceneLink {
                    post_render,
                    listener: Some(listener),
                });
            }
        }
        drop(state);
        self
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        let mut state = self.state.borrow_mut();
        if let Some(element) = &state.dom.title {
            element.set_inner_html(title);
        }
        state.title = title.to_string();
        drop(state);
        self
    }

    pub fn add_class(&mut self, name: &str) -> &mut Self {
        let mut state = self.state.borrow_mut();
        match &state.dom.panel {
            Some(panel) => panel.add_class(name),
            None => state.initial_class = Some(name.to_string()),
        }
        drop(state);
        self
    }

    pub fn remove_class(&mut self, name: &str) -> &mut Self {
        let mut state = self.state.borrow_mut();
        match &state.dom.panel {
            Some(panel) => panel.remove_class(name),
            None => {
                if state.initial_class.as_deref() == Some(name) {
                    state.initial_class = None;
                }
            }
        }
        drop(state);
        self
    }

    pub fn set_offset(&mut self, offset: impl Into<Vec2>) -> &mut Self {
        self.state.borrow_mut().offset = offset.into();
        self
    }

    pub fn is_attached(&self) -> bool {
        self.state.borrow().dom.panel.is_some()
    }

    pub fn has_frame_listener(&self) -> bool {
        self.state.borrow().has_frame_listener()
    }

    /// Panel exists and is not hidden.
    pub fn is_visible(&self) -> bool {
        self.state.borrow().dom.panel.as_ref().is_some_and(is_displayed)
    }

    pub fn content_kind(&self) -> ContentKind {
        self.state.borrow().content_kind()
    }

    pub fn world_position(&self) -> Option<Vec3> {
        self.state.borrow().world_position
    }

    pub fn offset(&self) -> Vec2 {
        self.state.borrow().offset
    }

    pub fn title(&self) -> String {
        self.state.borrow().title.clone()
    }

    pub fn panel(&self) -> Option<E> {
        self.state.borrow().dom.panel.clone()
    }

    pub fn header(&self) -> Option<E> {
        self.state.borrow().dom.header.clone()
    }

    pub fn title_element(&self) -> Option<E> {
        self.state.borrow().dom.title.clone()
    }

    pub fn close_button(&self) -> Option<E> {
        self.state.borrow().dom.close_button.clone()
    }

    pub fn content_element(&self) -> Option<E> {
        self.state.borrow().dom.content.clone()
    }
}
