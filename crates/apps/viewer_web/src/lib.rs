use console_error_panic_hook::set_once;
use gloo_net::http::Request;
use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use foundation::math::Vec2;
use overlay::{
    CLOSE_BUTTON_CLASS, CONTENT_CLASS, Document, Element, FeatureInspector, HEADER_CLASS,
    MountedViewer, PANEL_CLASS, PopupConfig, TITLE_CLASS,
};
use scene::{PickOptions, Tileset, Viewer};

mod dom;
pub use dom::{WebDocument, WebElement};

/// Radians of globe rotation per dragged pixel.
const ORBIT_SPEED: f64 = 0.005;

/// Whether an animation-frame loop is scheduled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct RenderLoop {
    running: bool,
}

impl RenderLoop {
    /// Returns `false` when a loop is already running.
    fn try_start(&mut self) -> bool {
        !std::mem::replace(&mut self.running, true)
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

struct WebViewer {
    scene: MountedViewer<WebDocument>,
    inspector: FeatureInspector<WebDocument>,
    render_loop: RenderLoop,
}

thread_local! {
    static STATE: RefCell<Option<WebViewer>> = const { RefCell::new(None) };
}

fn js_err(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn with_viewer<R>(f: impl FnOnce(&mut WebViewer) -> Result<R, JsValue>) -> Result<R, JsValue> {
    STATE.with(|state| {
        let mut state = state.borrow_mut();
        let viewer = state
            .as_mut()
            .ok_or_else(|| JsValue::from_str("viewer not initialized"))?;
        f(viewer)
    })
}

fn popup_css() -> String {
    format!(
        ".{PANEL_CLASS} {{ position: absolute; min-width: 180px; background: #1d2733; color: #e8eef5; \
         border-radius: 4px; box-shadow: 0 2px 8px rgba(0,0,0,.4); font: 12px sans-serif; z-index: 10; }}\n\
         .{CLOSE_BUTTON_CLASS} {{ position: absolute; top: 4px; right: 6px; cursor: pointer; }}\n\
         .{HEADER_CLASS} {{ padding: 6px 24px 6px 8px; border-bottom: 1px solid #33414f; }}\n\
         .{TITLE_CLASS} {{ font-weight: bold; }}\n\
         .{CONTENT_CLASS} {{ padding: 6px 8px; }}\n"
    )
}

fn install_stylesheet(document: &WebDocument) -> Result<(), JsValue> {
    let style = document.create_element("style").map_err(js_err)?;
    style.set_inner_html(&popup_css());
    let head = document
        .raw()
        .head()
        .ok_or_else(|| JsValue::from_str("document has no head"))?;
    head.append_child(style.raw())?;
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Mounts the overlay layer into the element with id `container_id`.
///
/// `popup_config` is an optional JSON object with `class_name`, `offset`, `title`.
#[wasm_bindgen]
pub fn init_viewer(
    container_id: &str,
    width: f64,
    height: f64,
    popup_config: Option<String>,
) -> Result<(), JsValue> {
    let config: PopupConfig = match popup_config.as_deref() {
        Some(json) => serde_json::from_str(json).map_err(js_err)?,
        None => PopupConfig::default(),
    };
    let document = WebDocument::from_window().map_err(js_err)?;
    let container = document
        .element_by_id(container_id)
        .ok_or_else(|| JsValue::from_str(&format!("no element #{container_id}")))?;
    container.set_style("position", "relative");
    install_stylesheet(&document)?;

    let scene = MountedViewer::with_container(Viewer::new(width, height), document.clone(), container);
    let inspector = FeatureInspector::new(document, &config);
    STATE.with(|state| {
        *state.borrow_mut() = Some(WebViewer {
            scene,
            inspector,
            render_loop: RenderLoop::default(),
        });
    });
    log("viewer initialized");
    Ok(())
}

#[wasm_bindgen]
pub fn set_canvas_sizes(width: f64, height: f64) -> Result<(), JsValue> {
    with_viewer(|v| {
        v.scene.viewer_mut().resize(width, height);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn set_pick_tolerance(tolerance_px: f64) -> Result<(), JsValue> {
    with_viewer(|v| {
        v.inspector.set_pick_options(PickOptions { tolerance_px });
        Ok(())
    })
}

#[wasm_bindgen]
pub fn camera_fly_to(
    lon_deg: f64,
    lat_deg: f64,
    height_m: f64,
    heading_deg: f64,
    pitch_deg: f64,
) -> Result<(), JsValue> {
    with_viewer(|v| {
        v.scene.viewer_mut().fly_to(
            lon_deg,
            lat_deg,
            height_m,
            heading_deg.to_radians(),
            pitch_deg.to_radians(),
        );
        Ok(())
    })
}

/// Spins the globe under the camera.
///
/// Intended usage: call with the horizontal pointer delta in pixels.
#[wasm_bindgen]
pub fn camera_orbit(delta_x_px: f64) -> Result<(), JsValue> {
    with_viewer(|v| {
        v.scene
            .viewer_mut()
            .camera
            .orbit_z(-delta_x_px * ORBIT_SPEED);
        Ok(())
    })
}

/// Adds a tileset given as JSON text; returns its feature count.
#[wasm_bindgen]
pub fn load_tileset_json(json: &str) -> Result<usize, JsValue> {
    let tileset = Tileset::from_json_str(json).map_err(js_err)?;
    let count = tileset.len();
    with_viewer(|v| {
        v.scene.viewer_mut().add_tileset(tileset);
        Ok(count)
    })
}

#[wasm_bindgen]
pub fn load_tileset(url: String) {
    spawn_local(async move {
        let text = match fetch_text(&url).await {
            Ok(text) => text,
            Err(err) => {
                log(&format!("Failed to fetch tileset: {err:?}"));
                return;
            }
        };
        match load_tileset_json(&text) {
            Ok(count) => log(&format!("tileset {url}: {count} features")),
            Err(err) => log(&format!("Failed to load tileset: {err:?}")),
        }
    });
}

/// Renders one frame and returns the scene time in seconds.
#[wasm_bindgen]
pub fn render_frame() -> Result<f64, JsValue> {
    with_viewer(|v| Ok(v.scene.render().time_s))
}

/// Picks at canvas pixel `(x, y)`; returns the picked feature id.
#[wasm_bindgen]
pub fn handle_click(x: f64, y: f64) -> Result<Option<String>, JsValue> {
    with_viewer(|v| {
        v.inspector
            .handle_click(&v.scene, Vec2::new(x, y))
            .map_err(js_err)
    })
}

#[wasm_bindgen]
pub fn close_popup() -> Result<(), JsValue> {
    with_viewer(|v| {
        v.inspector.close();
        Ok(())
    })
}

#[wasm_bindgen]
pub fn popup_visible() -> bool {
    with_viewer(|v| Ok(v.inspector.popup().is_visible())).unwrap_or(false)
}

/// Calls [`render_frame`] on every animation frame until a render or a
/// frame request fails.
#[wasm_bindgen]
pub fn start_render_loop() -> Result<(), JsValue> {
    let started = with_viewer(|v| Ok(v.render_loop.try_start()))?;
    if !started {
        return Ok(());
    }

    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let next = Rc::clone(&tick);
    *tick.borrow_mut() = Some(Closure::<dyn FnMut()>::new(move || {
        if let Err(err) = render_frame() {
            stop_render_loop(&err);
            return;
        }
        if let Some(cb) = next.borrow().as_ref() {
            if let Err(err) = request_animation_frame(cb) {
                stop_render_loop(&err);
            }
        }
    }));
    let first = tick.borrow();
    let scheduled = match first.as_ref() {
        Some(cb) => request_animation_frame(cb),
        None => Ok(()),
    };
    if let Err(err) = &scheduled {
        stop_render_loop(err);
    }
    scheduled
}

/// Lets a later [`start_render_loop`] call start a fresh loop.
fn stop_render_loop(err: &JsValue) {
    log(&format!("render loop stopped: {err:?}"));
    if with_viewer(|v| {
        v.render_loop.stop();
        Ok(())
    })
    .is_err()
    {
        log("render loop stopped without a viewer");
    }
}

fn request_animation_frame(cb: &Closure<dyn FnMut()>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    window.request_animation_frame(cb.as_ref().unchecked_ref())?;
    Ok(())
}

async fn fetch_text(url: &str) -> Result<String, JsValue> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    resp.text()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
