// Re-export all public modules so they can be used from main.rs
pub mod logging;
pub mod config;
pub mod utils;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{Document, Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, Window};

    use crate::config::ControllerConfig;
    use crate::controller::{input, FrameDriver, InputEvent, InputProcessor};
    use crate::model::assets;
    use crate::ui;
    use crate::view::{GpuContext, RenderState};

    /// Main application setup for WASM
    pub async fn setup_app(window: &Window, document: &Document, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
        let (width, height) = (canvas.width(), canvas.height());
        let gpu = GpuContext::new(canvas, width, height)
            .await
            .map_err(|e| js_error(format!("GPU init failed: {e}")))?;
        let mut render = RenderState::new(gpu);

        let driver = Rc::new(RefCell::new(FrameDriver::new(
            ControllerConfig::default(),
            assets::load_character(),
            width,
            height,
        )));
        let egui_events: Rc<RefCell<Vec<egui::Event>>> = Rc::new(RefCell::new(Vec::new()));
        let egui_ctx = egui::Context::default();

        setup_input_listeners(document, window, canvas, driver.clone(), egui_events.clone())?;

        let performance = window.performance().ok_or(js_error("no performance on window"))?;
        let mut last_time = performance.now();
        let canvas = canvas.clone();
        let document = document.clone();

        let frame = RcCellCallback::new(window.clone(), move || {
            let now = performance.now();
            let dt = ((now - last_time) / 1000.0) as f32;
            last_time = now;

            // Follow CSS size changes of the canvas
            let (w, h) = (canvas.client_width().max(1) as u32, canvas.client_height().max(1) as u32);
            if (w, h) != render.size() {
                canvas.set_width(w);
                canvas.set_height(h);
                render.resize(w, h);
                driver.borrow_mut().camera.set_aspect(w, h);
            }

            let mut driver = driver.borrow_mut();
            if let Err(e) = driver.tick(dt) {
                tracing::error!(error = %e, "character failed to load");
                // Nothing consumes input after this; releasing capture stops
                // mouse samples from queueing up.
                document.exit_pointer_lock();
                driver.clear_keys();
                return false;
            }
            render.prepare(&driver);

            let raw_input = egui::RawInput {
                screen_rect: Some(egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(w as f32, h as f32))),
                events: std::mem::take(&mut *egui_events.borrow_mut()),
                time: Some(now / 1000.0),
                ..Default::default()
            };
            let output = ui::build_ui(&egui_ctx, raw_input, &driver);
            let (ui_frame, _) = ui::tessellate(&egui_ctx, output);

            match render.draw_frame(Some(ui_frame)) {
                Ok(()) => true,
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    render.gpu.reconfigure();
                    true
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    tracing::error!("surface out of memory");
                    false
                }
                Err(e) => {
                    tracing::warn!(error = ?e, "dropped frame");
                    true
                }
            }
        });
        frame.start()
    }

    /// Apply a capture change requested by the input state.
    fn apply_pointer_lock(driver: &RefCell<FrameDriver>, canvas: &HtmlCanvasElement, document: &Document) {
        let request = driver.borrow_mut().input.take_pointer_lock_request();
        match request {
            Some(true) => canvas.request_pointer_lock(),
            Some(false) => document.exit_pointer_lock(),
            None => {}
        }
    }

    /// Forward DOM events into the frame driver. Handlers only record state;
    /// all game logic runs in the animation frame.
    fn setup_input_listeners(
        document: &Document,
        window: &Window,
        canvas: &HtmlCanvasElement,
        driver: Rc<RefCell<FrameDriver>>,
        egui_events: Rc<RefCell<Vec<egui::Event>>>,
    ) -> Result<(), JsValue> {
        let input_processor = InputProcessor::default();

        // Keyboard down
        {
            let driver = driver.clone();
            let canvas = canvas.clone();
            let document_for_exit = document.clone();
            let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
                if input_processor.is_game_key(&e.code()) {
                    e.prevent_default();
                }
                driver.borrow_mut().handle_event(&input::wasm::keyboard_event_to_input(&e, true));
                apply_pointer_lock(&driver, &canvas, &document_for_exit);
            }) as Box<dyn FnMut(KeyboardEvent)>);
            document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
            keydown.forget();
        }

        // Keyboard up
        {
            let driver = driver.clone();
            let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
                driver.borrow_mut().handle_event(&input::wasm::keyboard_event_to_input(&e, false));
            }) as Box<dyn FnMut(KeyboardEvent)>);
            document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
            keyup.forget();
        }

        // Focus loss - clear all keys
        {
            let driver = driver.clone();
            let blur = Closure::wrap(Box::new(move |_e: Event| {
                driver.borrow_mut().handle_event(&InputEvent::FocusLost);
            }) as Box<dyn FnMut(Event)>);
            window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
            blur.forget();
        }

        // Visibility change - clear all keys
        {
            let driver = driver.clone();
            let doc_vis = document.clone();
            let visibility = Closure::wrap(Box::new(move |_e: Event| {
                let visible = !doc_vis.hidden();
                driver.borrow_mut().handle_event(&InputEvent::VisibilityChanged { visible });
            }) as Box<dyn FnMut(Event)>);
            document.add_event_listener_with_callback("visibilitychange", visibility.as_ref().unchecked_ref())?;
            visibility.forget();
        }

        // Pointer lock change
        {
            let driver = driver.clone();
            let doc_pl = document.clone();
            let plc = Closure::wrap(Box::new(move |_e: Event| {
                let locked = doc_pl.pointer_lock_element().is_some();
                driver.borrow_mut().handle_event(&InputEvent::PointerLockChanged { locked });
            }) as Box<dyn FnMut(Event)>);
            document.add_event_listener_with_callback("pointerlockchange", plc.as_ref().unchecked_ref())?;
            plc.forget();
        }

        // Mouse down on canvas. Pointer lock must be requested inside the gesture.
        {
            let driver = driver.clone();
            let canvas_click = canvas.clone();
            let doc_click = document.clone();
            let egui_events_q = egui_events.clone();
            let mousedown = Closure::wrap(Box::new(move |e: MouseEvent| {
                let was_locked = driver.borrow().input.pointer_locked;
                driver.borrow_mut().handle_event(&input::wasm::mouse_click_to_input(&e, true));
                apply_pointer_lock(&driver, &canvas_click, &doc_click);
                if !was_locked {
                    egui_events_q.borrow_mut().push(egui_pointer_button(&e, true));
                }
                e.prevent_default();
            }) as Box<dyn FnMut(MouseEvent)>);
            canvas.add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
            mousedown.forget();
        }

        // Mouse up
        {
            let driver = driver.clone();
            let egui_events_q = egui_events.clone();
            let mouseup = Closure::wrap(Box::new(move |e: MouseEvent| {
                driver.borrow_mut().handle_event(&input::wasm::mouse_click_to_input(&e, false));
                if !driver.borrow().input.pointer_locked {
                    egui_events_q.borrow_mut().push(egui_pointer_button(&e, false));
                }
            }) as Box<dyn FnMut(MouseEvent)>);
            document.add_event_listener_with_callback("mouseup", mouseup.as_ref().unchecked_ref())?;
            mouseup.forget();
        }

        // Mouse move
        {
            let driver = driver.clone();
            let egui_events_q = egui_events.clone();
            let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
                let locked = driver.borrow().input.pointer_locked;
                if locked {
                    driver.borrow_mut().handle_event(&input::wasm::mouse_move_to_input(&e));
                } else {
                    let pos = egui::pos2(e.client_x() as f32, e.client_y() as f32);
                    egui_events_q.borrow_mut().push(egui::Event::PointerMoved(pos));
                }
            }) as Box<dyn FnMut(MouseEvent)>);
            document.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
            mm.forget();
        }

        // Context menu prevention
        {
            let contextmenu = Closure::wrap(Box::new(move |e: MouseEvent| {
                e.prevent_default();
            }) as Box<dyn FnMut(MouseEvent)>);
            canvas.add_event_listener_with_callback("contextmenu", contextmenu.as_ref().unchecked_ref())?;
            contextmenu.forget();
        }

        Ok(())
    }

    fn egui_pointer_button(e: &MouseEvent, pressed: bool) -> egui::Event {
        let button = match e.button() {
            1 => egui::PointerButton::Middle,
            2 => egui::PointerButton::Secondary,
            _ => egui::PointerButton::Primary,
        };
        egui::Event::PointerButton {
            pos: egui::pos2(e.client_x() as f32, e.client_y() as f32),
            button,
            pressed,
            modifiers: egui::Modifiers::default(),
        }
    }

    /// Create a canvas filling the page and size its backbuffer to match.
    pub fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
        let window = web_sys::window().ok_or(js_error("no global `window`"))?;
        let document = window.document().ok_or(js_error("no document on window"))?;
        let body = document.body().ok_or(js_error("no body on document"))?;
        let canvas_el = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| js_error("failed to create canvas"))?;
        canvas_el.set_attribute("style", "display:block;width:100vw;height:100vh")?;
        body.set_attribute("style", "margin:0;overflow:hidden")?;
        body.append_child(&canvas_el)?;
        canvas_el.set_width(canvas_el.client_width().max(1) as u32);
        canvas_el.set_height(canvas_el.client_height().max(1) as u32);
        Ok((window, document, canvas_el))
    }

    pub fn js_error<E: Into<String>>(msg: E) -> JsValue {
        JsValue::from_str(&msg.into())
    }

    type FrameSlot = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

    /// requestAnimationFrame loop. The callback returns false to stop.
    struct RcCellCallback {
        inner: Rc<RefCell<Box<dyn FnMut() -> bool>>>,
        window: Window,
    }

    impl RcCellCallback {
        fn new(window: Window, f: impl FnMut() -> bool + 'static) -> Self {
            Self {
                inner: Rc::new(RefCell::new(Box::new(f))),
                window,
            }
        }

        fn start(self) -> Result<(), JsValue> {
            let inner = self.inner.clone();
            let window = self.window.clone();

            let callback: FrameSlot = Rc::new(RefCell::new(None));
            let callback_clone = callback.clone();

            *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                if !inner.borrow_mut().as_mut()() {
                    tracing::info!("frame loop stopped");
                    // Dropping the closure here would free it mid-call
                    return;
                }

                // Recursively schedule next frame
                if let Err(e) = schedule(&window, &callback_clone) {
                    tracing::error!(error = ?e, "requestAnimationFrame failed");
                }
            }) as Box<dyn FnMut()>));

            schedule(&self.window, &callback)?;

            // Leak the closure to keep it alive
            std::mem::forget(callback);
            Ok(())
        }
    }

    fn schedule(window: &Window, callback: &FrameSlot) -> Result<(), JsValue> {
        let slot = callback.borrow();
        let closure = slot.as_ref().ok_or(js_error("frame callback missing"))?;
        window.request_animation_frame(closure.as_ref().unchecked_ref())?;
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn start() -> Result<(), wasm_bindgen::JsValue> {
    logging::init();
    let (window, document, canvas) = web::init_canvas()?;
    web::setup_app(&window, &document, &canvas).await
}
