use std::cell::Cell;
use std::rc::Rc;

use leptos::prelude::*;
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, Element, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent,
	Window,
};

use super::autoplay::Autoplay;
use super::flow::{FlowHandle, FlowState};
use super::keyboard::KeyCommand;
use super::mount::MountedDiagram;
use super::primitives::Palette;
use super::render;
use super::state::DiagramState;
use super::timeline::Scenario;
use super::types::Point;
use super::viewport::{DeviceClass, FRAME_SETTLE_MS};
use crate::clock::{BrowserClock, Clock};
use crate::config::ThemeMode;

type Mounted = MountedDiagram<BrowserClock, RwSignal<FlowState>, FrameLoop>;

/// The render loop callback and its pending frame request. Dropping it
/// cancels the request, so the callback is never invoked after it is freed.
struct FrameLoop {
	callback: Closure<dyn FnMut()>,
	request: Cell<Option<i32>>,
}

impl FrameLoop {
	fn request(&self) {
		let Some(window) = web_sys::window() else {
			return;
		};
		match window.request_animation_frame(self.callback.as_ref().unchecked_ref()) {
			Ok(id) => self.request.set(Some(id)),
			Err(err) => log::warn!("requestAnimationFrame failed: {:?}", err),
		}
	}
}

impl Drop for FrameLoop {
	fn drop(&mut self) {
		if let (Some(id), Some(window)) = (self.request.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
	}
}

fn detect_device(window: &Window) -> DeviceClass {
	let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
	let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
	let touch_points = window.navigator().max_touch_points();
	let coarse = window
		.match_media("(pointer: coarse)")
		.ok()
		.flatten()
		.is_some_and(|m| m.matches());
	DeviceClass::detect(width, height, touch_points, coarse)
}

fn parent_size(canvas: &HtmlCanvasElement, fallback_height: f64) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| {
			let h = p.client_height() as f64;
			(p.client_width() as f64, if h > 0.0 { h } else { fallback_height })
		})
		.unwrap_or((800.0, fallback_height))
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn target_tag(ev: &KeyboardEvent) -> Option<String> {
	ev.target()
		.and_then(|t| t.dyn_into::<Element>().ok())
		.map(|el| el.tag_name())
}

/// Step-driven diagram on a canvas. The page owns `flow`; this component
/// renders it, runs autoplay for it, and frames the camera on every step.
#[component]
pub fn FlowDiagram(
	scenario: Rc<Scenario>,
	flow: FlowHandle,
	#[prop(into)] theme: Signal<ThemeMode>,
	#[prop(default = 520.0)] height: f64,
) -> impl IntoView {
	let clock = BrowserClock;
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let mounted: Mounted = MountedDiagram::new(Autoplay::new(clock, flow));

	{
		let mounted = SendWrapper::new(mounted.clone());
		on_cleanup(move || mounted.take().unmount());
	}

	let mounted_init = mounted.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if mounted_init.state().borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = parent_size(&canvas, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx = match canvas.get_context("2d") {
			Ok(Some(ctx)) => ctx,
			other => {
				log::error!("2d canvas context unavailable: {:?}", other.err());
				return;
			}
		};
		let Ok(ctx) = ctx.dyn_into::<CanvasRenderingContext2d>() else {
			log::error!("2d context has an unexpected type");
			return;
		};

		let device = detect_device(&window);
		log::info!("mounting `{}` ({:?} viewport {}x{})", scenario.id, device, w, h);
		*mounted_init.state().borrow_mut() = Some(DiagramState::new(
			Rc::clone(&scenario),
			flow.state_untracked().step,
			Palette::for_theme(theme.get_untracked()),
			device.profile(),
			w,
			h,
		));

		let state = Rc::clone(mounted_init.state());
		let frame_loop = Rc::clone(mounted_init.frame_loop());
		let mut measured_revision = None;
		let callback = Closure::new(move || {
			let mut guard = state.borrow_mut();
			// Unmounted: the state is gone and no further frame is requested.
			let Some(s) = guard.as_mut() else {
				return;
			};
			let (pw, ph) = parent_size(&canvas, height);
			if pw != s.width || ph != s.height {
				canvas.set_width(pw as u32);
				canvas.set_height(ph as u32);
				s.resize(pw, ph);
			}
			if measured_revision != Some(s.reconciler.revision()) {
				for (id, size) in render::measure_nodes(s, &ctx) {
					s.record_measurement(&id, size);
				}
				measured_revision = Some(s.reconciler.revision());
			}
			s.tick(clock.now_ms());
			render::render(s, &ctx);
			if let Some(ref l) = *frame_loop.borrow() {
				l.request();
			}
		});
		*mounted_init.frame_loop().borrow_mut() = Some(FrameLoop {
			callback,
			request: Cell::new(None),
		});
		if let Some(ref l) = *mounted_init.frame_loop().borrow() {
			l.request();
		}
	});

	// Step changes: resolve now, frame once the settle delay has passed.
	let mounted_step = mounted.clone();
	Effect::new(move |_| {
		let step = flow.step();
		let generation = match mounted_step.state().borrow_mut().as_mut() {
			Some(s) => s.apply_step(step),
			None => None,
		};
		let Some(generation) = generation else {
			return;
		};
		let state = Rc::clone(mounted_step.state());
		mounted_step.replace_settle_timer(clock.timeout(FRAME_SETTLE_MS, move || {
			if let Some(s) = state.borrow_mut().as_mut() {
				s.settle(generation, clock.now_ms());
			}
		}));
	});

	let mounted_sync = mounted.clone();
	Effect::new(move |_| {
		let _ = flow.is_playing();
		mounted_sync.autoplay().sync();
	});

	let mounted_theme = mounted.clone();
	Effect::new(move |_| {
		let palette = Palette::for_theme(theme.get());
		if let Some(s) = mounted_theme.state().borrow_mut().as_mut() {
			s.palette = palette;
		}
	});

	let mounted_kb = mounted.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		let tag = target_tag(&ev);
		let Some(command) = KeyCommand::from_key_on(&ev.key(), tag.as_deref()) else {
			return;
		};
		ev.prevent_default();
		command.apply(mounted_kb.autoplay());
	};

	let state_md = Rc::clone(mounted.state());
	let on_mousedown = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(p);
		}
	};

	let state_mm = Rc::clone(mounted.state());
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(p);
		}
	};

	let state_mu = Rc::clone(mounted.state());
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.pointer_up();
		}
	};

	let state_ml = Rc::clone(mounted.state());
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = Rc::clone(mounted.state());
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(p) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(p, ev.delta_y());
		}
	};

	let state_zi = Rc::clone(mounted.state());
	let zoom_in = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_zi.borrow_mut() {
			s.zoom_in(clock.now_ms());
		}
	};
	let state_zo = Rc::clone(mounted.state());
	let zoom_out = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_zo.borrow_mut() {
			s.zoom_out(clock.now_ms());
		}
	};
	let state_rv = Rc::clone(mounted.state());
	let reset_view = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_rv.borrow_mut() {
			s.reset_view(clock.now_ms());
		}
	};

	view! {
		<div
			class="flow-diagram"
			tabindex="0"
			on:keydown=on_keydown
			style=format!("position: relative; height: {}px; outline: none;", height)
		>
			<canvas
				node_ref=canvas_ref
				class="flow-diagram-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<div class="zoom-controls">
				<button title="Zoom in" on:click=zoom_in>"+"</button>
				<button title="Zoom out" on:click=zoom_out>"\u{2212}"</button>
				<button title="Reset view" on:click=reset_view>"\u{2922}"</button>
			</div>
		</div>
	}
}
