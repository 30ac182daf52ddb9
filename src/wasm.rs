#![cfg(target_arch = "wasm32")]

use crate::engine::{model_catalog, Engine, ModelInfo};
use crate::error::SimError;
use crate::models::standing_wave::string_presets;
use crate::sim::SimConfig;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn available_models() -> js_sys::Array {
    let out = js_sys::Array::new();
    for info in model_catalog() {
        out.push(&model_info_to_js(info));
    }
    out
}

#[wasm_bindgen]
pub fn available_presets() -> js_sys::Array {
    let out = js_sys::Array::new();
    for preset in string_presets() {
        let obj = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&obj, &JsValue::from_str("id"), &JsValue::from_str(preset.id));
        let _ = js_sys::Reflect::set(&obj, &JsValue::from_str("name"), &JsValue::from_str(preset.name));
        out.push(&obj);
    }
    out
}

fn model_info_to_js(info: &ModelInfo) -> JsValue {
    let obj = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&obj, &JsValue::from_str("id"), &JsValue::from_str(info.id));
    let _ = js_sys::Reflect::set(&obj, &JsValue::from_str("name"), &JsValue::from_str(info.name));
    let _ = js_sys::Reflect::set(
        &obj,
        &JsValue::from_str("description"),
        &JsValue::from_str(info.description),
    );
    JsValue::from(obj)
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    // plain objects instead of Maps, so hosts can read fields directly
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| JsValue::from_str(&format!("serialization failed: {}", e)))
}

fn js_err(e: SimError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WasmSim {
    engine: Engine,
}

#[wasm_bindgen]
impl WasmSim {
    #[wasm_bindgen(constructor)]
    pub fn new(model_id: &str) -> Result<WasmSim, JsValue> {
        let engine = Engine::new_builtin(model_id).map_err(js_err)?;
        Ok(WasmSim { engine })
    }

    /// Build a simulation from a config object:
    /// {
    ///   seed?: number,
    ///   mode?: "euler" | "verlet",
    ///   maxDt?: number,
    ///   fixedDt?: number,
    ///   sampleInterval?: number,
    ///   maxSamples?: number,
    ///   parameters?: { [name]: number },
    ///   shape?: "sphere" | "cube",
    ///   airResistance?: bool,
    ///   preset?: string
    /// }
    #[wasm_bindgen(js_name = "newFromConfig")]
    pub fn new_from_config(model_id: &str, config: JsValue) -> Result<WasmSim, JsValue> {
        let cfg: SimConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("invalid config: {}", e)))?;
        let engine = Engine::from_config(model_id, &cfg).map_err(js_err)?;
        Ok(WasmSim { engine })
    }

    #[wasm_bindgen(getter, js_name = "modelId")]
    pub fn model_id(&self) -> String {
        self.engine.model_id().to_string()
    }

    pub fn time(&self) -> f64 {
        self.engine.time()
    }

    /// Returns the value actually stored after clamping.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<f64, JsValue> {
        self.engine.set_parameter(name, value).map_err(js_err)
    }

    pub fn parameter(&self, name: &str) -> Result<f64, JsValue> {
        self.engine.parameter(name).map_err(js_err)
    }

    pub fn parameters(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.parameters())
    }

    /// Parameter declarations (name, default, range, step) for building sliders.
    pub fn parameter_specs(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.parameter_specs())
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    pub fn restart(&mut self) -> Result<(), JsValue> {
        self.engine.restart().map_err(js_err)
    }

    pub fn mode(&self) -> String {
        self.engine.mode().to_string()
    }

    pub fn set_integration_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        self.engine.set_integration_mode_str(mode).map_err(js_err)
    }

    pub fn set_shape(&mut self, shape: &str) -> Result<(), JsValue> {
        self.engine.set_shape(shape).map_err(js_err)
    }

    pub fn set_air_resistance(&mut self, enabled: bool) -> Result<(), JsValue> {
        self.engine.set_air_resistance(enabled).map_err(js_err)
    }

    /// Call from `requestAnimationFrame` with its timestamp in milliseconds.
    ///
    /// Returns the step report, or `undefined` when no step was taken.
    pub fn frame(&mut self, now_ms: f64) -> Result<JsValue, JsValue> {
        match self.engine.frame(now_ms / 1000.0).map_err(js_err)? {
            Some(report) => to_js(&report),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Advance by `dt` seconds, bypassing the clock.
    pub fn step(&mut self, dt: f64) -> Result<JsValue, JsValue> {
        let report = self.engine.step(dt).map_err(js_err)?;
        to_js(&report)
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.current_state())
    }

    pub fn samples(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.sample_series())
    }
}
