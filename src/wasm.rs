use wasm_bindgen::prelude::*;

use crate::{
    config::MiaConfig,
    mia::{Mia, MiaBuilder},
    state::ReportState,
};

#[wasm_bindgen(js_name = Mia)]
pub struct JsMia(Mia);

#[wasm_bindgen(js_class = Mia)]
impl JsMia {
    /// `config` is an optional JSON `MiaConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<JsMia, JsError> {
        console_error_panic_hook::set_once();
        // a second instance keeps the subscriber of the first
        let _ = tracing_wasm::try_set_as_global_default();

        let config = match config {
            Some(json) => MiaConfig::from_json(&json)?,
            None => MiaConfig::default(),
        };
        Ok(Self(MiaBuilder::from_config(&config).build()?))
    }

    pub fn read(&mut self, address: u8) -> u8 {
        self.0.read(address)
    }

    pub fn write(&mut self, address: u8, data: u8) {
        self.0.write(address, data);
    }

    pub fn poll(&mut self) {
        self.0.poll();
    }

    #[wasm_bindgen(getter)]
    pub fn status(&self) -> u8 {
        self.0.status()
    }

    #[wasm_bindgen(getter)]
    pub fn irq(&self) -> bool {
        self.0.irq_asserted()
    }

    pub fn take_reboot_request(&mut self) -> bool {
        self.0.take_reboot_request()
    }

    pub fn load(&mut self, address: u32, data: &[u8]) -> Result<(), JsError> {
        Ok(self.0.load(address, data)?)
    }

    #[wasm_bindgen(getter)]
    pub fn memory(&self) -> Vec<u8> {
        self.0.memory().to_vec()
    }

    pub fn memory_dump(&self, start: u32, end: u32) -> Result<String, JsError> {
        Ok(self.0.memory_dump(start, end)?)
    }

    pub fn state(&mut self) -> Result<String, JsError> {
        self.0
            .report_state()
            .and_then(|state| state.to_json())
            .map_err(|err| JsError::new(&err.to_string()))
    }
}
