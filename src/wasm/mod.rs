//! WASM bindings for the worksheet

use crate::document::{snapshot_from_json, snapshot_to_json, BlockId};
use crate::render::RenderDiff;
use crate::{BlockKind, EditOp, EditResult, LayoutConfig, Worksheet};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Milliseconds from the host clock
fn now_ms() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        crate::undo::current_timestamp() as f64
    }
}

/// Ids cross the boundary as JS numbers
fn block_id(id: f64) -> BlockId {
    BlockId(id as u64)
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(js_err)
}

fn diff_json(diff: Option<RenderDiff>) -> Result<Option<String>, JsValue> {
    diff.map(|d| to_json(&d)).transpose()
}

/// WASM-exposed worksheet wrapper
#[wasm_bindgen]
pub struct WasmWorksheet {
    sheet: Worksheet,
}

#[wasm_bindgen]
impl WasmWorksheet {
    /// Create a worksheet on A4 with half-inch margins
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmWorksheet, JsValue> {
        Ok(Self {
            sheet: Worksheet::new(LayoutConfig::default()).map_err(js_err)?,
        })
    }

    /// Create a worksheet from a JSON `LayoutConfig`
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config_json: &str) -> Result<WasmWorksheet, JsValue> {
        let config = LayoutConfig::from_json(config_json).map_err(js_err)?;
        Ok(Self {
            sheet: Worksheet::new(config).map_err(js_err)?,
        })
    }

    /// Apply an `EditOp` given as JSON, returning an edit summary as JSON
    #[wasm_bindgen(js_name = applyJson)]
    pub fn apply_json(&mut self, op_json: &str) -> Result<String, JsValue> {
        let op: EditOp = serde_json::from_str(op_json).map_err(js_err)?;
        let result = self.sheet.apply(op);
        to_json(&EditSummary::from(&result))
    }

    /// Add a block of `kind` (e.g. "GRID"), returning its id
    #[wasm_bindgen(js_name = addBlock)]
    pub fn add_block(&mut self, kind: &str, after_id: Option<f64>) -> Result<f64, JsValue> {
        let kind: BlockKind = kind.parse().map_err(js_err)?;
        let id = self.sheet.add_block(kind, after_id.map(block_id));
        Ok(id.0 as f64)
    }

    #[wasm_bindgen(js_name = deleteBlock)]
    pub fn delete_block(&mut self, id: f64) -> bool {
        self.sheet.delete_block(block_id(id)).has_changes()
    }

    #[wasm_bindgen(js_name = reorderBlocks)]
    pub fn reorder_blocks(&mut self, source_id: f64, destination_id: f64) -> bool {
        self.sheet
            .reorder_blocks(block_id(source_id), block_id(destination_id))
            .has_changes()
    }

    /// Duplicate a block, returning the copy's id
    #[wasm_bindgen(js_name = duplicateBlock)]
    pub fn duplicate_block(&mut self, id: f64) -> Option<f64> {
        self.sheet
            .duplicate_block(block_id(id))
            .map(|copy| copy.0 as f64)
    }

    /// Report a rendered height, timestamped with `Date.now()`
    #[wasm_bindgen(js_name = reportHeight)]
    pub fn report_height(&mut self, id: f64, height: f32) -> bool {
        self.sheet.report_height(block_id(id), height, now_ms())
    }

    /// Recalculate if the debounce window has passed. Returns a render diff as JSON.
    pub fn tick(&mut self) -> Result<Option<String>, JsValue> {
        let diff = self.sheet.tick(now_ms()).map_err(js_err)?;
        diff_json(diff)
    }

    /// Recalculate now if anything changed. Returns a render diff as JSON.
    #[wasm_bindgen(js_name = updateLayout)]
    pub fn update_layout(&mut self) -> Result<Option<String>, JsValue> {
        let diff = self.sheet.update_layout().map_err(js_err)?;
        diff_json(diff)
    }

    /// Current pages as JSON
    #[wasm_bindgen(js_name = getPages)]
    pub fn get_pages(&self) -> Result<String, JsValue> {
        to_json(self.sheet.pages())
    }

    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.sheet.page_count()
    }

    #[wasm_bindgen(js_name = getBlockCount)]
    pub fn get_block_count(&self) -> usize {
        self.sheet.block_count()
    }

    #[wasm_bindgen(js_name = getPageOf)]
    pub fn get_page_of(&self, id: f64) -> Option<u32> {
        self.sheet.page_of(block_id(id))
    }

    /// Section lines of a grid block as JSON
    #[wasm_bindgen(js_name = getGridLines)]
    pub fn get_grid_lines(&self, id: f64) -> Result<Option<String>, JsValue> {
        match self.sheet.grid_lines(block_id(id)).map_err(js_err)? {
            Some(lines) => to_json(&lines).map(Some),
            None => Ok(None),
        }
    }

    #[wasm_bindgen(js_name = getSelectedBlock)]
    pub fn get_selected_block(&self) -> Option<f64> {
        self.sheet.selection().block.map(|id| id.0 as f64)
    }

    /// Document snapshot as JSON
    #[wasm_bindgen(js_name = getDocument)]
    pub fn get_document(&self) -> Result<String, JsValue> {
        snapshot_to_json(&self.sheet.snapshot()).map_err(js_err)
    }

    /// Replace the document from JSON. Returns the error message on failure.
    #[wasm_bindgen(js_name = loadDocument)]
    pub fn load_document(&mut self, json: &str) -> Option<String> {
        snapshot_from_json(json)
            .and_then(|snapshot| self.sheet.load(snapshot))
            .err()
            .map(|err| err.to_string())
    }

    /// Undo last operation
    pub fn undo(&mut self) -> bool {
        self.sheet.undo()
    }

    /// Redo last undone operation
    pub fn redo(&mut self) -> bool {
        self.sheet.redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.sheet.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.sheet.can_redo()
    }
}

/// Serializable edit result for JS
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSummary {
    pub version: u64,
    pub changed: bool,
    pub created_blocks: Vec<BlockId>,
    pub deleted_blocks: Vec<BlockId>,
    pub affected_blocks: Vec<BlockId>,
    /// Blocks the host should measure before the next tick
    pub measure: Vec<BlockId>,
}

impl From<&EditResult> for EditSummary {
    fn from(result: &EditResult) -> Self {
        Self {
            version: result.version,
            changed: result.has_changes(),
            created_blocks: result.created_blocks.to_vec(),
            deleted_blocks: result.deleted_blocks.to_vec(),
            affected_blocks: result.affected_blocks.to_vec(),
            measure: result.blocks_to_measure().copied().collect(),
        }
    }
}
