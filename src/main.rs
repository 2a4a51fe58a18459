//! Mini-Sheet CLI (for testing purposes only)
//! The main interface is through WASM bindings.

fn main() {
    println!("Mini-Sheet Worksheet Layout Core");
    println!("================================");
    println!();
    println!("This is a library crate. To use it:");
    println!();
    println!("  1. Build WASM: wasm-pack build --target web");
    println!("  2. Construct a WasmWorksheet, apply edits, report block heights");
    println!("     and call tick() from the render loop to receive page diffs.");
    println!();
    println!("For testing the core library:");
    println!("  cargo test");
}
