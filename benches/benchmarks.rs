//! Benchmarks for the worksheet core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mini_sheet::document::{IdAllocator, Section};
use mini_sheet::layout::paginate;
use mini_sheet::{pack_lines, BlockId, BlockKind, LayoutConfig, PageGeometry, Worksheet};

fn sheet_with_blocks(count: usize) -> (Worksheet, Vec<BlockId>) {
    let mut sheet = Worksheet::new(LayoutConfig::default()).unwrap();
    let kinds = [BlockKind::Grid, BlockKind::Vocabulary, BlockKind::Text];
    let ids = (0..count)
        .map(|i| sheet.add_block(kinds[i % kinds.len()], None))
        .collect();
    (sheet, ids)
}

fn bench_paginate_200(c: &mut Criterion) {
    let items: Vec<_> = (0..200u64)
        .map(|i| (BlockId(i + 1), Some(60.0 + (i * 37 % 400) as f32)))
        .collect();
    let usable = PageGeometry::default().content_height_px();

    c.bench_function("paginate_200_blocks", |b| {
        b.iter(|| black_box(paginate(items.iter().copied(), usable).unwrap()));
    });
}

fn bench_relayout_200(c: &mut Criterion) {
    c.bench_function("relayout_200_blocks", |b| {
        let (mut sheet, ids) = sheet_with_blocks(200);
        for (i, id) in ids.iter().enumerate() {
            sheet.report_height(*id, 80.0 + (i % 7) as f32 * 40.0, 0.0);
        }

        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            sheet.report_height(ids[0], if flip { 90.0 } else { 95.0 }, 0.0);
            black_box(sheet.update_layout().unwrap());
        });
    });
}

fn bench_pack_lines(c: &mut Criterion) {
    let mut ids = IdAllocator::new();
    let sections: Vec<Section> = (0..50).map(|i| Section::new(&mut ids, 1 + i % 12)).collect();
    let usable = PageGeometry::default().content_width_px();

    c.bench_function("pack_lines_50_sections", |b| {
        b.iter(|| black_box(pack_lines(&sections, usable).unwrap()));
    });
}

fn bench_edit_measure_cycle(c: &mut Criterion) {
    c.bench_function("add_measure_relayout", |b| {
        let (mut sheet, _) = sheet_with_blocks(50);
        b.iter(|| {
            let id = sheet.add_block(BlockKind::Grid, None);
            sheet.report_height(id, 180.0, 0.0);
            black_box(sheet.update_layout().unwrap());
            sheet.delete_block(id);
        });
    });
}

fn bench_undo_redo(c: &mut Criterion) {
    c.bench_function("undo_redo_cycle", |b| {
        // Create some history
        let (mut sheet, _) = sheet_with_blocks(30);

        b.iter(|| {
            if sheet.undo() {
                sheet.redo();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_paginate_200,
    bench_relayout_200,
    bench_pack_lines,
    bench_edit_measure_cycle,
    bench_undo_redo,
);

criterion_main!(benches);
