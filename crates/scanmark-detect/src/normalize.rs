//! Mapping raw decoder output back into original-frame coordinates.

use scanmark_core::{BBox, Detection, RawSymbol};

/// Normalize decoder output: axis-aligned bbox of each polygon, divided by
/// the cumulative preprocessing scale and rounded to the nearest pixel.
///
/// Every symbol yields exactly one detection; nothing is merged or dropped
/// here. Degenerate polygons pass through so the evaluation layer can apply
/// its own filtering policy.
pub fn normalize_symbols(symbols: Vec<RawSymbol>, scale: f32) -> Vec<Detection> {
    symbols
        .into_iter()
        .map(|symbol| normalize_symbol(symbol, scale))
        .collect()
}

fn normalize_symbol(symbol: RawSymbol, scale: f32) -> Detection {
    let bbox = match polygon_bounds(&symbol) {
        Some((x_min, y_min, x_max, y_max)) => BBox {
            x_min: (x_min / scale).round() as i32,
            y_min: (y_min / scale).round() as i32,
            x_max: (x_max / scale).round() as i32,
            y_max: (y_max / scale).round() as i32,
        },
        None => BBox::default(),
    };
    Detection {
        data: symbol.data,
        bbox,
    }
}

fn polygon_bounds(symbol: &RawSymbol) -> Option<(f32, f32, f32, f32)> {
    let first = symbol.polygon.first()?;
    let mut bounds = (first.x, first.y, first.x, first.y);
    for p in &symbol.polygon[1..] {
        bounds.0 = bounds.0.min(p.x);
        bounds.1 = bounds.1.min(p.y);
        bounds.2 = bounds.2.max(p.x);
        bounds.3 = bounds.3.max(p.y);
    }
    Some(bounds)
}
